use super::PackageVersion;
use std::cmp::Ordering;

/// Compare two version components with the dpkg `verrevcmp` algorithm.
///
/// Non-digit runs are compared character by character, where `~` sorts before
/// everything (even the end of the string) and non-letters sort after letters.
/// Digit runs are compared numerically with leading zeros ignored.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (mut ai, mut bi) = (0, 0);
    let at = |i: usize| a.get(i).copied();
    let bt = |i: usize| b.get(i).copied();

    while ai < a.len() || bi < b.len() {
        let mut first_diff = 0i64;

        while (ai < a.len() && !is_digit(at(ai))) || (bi < b.len() && !is_digit(bt(bi))) {
            let ac = order(at(ai));
            let bc = order(bt(bi));
            if ac != bc {
                return ac.cmp(&bc);
            }
            ai += 1;
            bi += 1;
        }

        while at(ai) == Some('0') {
            ai += 1;
        }
        while bt(bi) == Some('0') {
            bi += 1;
        }

        while is_digit(at(ai)) && is_digit(bt(bi)) {
            if first_diff == 0 {
                first_diff = digit_value(at(ai)) - digit_value(bt(bi));
            }
            ai += 1;
            bi += 1;
        }

        if is_digit(at(ai)) {
            return Ordering::Greater;
        }
        if is_digit(bt(bi)) {
            return Ordering::Less;
        }
        if first_diff != 0 {
            return first_diff.cmp(&0);
        }
    }

    Ordering::Equal
}

#[inline]
fn is_digit(c: Option<char>) -> bool {
    matches!(c, Some(c) if c.is_ascii_digit())
}

#[inline]
fn digit_value(c: Option<char>) -> i64 {
    c.map(|c| c as i64).unwrap_or(0)
}

/// Rank of a single character inside a non-digit run
fn order(c: Option<char>) -> i64 {
    match c {
        None => 0,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_alphabetic() => c as i64,
        Some('~') => -1,
        Some(c) => c as i64 + 256,
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => (),
            ord => return ord,
        }

        match compare_versions(&self.upstream_version, &other.upstream_version) {
            Ordering::Equal => compare_versions(&self.debian_revision, &other.debian_revision),
            ord => ord,
        }
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality follows the ordering, so "1.0" and "1.00" are the same version
impl PartialEq for PackageVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackageVersion {}
