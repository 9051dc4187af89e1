mod reader;
pub use reader::IndexReader;

use crate::{report::Reporter, types::Package};

use std::collections::HashMap;

const SUGGESTION_THRESHOLD: f64 = 0.8;

/// All known packages, keyed by `name:architecture`.
///
/// Iteration follows insertion order. When two packages share a key, the one
/// added first is kept.
#[derive(Default)]
pub struct PackageIndex {
    pkgs: Vec<Package>,
    id_to_pos: HashMap<String, usize>,
}

impl PackageIndex {
    pub fn new() -> Self {
        PackageIndex::default()
    }

    /// Build an index out of per-document package lists, in the given order
    pub fn from_lists(lists: Vec<Vec<Package>>, reporter: &dyn Reporter) -> Self {
        let mut index = PackageIndex::new();
        for list in lists {
            index.merge(list, reporter);
        }
        index
    }

    /// Add a package. Returns false (and drops the package) if its key is taken.
    pub fn add(&mut self, pkg: Package) -> bool {
        let id = pkg.id();
        if self.id_to_pos.contains_key(&id) {
            return false;
        }
        self.id_to_pos.insert(id, self.pkgs.len());
        self.pkgs.push(pkg);
        true
    }

    pub fn merge(&mut self, pkgs: impl IntoIterator<Item = Package>, reporter: &dyn Reporter) {
        for pkg in pkgs {
            let id = pkg.id();
            if !self.add(pkg) {
                reporter.warn(&format!(
                    "Package '{}' already exists in database. Skipping.",
                    id
                ));
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&Package> {
        self.id_to_pos.get(id).map(|pos| &self.pkgs[*pos])
    }

    /// Look up `name:arch`, falling back to `name:all`
    pub fn lookup(&self, name: &str, arch: &str) -> Option<&Package> {
        self.get(&format!("{}:{}", name, arch))
            .or_else(|| self.get(&format!("{}:all", name)))
    }

    /// First package in index order that provides `name`
    pub fn find_provider(&self, name: &str) -> Option<&Package> {
        self.iter().find(|pkg| pkg.provides(name))
    }

    /// Name of the known package that looks most like `name`, if any is close enough
    pub fn closest_name(&self, name: &str) -> Option<&str> {
        self.iter()
            .map(|pkg| (strsim::jaro_winkler(name, &pkg.name), pkg.name.as_str()))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .fold(None, |best: Option<(f64, &str)>, cur| match best {
                Some(b) if b.0 >= cur.0 => Some(b),
                _ => Some(cur),
            })
            .map(|(_, name)| name)
    }

    /// Packages in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.pkgs.iter()
    }

    pub fn len(&self) -> usize {
        self.pkgs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pkgs.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{report::test::RecordingReporter, types::PackageVersion};

    fn pkg(name: &str, arch: &str, md5sum: &str, provides: &str) -> Package {
        Package::new(
            name,
            arch,
            PackageVersion::default(),
            &format!("http://deb.example.org/{}.deb", name),
            md5sum,
            "",
            provides,
        )
    }

    #[test]
    fn first_wins() {
        let reporter = RecordingReporter::default();
        let index = PackageIndex::from_lists(
            vec![
                vec![pkg("a", "amd64", "main", ""), pkg("b", "all", "main", "")],
                vec![pkg("a", "amd64", "universe", ""), pkg("c", "amd64", "universe", "")],
            ],
            &reporter,
        );

        assert_eq!(index.len(), 3);
        assert_eq!(index.get("a:amd64").unwrap().md5sum, "main");
        assert!(reporter.contains("Package 'a:amd64' already exists in database"));
        let order: Vec<String> = index.iter().map(|p| p.id()).collect();
        assert_eq!(order, vec!["a:amd64", "b:all", "c:amd64"]);
    }

    #[test]
    fn lookup_fallback() {
        let mut index = PackageIndex::new();
        assert!(index.is_empty());
        index.add(pkg("a", "amd64", "1", ""));
        index.add(pkg("a", "all", "2", ""));
        index.add(pkg("b", "all", "3", ""));

        assert_eq!(index.lookup("a", "amd64").unwrap().md5sum, "1");
        assert_eq!(index.lookup("a", "arm64").unwrap().md5sum, "2");
        assert_eq!(index.lookup("b", "amd64").unwrap().id(), "b:all");
        assert!(index.lookup("c", "amd64").is_none());
    }

    #[test]
    fn providers() {
        let mut index = PackageIndex::new();
        index.add(pkg("mawk", "amd64", "", "awk"));
        index.add(pkg("gawk", "amd64", "", "awk, gawk-5"));

        assert_eq!(index.find_provider("awk").unwrap().name, "mawk");
        assert_eq!(index.find_provider("gawk-5").unwrap().name, "gawk");
        assert!(index.find_provider("nawk").is_none());
    }

    #[test]
    fn suggestions() {
        let mut index = PackageIndex::new();
        index.add(pkg("libc6-dev", "amd64", "", ""));
        index.add(pkg("libstdc++-12-dev", "amd64", "", ""));
        index.add(pkg("zlib1g-dev", "amd64", "", ""));

        assert_eq!(index.closest_name("libc-dev"), Some("libc6-dev"));
        assert_eq!(index.closest_name("zlib1g-dv"), Some("zlib1g-dev"));
        assert_eq!(index.closest_name("qwerty"), None);
    }
}
