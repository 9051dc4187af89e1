use super::PackageVersion;

use anyhow::{format_err, Result};
use std::convert::TryFrom;
use std::str::FromStr;

/// Split a raw version into epoch, upstream version and revision.
///
/// The revision starts after the rightmost `-` that is not directly followed by
/// another `-`. Without such a dash the revision is empty.
pub fn parse_version(i: &str) -> Result<PackageVersion> {
    let (epoch, rest) = match i.split_once(':') {
        Some((epoch, rest)) => {
            let epoch = epoch
                .parse()
                .map_err(|_| format_err!("Malformed epoch in version {}", i))?;
            (epoch, rest)
        }
        None => (0, i),
    };

    let bytes = rest.as_bytes();
    let split = (0..bytes.len())
        .rev()
        .find(|&pos| bytes[pos] == b'-' && bytes.get(pos + 1) != Some(&b'-'));

    let res = match split {
        Some(pos) => PackageVersion::new(epoch, &rest[..pos], &rest[pos + 1..]),
        None => PackageVersion::new(epoch, rest, ""),
    };

    Ok(res)
}

impl FromStr for PackageVersion {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        parse_version(s)
    }
}

impl TryFrom<&str> for PackageVersion {
    type Error = anyhow::Error;
    fn try_from(s: &str) -> Result<Self> {
        parse_version(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn version_from_str() {
        let source = vec![
            ("1.0", PackageVersion::new(0, "1.0", "")),
            ("2:1.4-3ubuntu2", PackageVersion::new(2, "1.4", "3ubuntu2")),
            ("1.2-3-4", PackageVersion::new(0, "1.2-3", "4")),
            ("0:1.0--2", PackageVersion::new(0, "1.0-", "2")),
            ("1.0-", PackageVersion::new(0, "1.0", "")),
            ("10:2.38.1", PackageVersion::new(10, "2.38.1", "")),
        ];

        for (raw, expected) in source {
            let parsed = PackageVersion::try_from(raw).unwrap();
            assert_eq!(parsed.epoch, expected.epoch, "epoch of {}", raw);
            assert_eq!(parsed.upstream_version, expected.upstream_version, "upstream of {}", raw);
            assert_eq!(parsed.debian_revision, expected.debian_revision, "revision of {}", raw);
        }
    }

    #[test]
    fn version_round_trip() {
        for raw in ["2:1.4-3ubuntu2", "0:2.36-9+deb12u4", "1:1.2.13.dfsg-1"] {
            let parsed: PackageVersion = raw.parse().unwrap();
            assert_eq!(parsed.to_string(), raw);
            let again: PackageVersion = parsed.to_string().parse().unwrap();
            assert_eq!(again.to_string(), parsed.to_string());
        }
    }

    #[test]
    fn bad_epoch() {
        assert!(PackageVersion::try_from("x:1.0").is_err());
        assert!(PackageVersion::try_from("-1:1.0").is_err());
    }
}
