use super::{dependency::parse_name_list, PackageVersion};

use std::hash::{Hash, Hasher};

/// A binary package as listed in a repository index.
#[derive(Clone, Debug)]
pub struct Package {
    pub name: String,
    pub architecture: String,
    pub version: PackageVersion,
    /// Absolute download URL of the .deb
    pub uri: String,
    pub md5sum: String,
    pub depends: Vec<String>,
    pub provides: Vec<String>,
}

impl Package {
    /// Build a package from raw control field values. `depends` and `provides`
    /// are reduced to bare names here.
    pub fn new(
        name: &str,
        architecture: &str,
        version: PackageVersion,
        uri: &str,
        md5sum: &str,
        depends: &str,
        provides: &str,
    ) -> Self {
        Package {
            name: name.to_owned(),
            architecture: architecture.to_owned(),
            version,
            uri: uri.to_owned(),
            md5sum: md5sum.to_owned(),
            depends: parse_name_list(depends),
            provides: parse_name_list(provides),
        }
    }

    /// Index key, `name:architecture`
    pub fn id(&self) -> String {
        format!("{}:{}", self.name, self.architecture)
    }

    pub fn provides(&self, name: &str) -> bool {
        self.provides.iter().any(|p| p == name)
    }
}

// Same name and same checksum means the same .deb, whichever index listed it
impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.md5sum == other.md5sum
    }
}

impl Eq for Package {}

impl Hash for Package {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.md5sum.hash(state);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity() {
        let a = Package::new(
            "libc6",
            "amd64",
            PackageVersion::default(),
            "http://a.example.org/pool/libc6.deb",
            "0123456789abcdef0123456789abcdef",
            "libgcc-s1, libcrypt1 (>= 1:4.4.10-10ubuntu4)",
            "libc6-2.36",
        );
        let b = Package::new(
            "libc6",
            "all",
            PackageVersion::try_from("2.36-9").unwrap(),
            "http://b.example.org/pool/libc6.deb",
            "0123456789abcdef0123456789abcdef",
            "",
            "",
        );

        assert_eq!(a.id(), "libc6:amd64");
        assert_eq!(a.depends, vec!["libgcc-s1", "libcrypt1"]);
        assert!(a.provides("libc6-2.36"));
        assert!(!b.provides("libc6-2.36"));
        assert_eq!(a, b);

        let set: HashSet<Package> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
