mod ord;
mod parse;

pub use ord::compare_versions;
pub use parse::parse_version;

use std::fmt;

/// A dpkg style version: `[epoch:]upstream_version[-debian_revision]`.
#[derive(Clone, Debug, Default)]
pub struct PackageVersion {
    pub epoch: u64,
    pub upstream_version: String,
    pub debian_revision: String,
}

impl PackageVersion {
    pub fn new(epoch: u64, upstream_version: &str, debian_revision: &str) -> Self {
        PackageVersion {
            epoch,
            upstream_version: upstream_version.to_owned(),
            debian_revision: debian_revision.to_owned(),
        }
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}",
            self.epoch, self.upstream_version, self.debian_revision
        )
    }
}
