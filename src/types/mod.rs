mod dependency;
mod package;
mod version;

pub use dependency::Relation;
pub use package::Package;
pub use version::PackageVersion;
