mod sets;

use crate::{
    index::PackageIndex,
    report::Reporter,
    types::{Package, Relation},
};
use sets::{InstallSet, MissingSet};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Dependency '{0}' not found")]
    NotFound(String),
    #[error("Could not find: {0}")]
    Unresolvable(String),
    #[error("Requested {request}, but only version {version} is available")]
    Unsatisfied { request: String, version: String },
}

/// What the user asked for
pub struct Request {
    pub packages: Vec<Relation>,
    /// Dependencies starting with any of these are never followed
    pub banned: Vec<String>,
    pub arch: String,
    pub skip_dependencies: bool,
}

/// Computes the closure of a request over an index.
///
/// The index is only read. All state lives in the sets of a single
/// `resolve` call, so resolving the same request twice gives the same list.
pub struct Resolver<'a> {
    index: &'a PackageIndex,
    reporter: &'a dyn Reporter,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a PackageIndex, reporter: &'a dyn Reporter) -> Self {
        Resolver { index, reporter }
    }

    /// Packages to install, in the order they were first reached
    pub fn resolve(&self, req: &Request) -> Result<Vec<&'a Package>, ResolveError> {
        let mut install = InstallSet::default();
        let mut missing = MissingSet::default();

        for relation in &req.packages {
            let pkg = self
                .index
                .lookup(&relation.name, &req.arch)
                .ok_or_else(|| ResolveError::NotFound(relation.name.clone()))?;
            if !relation
                .to_dependency(&pkg.architecture)
                .is_satisfied_by(pkg)
            {
                return Err(ResolveError::Unsatisfied {
                    request: relation.to_string(),
                    version: pkg.version.to_string(),
                });
            }

            if req.skip_dependencies {
                install.insert(pkg);
                continue;
            }

            self.walk(pkg, req, &mut install, &mut missing);
        }

        // Whatever is still missing may be a virtual package
        while !missing.is_empty() {
            let mut next_round = MissingSet::default();
            for name in missing.into_names() {
                if let Some(provider) = install.provider_of(&name) {
                    self.reporter.info(&format!(
                        "Package '{}' is provided by '{}'. Skipping.",
                        name, provider.name
                    ));
                    continue;
                }

                match self.index.find_provider(&name) {
                    Some(extra) => {
                        self.reporter.info(&format!(
                            "Additional package '{}' needs to be installed because it provides dependency for '{}'",
                            extra.id(),
                            name
                        ));
                        self.walk(extra, req, &mut install, &mut next_round);
                        // The provider couldn't make progress on this name
                        if next_round.contains(&name) {
                            return Err(ResolveError::Unresolvable(name));
                        }
                    }
                    None => {
                        self.reporter
                            .info(&format!("No package provides '{}'. Ignoring.", name));
                    }
                }
            }
            missing = next_round;
        }

        Ok(install.into_packages())
    }

    /// Depth-first walk over dependencies of `root`.
    ///
    /// The install set doubles as the visited set, so cycles end the walk.
    /// Dependencies that aren't in the index go to `missing`.
    fn walk(
        &self,
        root: &'a Package,
        req: &Request,
        install: &mut InstallSet<'a>,
        missing: &mut MissingSet,
    ) {
        if !install.insert(root) {
            return;
        }

        let mut stack: Vec<(&'a Package, usize)> = vec![(root, 0)];
        while let Some(frame) = stack.last_mut() {
            let pkg = frame.0;
            let dep = match pkg.depends.get(frame.1) {
                Some(dep) => dep,
                None => {
                    stack.pop();
                    continue;
                }
            };
            frame.1 += 1;

            if req.banned.iter().any(|b| dep.starts_with(b.as_str())) {
                self.reporter
                    .verbose(&format!("Package dependency '{}' is banned.", dep));
                continue;
            }

            match self.index.lookup(dep, &req.arch) {
                Some(found) => {
                    if install.insert(found) {
                        stack.push((found, 0));
                    }
                }
                None => missing.insert(dep),
            }
        }
    }
}
