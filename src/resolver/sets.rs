use crate::types::Package;

use std::collections::HashSet;

/// Packages picked so far, in insertion order
#[derive(Default)]
pub struct InstallSet<'a> {
    pkgs: Vec<&'a Package>,
    ids: HashSet<String>,
}

impl<'a> InstallSet<'a> {
    /// Returns false if a package with the same id is already in
    pub fn insert(&mut self, pkg: &'a Package) -> bool {
        if !self.ids.insert(pkg.id()) {
            return false;
        }
        self.pkgs.push(pkg);
        true
    }

    pub fn provider_of(&self, name: &str) -> Option<&'a Package> {
        self.pkgs.iter().copied().find(|pkg| pkg.provides(name))
    }

    pub fn into_packages(self) -> Vec<&'a Package> {
        self.pkgs
    }
}

/// Names of dependencies not found in the index, in the order they were met
#[derive(Default)]
pub struct MissingSet {
    names: Vec<String>,
    seen: HashSet<String>,
}

impl MissingSet {
    pub fn insert(&mut self, name: &str) {
        if self.seen.insert(name.to_owned()) {
            self.names.push(name.to_owned());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}
