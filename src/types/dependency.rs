use super::{package::Package, version::parse_version, PackageVersion};

use anyhow::{format_err, Result};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::{char, space0},
    combinator::{all_consuming, map_res, opt, value},
    sequence::{delimited, pair, preceded, separated_pair},
    IResult,
};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VersionConstraint {
    None,
    Equal,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl VersionConstraint {
    fn as_str(&self) -> &'static str {
        match self {
            VersionConstraint::None => "",
            VersionConstraint::Equal => "=",
            VersionConstraint::Greater => ">>",
            VersionConstraint::GreaterOrEqual => ">=",
            VersionConstraint::Less => "<<",
            VersionConstraint::LessOrEqual => "<=",
        }
    }
}

/// A fully qualified dependency clause, checked against concrete candidates.
#[derive(Clone, Debug)]
pub struct Dependency {
    pub name: String,
    pub architecture: String,
    pub required_version: PackageVersion,
    pub constraint: VersionConstraint,
}

impl Dependency {
    pub fn is_satisfied_by(&self, candidate: &Package) -> bool {
        if self.name != candidate.name || self.architecture != candidate.architecture {
            return false;
        }

        let ord = candidate.version.cmp(&self.required_version);
        match self.constraint {
            VersionConstraint::None => true,
            VersionConstraint::Equal => ord.is_eq(),
            VersionConstraint::Greater => ord.is_gt(),
            VersionConstraint::GreaterOrEqual => ord.is_ge(),
            VersionConstraint::Less => ord.is_lt(),
            VersionConstraint::LessOrEqual => ord.is_le(),
        }
    }
}

/// A single relation as written in a control field or a package request,
/// e.g. `libc6:amd64 (>= 2.36)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    pub architecture: Option<String>,
    pub constraint: VersionConstraint,
    pub version: Option<PackageVersion>,
    /// The version as written, for messages
    pub version_text: Option<String>,
}

impl Relation {
    /// Parse a whole relation. Trailing garbage is an error.
    pub fn parse(s: &str) -> Result<Self> {
        let (_, res) = all_consuming(relation)(s.trim())
            .map_err(|e| format_err!("Malformed package relation {}: {}", s, e))?;
        Ok(res)
    }

    /// Turn this relation into a clause, filling in the architecture when
    /// the relation doesn't name one.
    pub fn to_dependency(&self, default_arch: &str) -> Dependency {
        Dependency {
            name: self.name.clone(),
            architecture: self
                .architecture
                .clone()
                .unwrap_or_else(|| default_arch.to_owned()),
            required_version: self.version.clone().unwrap_or_default(),
            constraint: self.constraint,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(arch) = &self.architecture {
            write!(f, ":{}", arch)?;
        }
        if let Some(ver) = &self.version_text {
            write!(f, " ({} {})", self.constraint.as_str(), ver)?;
        }
        Ok(())
    }
}

/// Reduce a `Depends`/`Provides` field to bare package names.
///
/// Only the first alternative of `a | b` is kept, version constraints and
/// architecture qualifiers are dropped.
pub fn parse_name_list(field: &str) -> Vec<String> {
    field
        .split(',')
        .filter_map(|clause| clause.split('|').next())
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .filter_map(|clause| package_name(clause).ok())
        .map(|(_, name)| name.to_owned())
        .collect()
}

// parser combinators
fn package_name(i: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c == ':' || c == '(' || c == '[' || c.is_whitespace())(i)
}

fn arch_qualifier(i: &str) -> IResult<&str, &str> {
    preceded(
        char(':'),
        take_till1(|c: char| c == '(' || c.is_whitespace()),
    )(i)
}

fn constraint_op(i: &str) -> IResult<&str, VersionConstraint> {
    alt((
        value(VersionConstraint::GreaterOrEqual, tag(">=")),
        value(VersionConstraint::LessOrEqual, tag("<=")),
        value(VersionConstraint::Greater, tag(">>")),
        value(VersionConstraint::Less, tag("<<")),
        value(VersionConstraint::Equal, tag("=")),
        // Obsolete forms, same meaning as dpkg gives them
        value(VersionConstraint::GreaterOrEqual, tag(">")),
        value(VersionConstraint::LessOrEqual, tag("<")),
    ))(i)
}

fn version_expr(i: &str) -> IResult<&str, (VersionConstraint, (&str, PackageVersion))> {
    delimited(
        pair(char('('), space0),
        separated_pair(
            constraint_op,
            space0,
            map_res(
                take_till1(|c: char| c == ')' || c.is_whitespace()),
                |raw: &str| parse_version(raw).map(|v| (raw, v)),
            ),
        ),
        pair(space0, char(')')),
    )(i)
}

fn relation(i: &str) -> IResult<&str, Relation> {
    let (i, name) = package_name(i)?;
    let (i, arch) = opt(arch_qualifier)(i)?;
    let (i, _) = space0(i)?;
    let (i, version) = opt(version_expr)(i)?;
    let (constraint, version, version_text) = match version {
        Some((c, (raw, v))) => (c, Some(v), Some(raw.to_owned())),
        None => (VersionConstraint::None, None, None),
    };

    Ok((
        i,
        Relation {
            name: name.to_owned(),
            architecture: arch.map(str::to_owned),
            constraint,
            version,
            version_text,
        },
    ))
}
