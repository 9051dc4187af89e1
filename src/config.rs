use crate::{types::Relation, warn};

use anyhow::{bail, format_err, Context, Result};
use clap::Parser;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Url;
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Kernel and firmware packages are of no use in a sysroot
pub const DEFAULT_BANNED_PACKAGES: &[&str] = &[
    "linux-base",
    "linux-image-",
    "linux-headers-",
    "linux-modules-",
    "linux-firmware",
];
pub const DEFAULT_ARCH: &str = "amd64";
pub const DEFAULT_HTTP_TIMEOUT: i64 = 100;

#[derive(Parser, Debug, Default)]
#[clap(about, version)]
pub struct Opts {
    /// Path to a TOML configuration file (can't be combined with other value options)
    #[clap(long)]
    pub config_file: Option<PathBuf>,
    /// The target directory for the sysroot
    #[clap(long)]
    pub path: Option<PathBuf>,
    /// The target architecture (e.g. amd64, armhf) [default: amd64]
    #[clap(long)]
    pub arch: Option<String>,
    /// The distribution codename (e.g. bookworm, noble)
    #[clap(long)]
    pub distribution: Option<String>,
    /// Path for downloaded packages and metadata [default: <path>/tmp]
    #[clap(long)]
    pub cache_path: Option<PathBuf>,
    /// Comma-separated list of packages to install
    #[clap(long, value_delimiter = ',')]
    pub packages: Vec<String>,
    /// Space-separated list of sources, each as 'uri|component1,component2'
    #[clap(long)]
    pub sources: Option<String>,
    /// Comma-separated list of package name prefixes never pulled in as dependencies
    #[clap(long, value_delimiter = ',')]
    pub banned_packages: Vec<String>,
    /// Don't add the built-in list of banned packages
    #[clap(long)]
    pub no_default_banned_packages: bool,
    /// Timeout for HTTP requests in seconds [default: 100]
    #[clap(long, allow_hyphen_values = true)]
    pub http_timeout: Option<i64>,
    /// Delete the existing sysroot first
    #[clap(long)]
    pub purge: bool,
    /// Delete the existing cache first
    #[clap(long)]
    pub purge_cache: bool,
    /// Don't merge /bin, /sbin, /lib and /include into /usr
    #[clap(long)]
    pub no_usr_merge: bool,
    /// Remove binary directories from the sysroot
    #[clap(long)]
    pub no_bins: bool,
    /// Only install the requested packages
    #[clap(long)]
    pub no_dependencies: bool,
    /// Print additional debug information
    #[clap(short, long)]
    pub verbose: bool,
}

impl Opts {
    fn has_values(&self) -> bool {
        self.path.is_some()
            || self.arch.is_some()
            || self.distribution.is_some()
            || self.cache_path.is_some()
            || !self.packages.is_empty()
            || self.sources.is_some()
            || !self.banned_packages.is_empty()
            || self.http_timeout.is_some()
    }
}

/// Configuration as written by the user, before validation
#[derive(Deserialize, Default, Debug)]
#[serde(default)]
pub struct FileConfig {
    pub path: Option<PathBuf>,
    pub arch: Option<String>,
    pub distribution: Option<String>,
    pub cache_path: Option<PathBuf>,
    pub packages: Vec<String>,
    pub banned_packages: Vec<String>,
    pub no_default_banned_packages: bool,
    pub http_timeout: Option<i64>,
    pub purge: bool,
    pub purge_cache: bool,
    pub no_usr_merge: bool,
    pub no_bins: bool,
    pub no_dependencies: bool,
    pub sources: Vec<SourceConfig>,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SourceConfig {
    pub uri: String,
    #[serde(default)]
    pub components: Vec<String>,
}

/// A validated source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    /// Absolute, without trailing slash
    pub uri: String,
    pub components: Vec<String>,
}

/// A validated configuration
#[derive(Debug)]
pub struct Config {
    pub path: PathBuf,
    pub cache_path: PathBuf,
    pub arch: String,
    pub distribution: String,
    pub packages: Vec<Relation>,
    pub banned_packages: Vec<String>,
    pub sources: Vec<Source>,
    pub http_timeout: Duration,
    pub purge: bool,
    pub purge_cache: bool,
    pub no_usr_merge: bool,
    pub no_bins: bool,
    pub no_dependencies: bool,
}

impl Config {
    pub fn from_opts(opts: &Opts) -> Result<Self> {
        let mut draft = match &opts.config_file {
            Some(path) => {
                if opts.has_values() {
                    bail!("--config-file can't be combined with other configuration options");
                }
                FileConfig::load(path)?
            }
            None => FileConfig {
                path: opts.path.clone(),
                arch: opts.arch.clone(),
                distribution: opts.distribution.clone(),
                cache_path: opts.cache_path.clone(),
                packages: opts.packages.clone(),
                banned_packages: opts.banned_packages.clone(),
                sources: match &opts.sources {
                    Some(s) => parse_sources(s)?,
                    None => Vec::new(),
                },
                http_timeout: opts.http_timeout,
                ..Default::default()
            },
        };

        // Switches may always be given on the command line
        draft.no_default_banned_packages |= opts.no_default_banned_packages;
        draft.purge |= opts.purge;
        draft.purge_cache |= opts.purge_cache;
        draft.no_usr_merge |= opts.no_usr_merge;
        draft.no_bins |= opts.no_bins;
        draft.no_dependencies |= opts.no_dependencies;

        draft.validate()
    }
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .context(format!("Failed to read config file {}", path.display()))?;
        let config: FileConfig = toml::from_str(&data)
            .context(format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(self) -> Result<Config> {
        let path = match self.path {
            Some(p) if !p.as_os_str().is_empty() => absolute(p)?,
            _ => bail!("Path is empty."),
        };

        let cache_path = match self.cache_path {
            Some(p) if !p.as_os_str().is_empty() => absolute(p)?,
            _ => {
                let p = path.join("tmp");
                warn!("Cache path is empty. Will use '{}'", p.display());
                p
            }
        };

        let distribution = match self.distribution {
            Some(d) if !d.is_empty() => d,
            _ => bail!("Distribution is empty."),
        };

        let arch = match self.arch {
            Some(a) if !a.is_empty() => a,
            _ => {
                warn!("Arch configuration is empty. Using default arch ({})", DEFAULT_ARCH);
                DEFAULT_ARCH.to_owned()
            }
        };

        let http_timeout = self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT);
        if http_timeout <= 0 {
            bail!(
                "Http timeout is invalid: {}. Must be greater than 0.",
                http_timeout
            );
        }

        let packages = self
            .packages
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(Relation::parse)
            .collect::<Result<Vec<_>>>()?;
        if packages.is_empty() {
            bail!("Packages configuration is empty.");
        }

        if self.sources.is_empty() {
            bail!("Sources configuration is empty.");
        }
        let mut sources = Vec::with_capacity(self.sources.len());
        for (index, source) in self.sources.into_iter().enumerate() {
            let uri = source.uri.trim();
            Url::parse(uri).map_err(|e| {
                format_err!("Uri of source #{} is not a valid absolute URI: {}", index, e)
            })?;
            let components = if source.components.is_empty() {
                warn!("Components of source #{} are empty. Using default component (main)", index);
                vec!["main".to_owned()]
            } else {
                source.components
            };
            sources.push(Source {
                uri: uri.trim_end_matches('/').to_owned(),
                components,
            });
        }

        let mut banned_packages: Vec<String> = self
            .banned_packages
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();
        if !self.no_default_banned_packages {
            banned_packages.extend(DEFAULT_BANNED_PACKAGES.iter().map(|p| p.to_string()));
        }

        Ok(Config {
            path,
            cache_path,
            arch,
            distribution,
            packages,
            banned_packages,
            sources,
            http_timeout: Duration::from_secs(http_timeout as u64),
            purge: self.purge,
            purge_cache: self.purge_cache,
            no_usr_merge: self.no_usr_merge,
            no_bins: self.no_bins,
            no_dependencies: self.no_dependencies,
        })
    }
}

fn absolute(p: PathBuf) -> Result<PathBuf> {
    if p.is_absolute() {
        Ok(p)
    } else {
        Ok(std::env::current_dir()?.join(p))
    }
}

/// Parse `uri|comp1,comp2 uri2|comp3` into sources
pub fn parse_sources(s: &str) -> Result<Vec<SourceConfig>> {
    lazy_static! {
        static ref SOURCE: Regex =
            Regex::new(r"^(?P<uri>[^|]+)(\|(?P<components>[^|]*))?$").unwrap();
    }

    let mut res = Vec::new();
    for clause in s.split_whitespace() {
        let captures = SOURCE.captures(clause).ok_or_else(|| {
            format_err!(
                "Invalid source argument: '{}'. It needs to be in format 'uri|component1,component2'.",
                clause
            )
        })?;
        // The regex ensures uri always exists
        let uri = captures.name("uri").unwrap().as_str().to_owned();
        let components = match captures.name("components") {
            Some(c) => {
                let components: Vec<String> = c
                    .as_str()
                    .split(',')
                    .map(|c| c.trim().to_owned())
                    .filter(|c| !c.is_empty())
                    .collect();
                if components.is_empty() {
                    bail!("Source '{}' has an empty component list", clause);
                }
                components
            }
            None => Vec::new(),
        };
        res.push(SourceConfig { uri, components });
    }

    if res.is_empty() {
        bail!("Sources configuration is empty.");
    }
    Ok(res)
}
