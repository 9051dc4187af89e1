mod cli;
mod config;
mod executor;
mod index;
mod repo;
mod report;
mod resolver;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, Opts};
use executor::{assemble, download::Downloader, install::install_packages};
use resolver::{Request, ResolveError, Resolver};
use std::path::Path;

/// Exit codes:
/// 0 => sysroot built
/// 1 => anything went wrong
#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = try_main().await {
        error!("{}", err.to_string());
        err.chain().skip(1).for_each(|cause| {
            due_to!("{}", cause);
        });
        std::process::exit(1);
    }
}

async fn try_main() -> Result<()> {
    let opts = Opts::parse();
    cli::set_verbose(opts.verbose);
    let config = Config::from_opts(&opts).context("Invalid configuration")?;

    info!("Building sysroot on: {}", config.path.display());
    if config.purge {
        purge(&config.path)?;
    }
    if config.purge_cache {
        purge(&config.cache_path)?;
    }
    std::fs::create_dir_all(&config.path)
        .context(format!("Failed to create {}", config.path.display()))?;
    std::fs::create_dir_all(&config.cache_path)
        .context(format!("Failed to create {}", config.cache_path.display()))?;

    info!("Synchronizing package databases...");
    let downloader = Downloader::new(config.http_timeout)?;
    let files = repo::fetch_indices(&config, &downloader)
        .await
        .context("Failed to fetch package databases")?;
    let reporter = cli::ConsoleReporter;
    let index = repo::load_index(&files, &config.arch, &reporter)?;
    debug!("{} packages known", index.len());

    info!("Resolving dependencies...");
    let request = Request {
        packages: config.packages.clone(),
        banned: config.banned_packages.clone(),
        arch: config.arch.clone(),
        skip_dependencies: config.no_dependencies,
    };
    let pkgs = match Resolver::new(&index, &reporter).resolve(&request) {
        Ok(pkgs) => pkgs,
        Err(e) => {
            if let ResolveError::NotFound(name) = &e {
                if let Some(suggestion) = index.closest_name(name) {
                    info!("Did you mean '{}'?", suggestion);
                }
            }
            return Err(e).context("Failed to resolve dependencies");
        }
    };

    info!("Installing {} packages...", pkgs.len());
    install_packages(&pkgs, &config.path, &config.cache_path, &downloader).await?;

    if config.no_bins {
        info!("Removing binaries...");
        assemble::delete_bins(&config.path)?;
    }
    if !config.no_usr_merge {
        info!("Merging directories into /usr...");
        assemble::merge_usr(&config.path).context("Failed to merge directories into /usr")?;
    }

    success!("Sysroot is ready at {}", config.path.display());
    Ok(())
}

fn purge(path: &Path) -> Result<()> {
    if path.exists() {
        info!("Purging {}", path.display());
        std::fs::remove_dir_all(path).context(format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}
