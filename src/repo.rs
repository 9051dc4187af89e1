use crate::{
    config::Config,
    executor::download::{Downloader, Fetched},
    index::{IndexReader, PackageIndex},
    report::Reporter,
    types::Package,
    warn,
};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use futures_util::future::join_all;
use rayon::prelude::*;
use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

/// A downloaded `Packages.gz` and the repository it came from
#[derive(Debug)]
pub struct IndexFile {
    pub base_uri: String,
    pub path: PathBuf,
}

pub fn index_url(base_uri: &str, distribution: &str, component: &str, arch: &str) -> String {
    format!(
        "{}/dists/{}/{}/binary-{}/Packages.gz",
        base_uri, distribution, component, arch
    )
}

/// Fetch the index of every (source, component) pair.
///
/// Downloads run concurrently, but the result keeps configuration order.
/// Components the source doesn't carry are skipped with a warning.
pub async fn fetch_indices(config: &Config, downloader: &Downloader) -> Result<Vec<IndexFile>> {
    let db_dir = config.cache_path.join("databases");
    tokio::fs::create_dir_all(&db_dir)
        .await
        .context(format!("Failed to create {}", db_dir.display()))?;

    let mut jobs = Vec::new();
    for (n, source) in config.sources.iter().enumerate() {
        for component in &source.components {
            let url = index_url(&source.uri, &config.distribution, component, &config.arch);
            let filename = format!(
                "Packages_{}_{}_{}_{}.gz",
                n, config.distribution, component, config.arch
            );
            jobs.push((source, component, url, db_dir.join(filename)));
        }
    }

    let results = join_all(
        jobs.iter()
            .map(|(_, _, url, path)| downloader.fetch_if_missing(url, path)),
    )
    .await;

    let mut res = Vec::new();
    for ((source, component, _, path), fetched) in jobs.into_iter().zip(results) {
        match fetched? {
            Fetched::Ready => res.push(IndexFile {
                base_uri: source.uri.clone(),
                path,
            }),
            Fetched::NotFound => {
                warn!(
                    "Source '{}' does not contain component '{}' for '{}'. Skipping.",
                    source.uri, component, config.arch
                );
            }
        }
    }
    Ok(res)
}

/// Read one gzip compressed index
pub fn read_index(path: &Path, base_uri: &str, arch: &str) -> Result<Vec<Package>> {
    let f = File::open(path).context(format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(GzDecoder::new(f));
    IndexReader::new(reader, base_uri, arch)
        .collect::<Result<Vec<_>>>()
        .context(format!("Failed to parse package database {}", path.display()))
}

/// Parse all indices in parallel and merge them in the order given
pub fn load_index(files: &[IndexFile], arch: &str, reporter: &dyn Reporter) -> Result<PackageIndex> {
    let lists = files
        .par_iter()
        .map(|f| read_index(&f.path, &f.base_uri, arch))
        .collect::<Result<Vec<_>>>()?;
    Ok(PackageIndex::from_lists(lists, reporter))
}
