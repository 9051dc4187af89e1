use super::download::{Downloader, Fetched};
use crate::{info, types::Package};

use anyhow::{bail, format_err, Context, Result};
use md5::{Digest, Md5};
use reqwest::Url;
use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

/// Download, verify and unpack every package into `root`, in order
pub async fn install_packages(
    pkgs: &[&Package],
    root: &Path,
    cache: &Path,
    downloader: &Downloader,
) -> Result<()> {
    let pkg_dir = cache.join("packages");
    tokio::fs::create_dir_all(&pkg_dir)
        .await
        .context(format!("Failed to create {}", pkg_dir.display()))?;

    let total = pkgs.len();
    for (i, pkg) in pkgs.iter().enumerate() {
        info!("Installing package: {} ({}/{})", pkg.name, i + 1, total);
        let deb = pkg_dir.join(deb_filename(&pkg.uri)?);
        if downloader.fetch_if_missing(&pkg.uri, &deb).await? == Fetched::NotFound {
            bail!("Package '{}' not found at {}", pkg.name, pkg.uri);
        }

        let hash = md5_file(&deb)?;
        if !hash.eq_ignore_ascii_case(&pkg.md5sum) {
            bail!(
                "Package '{}' checksum mismatch: {}, expected: {}",
                pkg.name,
                hash,
                pkg.md5sum
            );
        }

        unpack_deb(&deb, root).context(format!("Failed to unpack package '{}'", pkg.name))?;
    }

    Ok(())
}

/// Cache file name of a package: the last segment of its URL
fn deb_filename(uri: &str) -> Result<String> {
    let url = Url::parse(uri).context(format!("Bad package URL {}", uri))?;
    url.path_segments()
        .and_then(|s| s.last())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| format_err!("Package URL {} has no file name", uri))
}

pub fn md5_file(path: &Path) -> Result<String> {
    let mut f = File::open(path).context(format!(
        "Failed to open {} for checking checksum",
        path.display()
    ))?;
    let mut hasher = Md5::new();
    io::copy(&mut f, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Extract the `data.tar*` member of a .deb into `root`
pub fn unpack_deb(deb: &Path, root: &Path) -> Result<()> {
    let mut archive = ar::Archive::new(
        File::open(deb).context(format!("Failed to open deb file at {}", deb.display()))?,
    );
    while let Some(entry) = archive.next_entry() {
        let entry = entry?;
        let name = std::str::from_utf8(entry.header().identifier())?
            .trim_end_matches('/')
            .to_owned();
        if name.starts_with("data.tar") {
            let mut tar = tar::Archive::new(decompress(&name, entry)?);
            tar.set_preserve_permissions(true);
            tar.unpack(root)
                .context(format!("Failed to extract {} to {}", name, root.display()))?;
            return Ok(());
        }
    }

    bail!("{} has no data.tar member", deb.display())
}

fn decompress<'a, R: Read + 'a>(name: &str, r: R) -> Result<Box<dyn Read + 'a>> {
    let res: Box<dyn Read + 'a> = if name.ends_with(".zst") {
        Box::new(zstd::stream::read::Decoder::new(r)?)
    } else if name.ends_with(".xz") {
        Box::new(xz2::read::XzDecoder::new(r))
    } else if name.ends_with(".gz") {
        Box::new(flate2::read::GzDecoder::new(r))
    } else {
        Box::new(r)
    };
    Ok(res)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "sysroot-gen-install-{}-{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn data_tar() -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        let content = b"int main(void);\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "./usr/include/hello.h", &content[..])
            .unwrap();
        builder.into_inner().unwrap()
    }

    fn write_deb(path: &Path, members: Vec<(&str, Vec<u8>)>) {
        let mut builder = ar::Builder::new(File::create(path).unwrap());
        for (name, data) in members {
            let header = ar::Header::new(name.as_bytes().to_vec(), data.len() as u64);
            builder.append(&header, &data[..]).unwrap();
        }
    }

    #[test]
    fn filenames() {
        assert_eq!(
            deb_filename("http://deb.debian.org/debian/pool/main/z/zlib/zlib1g_1.2.13_amd64.deb")
                .unwrap(),
            "zlib1g_1.2.13_amd64.deb"
        );
        assert!(deb_filename("http://deb.debian.org/").is_err());
        assert!(deb_filename("pool/main/z.deb").is_err());
    }

    #[test]
    fn unpack() {
        let dir = scratch("unpack");
        let root = dir.join("root");
        let gz = {
            let mut e = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            e.write_all(&data_tar()).unwrap();
            e.finish().unwrap()
        };
        let tests = vec![
            ("data.tar", data_tar()),
            ("data.tar.gz", gz),
            ("data.tar.zst", zstd::encode_all(&data_tar()[..], 0).unwrap()),
        ];

        for (name, data) in tests {
            let deb = dir.join("hello.deb");
            write_deb(
                &deb,
                vec![
                    ("debian-binary", b"2.0\n".to_vec()),
                    ("control.tar", Vec::new()),
                    (name, data),
                ],
            );
            unpack_deb(&deb, &root).unwrap();
            let header = std::fs::read_to_string(root.join("usr/include/hello.h")).unwrap();
            assert_eq!(header, "int main(void);\n", "{}", name);
            std::fs::remove_dir_all(&root).unwrap();
        }

        let deb = dir.join("empty.deb");
        write_deb(&deb, vec![("debian-binary", b"2.0\n".to_vec())]);
        assert!(unpack_deb(&deb, &root).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn checksum() {
        let dir = scratch("md5");
        let file = dir.join("empty");
        File::create(&file).unwrap();
        assert_eq!(md5_file(&file).unwrap(), "d41d8cd98f00b204e9800998ecf8427e");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
