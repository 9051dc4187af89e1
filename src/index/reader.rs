use crate::types::{Package, PackageVersion};

use anyhow::{Context, Result};
use std::io::{BufRead, Split};

/// Fields of the stanza currently being read
#[derive(Default)]
struct Stanza {
    name: String,
    architecture: Option<String>,
    version: Option<String>,
    filename: String,
    md5sum: String,
    depends: String,
    provides: String,
}

impl Stanza {
    fn into_package(self, base_uri: &str, default_arch: &str) -> Result<Package> {
        let version = match &self.version {
            Some(v) => PackageVersion::try_from(v.as_str())
                .context(format!("Package {} has a malformed version", self.name))?,
            None => PackageVersion::default(),
        };
        let uri = format!("{}/{}", base_uri, self.filename);
        Ok(Package::new(
            &self.name,
            self.architecture.as_deref().unwrap_or(default_arch),
            version,
            &uri,
            &self.md5sum,
            &self.depends,
            &self.provides,
        ))
    }
}

/// Streams packages out of a decompressed `Packages` document.
///
/// A package is emitted when the blank line closing its stanza is read.
/// Continuation lines are not understood, and a last stanza without a
/// trailing blank line is never emitted. Bytes that aren't valid UTF-8 are
/// replaced, so a stray byte in a description doesn't spoil the document.
pub struct IndexReader<R> {
    lines: Split<R>,
    base_uri: String,
    default_arch: String,
    pending: Stanza,
}

impl<R: BufRead> IndexReader<R> {
    pub fn new(reader: R, base_uri: &str, default_arch: &str) -> Self {
        IndexReader {
            lines: reader.split(b'\n'),
            base_uri: base_uri.trim_end_matches('/').to_owned(),
            default_arch: default_arch.to_owned(),
            pending: Stanza::default(),
        }
    }
}

impl<R: BufRead> Iterator for IndexReader<R> {
    type Item = Result<Package>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = match self.lines.next()? {
                Ok(raw) => raw,
                Err(e) => return Some(Err(e).context("Failed to read package index")),
            };
            let decoded = String::from_utf8_lossy(&raw);
            let line = decoded.trim_end_matches('\r');

            if line.is_empty() {
                if !self.pending.name.is_empty() {
                    let stanza = std::mem::take(&mut self.pending);
                    return Some(stanza.into_package(&self.base_uri, &self.default_arch));
                }
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some(f) => f,
                None => continue,
            };
            let value = value.trim().to_owned();
            match field {
                "Package" => self.pending.name = value,
                "Architecture" => self.pending.architecture = Some(value),
                "Version" => self.pending.version = Some(value),
                "Filename" => self.pending.filename = value,
                "MD5sum" => self.pending.md5sum = value,
                "Depends" => self.pending.depends = value,
                "Provides" => self.pending.provides = value,
                _ => (),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DB: &str = "Package: libc6
Architecture: amd64
Version: 2.36-9+deb12u4
Depends: libgcc-s1, libcrypt1 (>= 1:4.4.10-10ubuntu4)
Provides: libc6-2.36
Filename: pool/main/g/glibc/libc6_2.36-9+deb12u4_amd64.deb
MD5sum: 5d9a4fb6c9e6b9a5e8c3f1f0e1f6a0b2
Description: GNU C Library: Shared libraries
 Contains the standard libraries that are used by nearly all programs on
 the system.

Package: tzdata
Architecture: all
Version: 2024a-0+deb12u1
Filename: pool/main/t/tzdata/tzdata_2024a-0+deb12u1_all.deb
MD5sum: 00112233445566778899aabbccddeeff

Package: dropped
Filename: pool/main/d/dropped/dropped_1.0_amd64.deb
";

    fn read(db: &str) -> Vec<Package> {
        IndexReader::new(db.as_bytes(), "http://deb.example.org/debian/", "amd64")
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn read_stanzas() {
        let pkgs = read(DB);
        assert_eq!(pkgs.len(), 2);

        let libc = &pkgs[0];
        assert_eq!(libc.id(), "libc6:amd64");
        assert_eq!(libc.version.to_string(), "0:2.36-9+deb12u4");
        assert_eq!(
            libc.uri,
            "http://deb.example.org/debian/pool/main/g/glibc/libc6_2.36-9+deb12u4_amd64.deb"
        );
        assert_eq!(libc.md5sum, "5d9a4fb6c9e6b9a5e8c3f1f0e1f6a0b2");
        assert_eq!(libc.depends, vec!["libgcc-s1", "libcrypt1"]);
        assert_eq!(libc.provides, vec!["libc6-2.36"]);

        // Fields don't leak into the next stanza
        let tzdata = &pkgs[1];
        assert_eq!(tzdata.id(), "tzdata:all");
        assert!(tzdata.depends.is_empty());
        assert!(tzdata.provides.is_empty());
    }

    #[test]
    fn missing_fields() {
        let pkgs = read("Package: foo\nFilename: pool/foo.deb\n\n\n\nVersion: 1.0\n\n");
        assert_eq!(pkgs.len(), 1);
        assert_eq!(pkgs[0].id(), "foo:amd64");
        assert_eq!(pkgs[0].version, PackageVersion::default());
    }

    #[test]
    fn bad_version() {
        let res: Result<Vec<Package>> =
            IndexReader::new("Package: foo\nVersion: x:1\n\n".as_bytes(), "http://a", "amd64")
                .collect();
        assert!(res.is_err());
    }

    #[test]
    fn invalid_utf8() {
        let mut db = b"Package: a\nFilename: a.deb\nDescription: caf".to_vec();
        db.extend_from_slice(b"\xe9\n\nPackage: b\r\nFilename: b.deb\r\n\r\n");
        let pkgs = IndexReader::new(db.as_slice(), "http://a", "amd64")
            .collect::<Result<Vec<_>>>()
            .unwrap();
        let ids: Vec<String> = pkgs.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["a:amd64", "b:amd64"]);
        assert_eq!(pkgs[1].uri, "http://a/b.deb");
    }

    #[test]
    fn empty_document() {
        assert!(read("").is_empty());
        assert!(read("\n\n").is_empty());
    }
}
