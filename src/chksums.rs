//! Streaming checksum computation over a blocking reader.
//!
//! `repomd.xml` advertises `checksum type="sha|sha1|sha256|md5"`; a
//! [`Hasher`] runs all of those in parallel over one read pass so a
//! caller never has to read a payload twice to verify under an unknown
//! kind.
use blake2::Blake2b512;
use digest::Digest;
use md5::Md5;
use sha1::Sha1;
use sha2::Sha256;
use std::io::{self, Read};

use crate::metadata::ChecksumKind;

pub struct Hasher<R> {
    reader: R,
    sha1: Sha1,
    sha256: Sha256,
    md5: Md5,
    blake2b: Blake2b512,
    size: u64,
}

impl<R: Read> Read for Hasher<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        let new = &buf[..n];
        self.sha1.update(new);
        self.sha256.update(new);
        self.md5.update(new);
        self.blake2b.update(new);
        self.size = self.size.saturating_add(n as u64);
        Ok(n)
    }
}

impl<R> Hasher<R> {
    pub fn new(reader: R) -> Self {
        Hasher {
            reader,
            sha1: Sha1::new(),
            sha256: Sha256::new(),
            md5: Md5::new(),
            blake2b: Blake2b512::new(),
            size: 0,
        }
    }

    pub fn digests(self) -> (R, Checksums) {
        (
            self.reader,
            Checksums {
                sha1: hex::encode(self.sha1.finalize()),
                sha256: hex::encode(self.sha256.finalize()),
                md5: hex::encode(self.md5.finalize()),
                blake2b: hex::encode(self.blake2b.finalize()),
                size: self.size,
            },
        )
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Checksums {
    pub sha1: String,
    pub sha256: String,
    pub md5: String,
    pub blake2b: String,
    pub size: u64,
}

impl Checksums {
    /// `Sha` (bare "sha" in old repomd files) is an alias for `Sha1`.
    pub fn for_kind(&self, kind: ChecksumKind) -> &str {
        match kind {
            ChecksumKind::Sha | ChecksumKind::Sha1 => &self.sha1,
            ChecksumKind::Sha256 => &self.sha256,
            ChecksumKind::Md5 => &self.md5,
        }
    }
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut sha256 = Sha256::new();
    sha256.update(data);
    hex::encode(sha256.finalize())
}

/// Hashes an entire reader to completion and returns the digest matching
/// `kind`.
pub fn digest_file(reader: impl Read, kind: ChecksumKind) -> io::Result<String> {
    let mut hasher = Hasher::new(reader);
    io::copy(&mut hasher, &mut io::sink())?;
    let (_, digests) = hasher.digests();
    Ok(digests.for_kind(kind).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    #[test]
    fn hashes_known_vector() {
        let (_, digests) = {
            let mut h = Hasher::new(&b"hello world"[..]);
            let mut buf = Vec::new();
            h.read_to_end(&mut buf).unwrap();
            h.digests()
        };
        assert_eq!(
            digests.sha256,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde"
        );
        assert_eq!(digests.size, 11);
    }

    #[test]
    fn digest_file_picks_requested_kind() {
        let data = b"hello world".to_vec();
        let got = digest_file(&data[..], ChecksumKind::Sha256).unwrap();
        assert_eq!(
            got,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde"
        );
    }
}
