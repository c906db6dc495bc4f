//! `DecompressFor(path) -> path`, keyed on file extension, replacing a
//! shelled-out decompress helper with in-process decoders (spec §9).
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::io::Read;
use xz2::read::XzDecoder;

pub enum Decompressor<R> {
    Plain(R),
    Gz(GzDecoder<R>),
    Xz(XzDecoder<R>),
    Bz2(BzDecoder<R>),
}

impl<R: Read> Decompressor<R> {
    pub fn gz(reader: R) -> Self {
        Decompressor::Gz(GzDecoder::new(reader))
    }

    pub fn xz(reader: R) -> Self {
        Decompressor::Xz(XzDecoder::new(reader))
    }

    pub fn bz2(reader: R) -> Self {
        Decompressor::Bz2(BzDecoder::new(reader))
    }

    /// Picks a decompressor from a filename's extension; `None` means the
    /// file is stored uncompressed.
    pub fn for_filename(name: &str, reader: R) -> Self {
        if name.ends_with(".gz") {
            Decompressor::gz(reader)
        } else if name.ends_with(".xz") {
            Decompressor::xz(reader)
        } else if name.ends_with(".bz2") {
            Decompressor::bz2(reader)
        } else {
            Decompressor::Plain(reader)
        }
    }
}

impl<R: Read> Read for Decompressor<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Decompressor::Plain(r) => r.read(buf),
            Decompressor::Gz(r) => r.read(buf),
            Decompressor::Xz(r) => r.read(buf),
            Decompressor::Bz2(r) => r.read(buf),
        }
    }
}

/// Strips a compression suffix, the way createrepo names the uncompressed
/// sibling of e.g. `primary.xml.gz`.
pub fn uncompressed_filename(name: &str) -> &str {
    for suffix in [".gz", ".xz", ".bz2"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            return stripped;
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_suffixes() {
        assert_eq!(uncompressed_filename("primary.xml.gz"), "primary.xml");
        assert_eq!(uncompressed_filename("other.sqlite.bz2"), "other.sqlite");
        assert_eq!(uncompressed_filename("filelists.xml"), "filelists.xml");
    }
}
