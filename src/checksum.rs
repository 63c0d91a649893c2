//! File checksums
//!
//! Supported algorithms are MD5, SHA-256 and SHA-512. Digests can be
//! rendered as lowercase hex (the default) or standard base64.

use crate::error::FileError;
use base64::Engine;
use sha2::{Digest, Sha256, Sha512};
use std::fmt::Write as _;
use std::str::FromStr;

/// Hash algorithm for [`AbstractFile::checksum`](crate::AbstractFile::checksum)
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ChecksumAlgorithm {
    /// MD5
    Md5,
    /// SHA-256
    Sha256,
    /// SHA-512
    Sha512,
}

impl ChecksumAlgorithm {
    /// Canonical lowercase name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    pub(crate) fn hasher(self) -> Hasher {
        match self {
            Self::Md5 => Hasher::Md5(md5::Context::new()),
            Self::Sha256 => Hasher::Sha256(Sha256::new()),
            Self::Sha512 => Hasher::Sha512(Sha512::new()),
        }
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(FileError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Text encoding of a digest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DigestEncoding {
    /// Lowercase hexadecimal
    #[default]
    Hex,
    /// Standard base64 with padding
    Base64,
}

impl DigestEncoding {
    /// Render `digest` in this encoding
    #[must_use]
    pub fn encode(self, digest: &[u8]) -> String {
        match self {
            Self::Hex => digest.iter().fold(
                String::with_capacity(digest.len() * 2),
                |mut out, byte| {
                    let _ = write!(out, "{byte:02x}");
                    out
                },
            ),
            Self::Base64 => base64::engine::general_purpose::STANDARD.encode(digest),
        }
    }
}

/// Incremental hasher for one of the supported algorithms
pub(crate) enum Hasher {
    Md5(md5::Context),
    Sha256(Sha256),
    Sha512(Sha512),
}

impl Hasher {
    pub(crate) fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Md5(context) => context.consume(chunk),
            Self::Sha256(hasher) => hasher.update(chunk),
            Self::Sha512(hasher) => hasher.update(chunk),
        }
    }

    #[allow(deprecated)]
    pub(crate) fn finish(self) -> Vec<u8> {
        match self {
            Self::Md5(context) => context.compute().0.to_vec(),
            Self::Sha256(hasher) => hasher.finalize().to_vec(),
            Self::Sha512(hasher) => hasher.finalize().to_vec(),
        }
    }
}
