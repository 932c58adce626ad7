//! Content digests
//!
//! A digest is written `<algorithm>:<encoded>` in manifests (OCI grammar) and
//! `<algorithm>-<encoded>` as a blob file name on disk.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Digest algorithms the store knows how to map to blob paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DigestAlgorithm {
    Sha256,
}

impl DigestAlgorithm {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
        }
    }

    /// Number of hex characters in an encoded digest of this algorithm
    pub fn hex_len(&self) -> usize {
        match self {
            DigestAlgorithm::Sha256 => 64,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            other => Err(Error::unsupported_algorithm(other)),
        }
    }
}

/// A validated content digest
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
    algorithm: DigestAlgorithm,
    hex: String,
}

fn digest_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-z0-9]+(?:[.+_-][a-z0-9]+)*):([a-zA-Z0-9=_-]+)$")
            .expect("digest pattern is a valid regex")
    })
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

impl Digest {
    /// Build a digest from an algorithm and its hex encoding
    pub fn new<S: Into<String>>(algorithm: DigestAlgorithm, hex: S) -> Result<Self> {
        let hex = hex.into();
        if hex.len() != algorithm.hex_len() || !is_lower_hex(&hex) {
            return Err(Error::malformed(format!(
                "{} digest must be {} lowercase hex characters, got '{}'",
                algorithm,
                algorithm.hex_len(),
                hex
            )));
        }
        Ok(Self { algorithm, hex })
    }

    /// SHA-256 digest from a hex string
    pub fn sha256<S: Into<String>>(hex: S) -> Result<Self> {
        Self::new(DigestAlgorithm::Sha256, hex)
    }

    /// Parse the `<algorithm>:<hex>` form used inside manifests
    ///
    /// Shape errors are `MalformedManifest`; a well-formed but unknown algorithm
    /// is `UnsupportedAlgorithm`.
    pub fn parse(s: &str) -> Result<Self> {
        let captures = digest_pattern()
            .captures(s)
            .ok_or_else(|| Error::malformed(format!("digest '{}' is not <algorithm>:<hex>", s)))?;
        let algorithm: DigestAlgorithm = captures[1].parse()?;
        Self::new(algorithm, &captures[2])
    }

    /// Recognise a blob file name (`sha256-<hex>`); anything else yields `None`
    pub fn from_blob_name(name: &str) -> Option<Self> {
        let (algorithm, hex) = name.split_once('-')?;
        let algorithm = algorithm.parse().ok()?;
        Self::new(algorithm, hex).ok()
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// File name of this digest's blob (`sha256-<hex>`)
    pub fn blob_name(&self) -> String {
        format!("{}-{}", self.algorithm, self.hex)
    }

    /// Abbreviated form for tables (`sha256:1a2b3c4d5e6f`)
    pub fn short(&self) -> String {
        format!("{}:{}", self.algorithm, &self.hex[..12])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl FromStr for Digest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Digest::parse(s)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::parse(&s).map_err(serde::de::Error::custom)
    }
}
