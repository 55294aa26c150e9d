//! Fixed-width fingerprint types.
//!
//! All fingerprints are 32-byte SHA-256 digests. They are kept as distinct
//! types so a metadata fingerprint can never be passed where a content
//! fingerprint is expected.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Width of every fingerprint in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// Decodes a 64-character hex string, with or without a `0x` prefix.
fn decode_hex(input: &str) -> Result<[u8; FINGERPRINT_LEN]> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let mut bytes = [0u8; FINGERPRINT_LEN];
    hex::decode_to_slice(digits, &mut bytes).map_err(|e| {
        Error::InvalidInput(format!(
            "fingerprint must be {} hex characters: {e}",
            FINGERPRINT_LEN * 2
        ))
    })?;
    Ok(bytes)
}

macro_rules! fingerprint_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; FINGERPRINT_LEN]);

        impl $name {
            /// Wraps raw digest bytes.
            #[must_use]
            pub const fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
                Self(bytes)
            }

            /// Returns the raw digest bytes.
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
                &self.0
            }

            /// Returns the lowercase hex encoding (64 characters, no prefix).
            #[must_use]
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parses a hex string, accepting an optional `0x` prefix.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidInput`] if the string is not exactly
            /// 64 hex digits after the prefix is removed.
            pub fn from_hex(input: &str) -> Result<Self> {
                decode_hex(input).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

fingerprint_type!(
    /// Fingerprint over an article's title, content and summary.
    ///
    /// This is the dedup key: exactly one record owns a given value.
    ContentFingerprint
);

fingerprint_type!(
    /// Fingerprint over an article's source, link, tags and score.
    MetadataFingerprint
);

fingerprint_type!(
    /// Fingerprint over a content fingerprint followed by a metadata fingerprint.
    CombinedFingerprint
);
