//! Record types and identifiers.

use super::{CombinedFingerprint, ContentFingerprint, MetadataFingerprint};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an admitted record.
///
/// Identifiers are assigned densely starting at 1. The value 0 is reserved
/// as the "no record" sentinel and is never assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    /// The "no record" sentinel.
    pub const NONE: Self = Self(0);

    /// Creates an identifier from its numeric value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns true for the sentinel value 0.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Returns the zero-based position of this identifier in the ledger.
    ///
    /// Returns `None` for the sentinel.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        self.0
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Opaque identity of a submitter (address-equivalent).
///
/// The identity is compared byte-for-byte; no case folding is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Publisher(String);

impl Publisher {
    /// Creates a publisher identity.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identity is empty or whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Publisher {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Publisher {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Authenticity score in integer hundredths (`0.75` is stored as `75`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthenticityScore(u64);

impl AuthenticityScore {
    /// Creates a score from integer hundredths.
    #[must_use]
    pub const fn from_hundredths(value: u64) -> Self {
        Self(value)
    }

    /// Converts a fractional score to hundredths, truncating toward zero.
    ///
    /// Negative and non-finite inputs map to 0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_fraction(score: f64) -> Self {
        if !score.is_finite() || score <= 0.0 {
            return Self(0);
        }
        // Float-to-int `as` saturates at u64::MAX.
        Self((score * 100.0) as u64)
    }

    /// Returns the score in hundredths.
    #[must_use]
    pub const fn hundredths(self) -> u64 {
        self.0
    }

    /// Returns the fixed-width big-endian encoding used in fingerprints.
    #[must_use]
    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

/// An article submitted for admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSubmission {
    /// Headline.
    pub title: String,
    /// Article body.
    pub content: String,
    /// Short summary.
    #[serde(default)]
    pub summary: String,
    /// Free-text label of the originating outlet.
    #[serde(default)]
    pub source: String,
    /// Link to the original article.
    #[serde(default)]
    pub link: String,
    /// Tags, as a single free-text field.
    #[serde(default)]
    pub tags: String,
    /// Authenticity score.
    #[serde(default)]
    pub score: AuthenticityScore,
}

impl ArticleSubmission {
    /// Creates a submission with the content fields set and empty metadata.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// Sets the source label.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Sets the original link.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    /// Sets the tags field.
    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Sets the authenticity score.
    #[must_use]
    pub const fn with_score(mut self, score: AuthenticityScore) -> Self {
        self.score = score;
        self
    }
}

/// An admitted record. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Assigned identifier.
    pub id: RecordId,
    /// Fingerprint of title, content and summary.
    pub content_fingerprint: ContentFingerprint,
    /// Fingerprint of source, link, tags and score.
    pub metadata_fingerprint: MetadataFingerprint,
    /// Submitter identity.
    pub publisher: Publisher,
    /// Admission time (Unix epoch seconds).
    pub timestamp: u64,
    /// Originating outlet.
    pub source: String,
}

/// Outcome of an admission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Admission {
    /// The submission was new and has been stored.
    Admitted {
        /// Newly assigned identifier.
        id: RecordId,
        /// Content fingerprint of the submission.
        content_fingerprint: ContentFingerprint,
        /// Metadata fingerprint of the submission.
        metadata_fingerprint: MetadataFingerprint,
        /// Admission timestamp.
        timestamp: u64,
    },
    /// The content was already admitted; nothing was written.
    Duplicate {
        /// Identifier of the record that owns the content fingerprint.
        existing_id: RecordId,
        /// Content fingerprint of the submission.
        content_fingerprint: ContentFingerprint,
    },
}

impl Admission {
    /// Returns the new identifier, or the existing one for a duplicate.
    #[must_use]
    pub const fn id(&self) -> RecordId {
        match self {
            Self::Admitted { id, .. } => *id,
            Self::Duplicate { existing_id, .. } => *existing_id,
        }
    }

    /// Returns true if the submission was rejected as a duplicate.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Returns the submission's content fingerprint.
    #[must_use]
    pub const fn content_fingerprint(&self) -> &ContentFingerprint {
        match self {
            Self::Admitted {
                content_fingerprint,
                ..
            }
            | Self::Duplicate {
                content_fingerprint,
                ..
            } => content_fingerprint,
        }
    }
}

/// Full set of hashes derived from one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleHashes {
    /// Content fingerprint (dedup key).
    pub content: ContentFingerprint,
    /// Metadata fingerprint.
    pub metadata: MetadataFingerprint,
    /// Combined fingerprint.
    pub combined: CombinedFingerprint,
    /// Plain SHA-256 of the title, hex-encoded.
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_sentinel() {
        assert!(RecordId::NONE.is_none());
        assert!(!RecordId::new(1).is_none());
        assert_eq!(RecordId::NONE.index(), None);
        assert_eq!(RecordId::new(1).index(), Some(0));
        assert_eq!(RecordId::new(42).index(), Some(41));
    }

    #[test]
    fn test_publisher_blank() {
        assert!(Publisher::new("").is_blank());
        assert!(Publisher::new("   ").is_blank());
        assert!(!Publisher::new("0xabc").is_blank());
    }

    #[test]
    fn test_publisher_is_case_sensitive() {
        assert_ne!(Publisher::new("0xABC"), Publisher::new("0xabc"));
    }

    #[test]
    fn test_score_from_fraction() {
        assert_eq!(AuthenticityScore::from_fraction(0.75).hundredths(), 75);
        assert_eq!(AuthenticityScore::from_fraction(1.0).hundredths(), 100);
        assert_eq!(AuthenticityScore::from_fraction(0.0).hundredths(), 0);
        assert_eq!(AuthenticityScore::from_fraction(-3.0).hundredths(), 0);
        assert_eq!(AuthenticityScore::from_fraction(f64::NAN).hundredths(), 0);
    }

    #[test]
    fn test_score_encoding_is_fixed_width() {
        assert_eq!(AuthenticityScore::from_hundredths(1).to_be_bytes().len(), 8);
        assert_eq!(
            AuthenticityScore::from_hundredths(258).to_be_bytes(),
            [0, 0, 0, 0, 0, 0, 1, 2]
        );
    }

    #[test]
    fn test_submission_builder() {
        let sub = ArticleSubmission::new("T", "C", "S")
            .with_source("Reuters")
            .with_link("https://example.com/a")
            .with_tags("politics,eu")
            .with_score(AuthenticityScore::from_hundredths(80));

        assert_eq!(sub.title, "T");
        assert_eq!(sub.source, "Reuters");
        assert_eq!(sub.link, "https://example.com/a");
        assert_eq!(sub.tags, "politics,eu");
        assert_eq!(sub.score.hundredths(), 80);
    }

    #[test]
    fn test_submission_deserialize_defaults() {
        let sub: ArticleSubmission =
            serde_json::from_str(r#"{"title":"T","content":"C"}"#).unwrap();
        assert_eq!(sub.summary, "");
        assert_eq!(sub.score, AuthenticityScore::default());
    }

    #[test]
    fn test_admission_accessors() {
        let fp = ContentFingerprint::from_bytes([1u8; 32]);
        let dup = Admission::Duplicate {
            existing_id: RecordId::new(3),
            content_fingerprint: fp,
        };
        assert!(dup.is_duplicate());
        assert_eq!(dup.id(), RecordId::new(3));
        assert_eq!(dup.content_fingerprint(), &fp);
    }
}
