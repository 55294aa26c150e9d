//! Fingerprint derivation for article submissions.
//!
//! Fingerprints are SHA-256 digests over the submission fields in a fixed
//! order. Every variable-length field is written as an 8-byte big-endian
//! length followed by its UTF-8 bytes, so moving characters across a field
//! boundary always changes the digest (`"ab" + "c"` and `"a" + "bc"` differ).
//!
//! | Fingerprint | Field order |
//! |-------------|-------------|
//! | content | title, content, summary |
//! | metadata | source, link, tags, score (u64 big-endian hundredths) |
//! | combined | content digest (32 bytes), metadata digest (32 bytes) |
//!
//! No normalization is applied: fields are hashed exactly as submitted.

use crate::models::{
    ArticleHashes, ArticleSubmission, AuthenticityScore, CombinedFingerprint, ContentFingerprint,
    MetadataFingerprint,
};
use sha2::{Digest, Sha256};

/// Derives content, metadata and combined fingerprints.
///
/// # Example
///
/// ```rust
/// use newsledger::FingerprintEngine;
///
/// let a = FingerprintEngine::content("ab", "c", "");
/// let b = FingerprintEngine::content("a", "bc", "");
/// assert_ne!(a, b);
///
/// let again = FingerprintEngine::content("ab", "c", "");
/// assert_eq!(a, again);
/// ```
pub struct FingerprintEngine;

impl FingerprintEngine {
    /// Fingerprints title, content and summary.
    #[must_use]
    pub fn content(title: &str, content: &str, summary: &str) -> ContentFingerprint {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, title);
        update_field(&mut hasher, content);
        update_field(&mut hasher, summary);
        ContentFingerprint::from_bytes(hasher.finalize().into())
    }

    /// Fingerprints source, link, tags and score.
    #[must_use]
    pub fn metadata(
        source: &str,
        link: &str,
        tags: &str,
        score: AuthenticityScore,
    ) -> MetadataFingerprint {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, source);
        update_field(&mut hasher, link);
        update_field(&mut hasher, tags);
        hasher.update(score.to_be_bytes());
        MetadataFingerprint::from_bytes(hasher.finalize().into())
    }

    /// Combines a content and a metadata fingerprint.
    ///
    /// Both inputs are fixed-width, so they are concatenated without a prefix.
    #[must_use]
    pub fn combine(
        content: &ContentFingerprint,
        metadata: &MetadataFingerprint,
    ) -> CombinedFingerprint {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hasher.update(metadata.as_bytes());
        CombinedFingerprint::from_bytes(hasher.finalize().into())
    }

    /// Content fingerprint of a submission.
    #[must_use]
    pub fn content_of(submission: &ArticleSubmission) -> ContentFingerprint {
        Self::content(&submission.title, &submission.content, &submission.summary)
    }

    /// Metadata fingerprint of a submission.
    #[must_use]
    pub fn metadata_of(submission: &ArticleSubmission) -> MetadataFingerprint {
        Self::metadata(
            &submission.source,
            &submission.link,
            &submission.tags,
            submission.score,
        )
    }

    /// Computes every hash for a submission, including a plain title hash.
    #[must_use]
    pub fn article_hashes(submission: &ArticleSubmission) -> ArticleHashes {
        let content = Self::content_of(submission);
        let metadata = Self::metadata_of(submission);
        let combined = Self::combine(&content, &metadata);
        let title = hex::encode(Sha256::digest(submission.title.as_bytes()));

        ArticleHashes {
            content,
            metadata,
            combined,
            title,
        }
    }
}

/// Writes a length-prefixed field.
fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_be_bytes());
    hasher.update(field.as_bytes());
}
