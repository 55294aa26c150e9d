//! Per-field length limits.

use crate::models::{ArticleHashes, ArticleSubmission};
use crate::services::FingerprintEngine;

/// Maximum field lengths, in chars.
///
/// When enabled, oversized fields are cut before fingerprinting, so two
/// submissions that differ only past the limit are duplicates. Disabled by
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLimits {
    /// Whether truncation is applied.
    pub enabled: bool,
    /// Title limit.
    pub title: usize,
    /// Content limit.
    pub content: usize,
    /// Summary limit.
    pub summary: usize,
    /// Source limit.
    pub source: usize,
    /// Link limit.
    pub link: usize,
    /// Tags limit.
    pub tags: usize,
}

impl Default for FieldLimits {
    fn default() -> Self {
        Self {
            enabled: false,
            title: 300,
            content: 500,
            summary: 200,
            source: 100,
            link: 300,
            tags: 100,
        }
    }
}

impl FieldLimits {
    /// Default limits, switched on.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Truncates every field of `submission` to its limit.
    #[must_use]
    pub fn apply(&self, mut submission: ArticleSubmission) -> ArticleSubmission {
        if !self.enabled {
            return submission;
        }
        truncate_chars(&mut submission.title, self.title);
        truncate_chars(&mut submission.content, self.content);
        truncate_chars(&mut submission.summary, self.summary);
        truncate_chars(&mut submission.source, self.source);
        truncate_chars(&mut submission.link, self.link);
        truncate_chars(&mut submission.tags, self.tags);
        submission
    }

    /// Hashes `submission` after truncation, yielding the fingerprints
    /// admission stores.
    #[must_use]
    pub fn article_hashes(&self, submission: ArticleSubmission) -> ArticleHashes {
        FingerprintEngine::article_hashes(&self.apply(submission))
    }
}

/// Cuts `s` to at most `max` chars, on a char boundary.
fn truncate_chars(s: &mut String, max: usize) {
    if let Some((byte_idx, _)) = s.char_indices().nth(max) {
        s.truncate(byte_idx);
    }
}
