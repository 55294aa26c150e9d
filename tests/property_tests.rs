//! Property-based tests for the registry.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Fingerprints are deterministic and sensitive to field boundaries
//! - Each distinct content is admitted exactly once
//! - Identifiers are dense and `get` round-trips
//! - Publisher listings agree with publisher counts
//! - Recency returns newest first, bounded by n
//! - Batch verify agrees with single verify

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use newsledger::{
    ArticleSubmission, AuthenticityScore, FingerprintEngine, Publisher, QueryService, RecordId,
    RegistryService,
};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

fn submission_strategy() -> impl Strategy<Value = (usize, String, String)> {
    // Small alphabets force plenty of duplicates.
    (0usize..4, "[ab]{1,3}", "[xy]{1,2}")
}

fn build(
    ops: &[(usize, String, String)],
) -> (Arc<RegistryService>, QueryService, Vec<Publisher>) {
    let publishers: Vec<Publisher> = (0..4).map(|i| Publisher::new(format!("pub-{i}"))).collect();
    let registry = Arc::new(RegistryService::in_memory());
    for (p, title, content) in ops {
        registry
            .admit(
                &publishers[*p],
                ArticleSubmission::new(title.as_str(), content.as_str(), ""),
            )
            .unwrap();
    }
    let query = QueryService::new(Arc::clone(&registry));
    (registry, query, publishers)
}

proptest! {
    /// Property: fingerprints are pure functions of their inputs.
    #[test]
    fn prop_fingerprint_deterministic(
        title in ".{0,40}",
        content in ".{0,80}",
        summary in ".{0,40}",
        source in ".{0,20}",
        score in 0u64..10_000,
    ) {
        prop_assert_eq!(
            FingerprintEngine::content(&title, &content, &summary),
            FingerprintEngine::content(&title, &content, &summary)
        );
        let score = AuthenticityScore::from_hundredths(score);
        prop_assert_eq!(
            FingerprintEngine::metadata(&source, "", "", score),
            FingerprintEngine::metadata(&source, "", "", score)
        );
    }

    /// Property: moving a boundary between title and content changes the fingerprint.
    #[test]
    fn prop_field_boundaries_matter(s in "[a-z]{2,30}", split in 1usize..30) {
        let split = split.min(s.len() - 1);
        let (left, right) = s.split_at(split);
        let shifted = split.saturating_sub(1).max(1);
        prop_assume!(shifted != split);
        let (left2, right2) = s.split_at(shifted);

        prop_assert_ne!(
            FingerprintEngine::content(left, right, ""),
            FingerprintEngine::content(left2, right2, "")
        );
    }

    /// Property: the number of admitted records equals the number of distinct contents.
    #[test]
    fn prop_each_content_admitted_once(ops in prop::collection::vec(submission_strategy(), 0..40)) {
        let (_registry, query, _) = build(&ops);

        let distinct: HashSet<_> = ops.iter().map(|(_, t, c)| (t.clone(), c.clone())).collect();
        prop_assert_eq!(query.total_count(), distinct.len() as u64);
    }

    /// Property: identifiers are exactly 1..=count and each resolves to a record.
    #[test]
    fn prop_ids_dense(ops in prop::collection::vec(submission_strategy(), 0..40)) {
        let (registry, _, _) = build(&ops);
        let count = registry.count();

        for id in 1..=count {
            let record = registry.get(RecordId::new(id)).unwrap();
            prop_assert_eq!(record.id.get(), id);
        }
        prop_assert!(registry.get(RecordId::new(count + 1)).is_err());
        prop_assert!(registry.get(RecordId::NONE).is_err());
    }

    /// Property: the first submitter of each content owns it, and listings agree with counts.
    #[test]
    fn prop_publisher_index_consistent(ops in prop::collection::vec(submission_strategy(), 0..40)) {
        let (_registry, query, publishers) = build(&ops);

        let mut owner: HashMap<(String, String), usize> = HashMap::new();
        for (p, t, c) in &ops {
            owner.entry((t.clone(), c.clone())).or_insert(*p);
        }

        let mut total = 0;
        for (i, publisher) in publishers.iter().enumerate() {
            let listed = query.list_for(publisher);
            prop_assert_eq!(listed.len(), query.count_for(publisher));
            prop_assert_eq!(listed.len(), owner.values().filter(|&&p| p == i).count());
            prop_assert!(listed.windows(2).all(|w| w[0] < w[1]));
            for id in &listed {
                prop_assert_eq!(&query.get(*id).unwrap().publisher, publisher);
            }
            total += listed.len();
        }
        prop_assert_eq!(total as u64, query.total_count());
    }

    /// Property: recent(n) is the newest min(n, count) ids, descending.
    #[test]
    fn prop_recent_newest_first(
        ops in prop::collection::vec(submission_strategy(), 0..40),
        n in 0usize..50,
    ) {
        let (_registry, query, _) = build(&ops);
        let count = query.total_count();

        let recent = query.recent(n);
        let expected: Vec<RecordId> = (1..=count).rev().take(n).map(RecordId::new).collect();
        prop_assert_eq!(recent, expected);
    }

    /// Property: batch verify answers each fingerprint like verify does.
    #[test]
    fn prop_batch_verify_parity(
        ops in prop::collection::vec(submission_strategy(), 0..30),
        probes in prop::collection::vec(("[ab]{1,3}", "[xy]{1,2}"), 0..20),
    ) {
        let (_registry, query, _) = build(&ops);
        let fps: Vec<_> = probes
            .iter()
            .map(|(t, c)| FingerprintEngine::content(t, c, ""))
            .collect();

        let batch = query.batch_verify(&fps);
        prop_assert_eq!(batch.len(), fps.len());
        for (fp, hit) in fps.iter().zip(&batch) {
            let (exists, id) = query.verify(fp);
            prop_assert_eq!(exists, *hit);
            prop_assert_eq!(id.is_none(), !exists);
        }
    }
}
