//! Property tests for the boolean engine and index determinism.

use proptest::prelude::*;
use retrieval::{DocumentRecord, EngineConfig, IndexContext};
use std::collections::BTreeSet;

const VOCAB: &[&str] = &["vpn", "acesso", "jornada", "plano", "saude", "senha", "portal", "single-sign-on"];

fn word_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(VOCAB)
}

fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(word_strategy(), 0..8).prop_map(|words| words.join(" "))
}

fn corpus_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(document_strategy(), 0..12)
}

fn build(texts: &[String]) -> IndexContext {
    let records = texts
        .iter()
        .enumerate()
        .map(|(i, t)| DocumentRecord::new(format!("D{i:03}"), "", t.clone()))
        .collect();
    IndexContext::build(records, EngineConfig::default()).unwrap()
}

fn set(ctx: &IndexContext, query: &str) -> BTreeSet<String> {
    ctx.boolean_search(query).unwrap().into_iter().collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_double_negation(corpus in corpus_strategy(), a in word_strategy()) {
        let ctx = build(&corpus);
        prop_assert_eq!(set(&ctx, &format!(r#"NOT (NOT "{a}")"#)), set(&ctx, &format!(r#""{a}""#)));
    }

    #[test]
    fn prop_and_is_subset(corpus in corpus_strategy(), a in word_strategy(), b in word_strategy()) {
        let ctx = build(&corpus);
        let both = set(&ctx, &format!(r#""{a}" AND "{b}""#));
        let only_a = set(&ctx, &format!(r#""{a}""#));
        prop_assert!(both.is_subset(&only_a));
    }

    #[test]
    fn prop_or_is_superset(corpus in corpus_strategy(), a in word_strategy(), b in word_strategy()) {
        let ctx = build(&corpus);
        let either = set(&ctx, &format!(r#""{a}" OR "{b}""#));
        let only_a = set(&ctx, &format!(r#""{a}""#));
        prop_assert!(either.is_superset(&only_a));
    }

    #[test]
    fn prop_de_morgan(corpus in corpus_strategy(), a in word_strategy(), b in word_strategy()) {
        let ctx = build(&corpus);
        let lhs = set(&ctx, &format!(r#"NOT ("{a}" AND "{b}")"#));
        let rhs = set(&ctx, &format!(r#"(NOT "{a}") OR (NOT "{b}")"#));
        prop_assert_eq!(lhs, rhs);
    }

    #[test]
    fn prop_flat_chain_matches_pairwise(corpus in corpus_strategy(), words in prop::collection::vec(word_strategy(), 2..40)) {
        let ctx = build(&corpus);
        let quoted: Vec<String> = words.iter().map(|w| format!(r#""{w}""#)).collect();
        let mut any = BTreeSet::new();
        let mut all: Option<BTreeSet<String>> = None;
        for q in &quoted {
            let hits = set(&ctx, q);
            any.extend(hits.iter().cloned());
            all = Some(match all {
                Some(acc) => acc.intersection(&hits).cloned().collect(),
                None => hits,
            });
        }
        prop_assert_eq!(set(&ctx, &quoted.join(" OR ")), any);
        prop_assert_eq!(set(&ctx, &quoted.join(" AND ")), all.unwrap_or_default());
    }

    #[test]
    fn prop_results_sorted_and_known(corpus in corpus_strategy(), a in word_strategy()) {
        let ctx = build(&corpus);
        let ids = ctx.boolean_search(&format!(r#"NOT "{a}""#)).unwrap();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
        for id in &ids {
            prop_assert!(ctx.document(id).is_some());
        }
    }

    #[test]
    fn prop_rebuild_is_deterministic(corpus in corpus_strategy(), q in document_strategy()) {
        let first = build(&corpus);
        let second = build(&corpus);
        prop_assert_eq!(first.inverted_index(), second.inverted_index());
        prop_assert_eq!(first.stats(), second.stats());
        let (s1, s2) = (first.bm25_scores(&q), second.bm25_scores(&q));
        for (x, y) in s1.iter().zip(&s2) {
            prop_assert!((x.score - y.score).abs() < 1e-9);
        }
        let (t1, t2) = (first.tfidf_scores(&q), second.tfidf_scores(&q));
        for (x, y) in t1.iter().zip(&t2) {
            prop_assert!((x.score - y.score).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_bm25_ranking_is_descending(corpus in corpus_strategy(), q in document_strategy()) {
        let ctx = build(&corpus);
        let hits = ctx.bm25_rank(&q, None);
        prop_assert_eq!(hits.len(), corpus.len());
        prop_assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn prop_cosine_bounded(corpus in corpus_strategy(), q in document_strategy()) {
        let ctx = build(&corpus);
        for h in ctx.tfidf_scores(&q) {
            prop_assert!(h.score.is_finite());
            prop_assert!(h.score >= 0.0 && h.score <= 1.0 + 1e-9);
        }
    }
}
