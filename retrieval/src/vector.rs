//! TF-IDF vector-space model with cosine similarity.
//!
//! Document and query vectors are sparse maps keyed by term. Weights use the
//! smoothed idf `ln((1 + N) / (1 + df)) + 1`, so no term ever gets a zero or
//! negative weight. The query side reuses the corpus idf and ignores terms
//! outside the vocabulary.

use crate::index::{CorpusStats, DocId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of words kept by [`snippet`].
pub const SNIPPET_WORDS: usize = 20;

/// term → weight. Ordered so sums are evaluated in a fixed order.
pub type SparseVector = BTreeMap<String, f64>;

pub fn smoothed_idf(num_docs: u32, df: u32) -> f64 {
    ((1.0 + num_docs as f64) / (1.0 + df as f64)).ln() + 1.0
}

pub fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(t, w)| large.get(t).map(|v| w * v))
        .sum()
}

pub fn l2_norm(v: &SparseVector) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Scale `v` to unit length. A zero vector is returned unchanged.
pub fn l2_normalize(mut v: SparseVector) -> SparseVector {
    let norm = l2_norm(&v);
    if norm > 0.0 {
        for w in v.values_mut() {
            *w /= norm;
        }
    }
    v
}

/// Cosine similarity; 0.0 when either vector has zero norm.
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let na = l2_norm(a);
    let nb = l2_norm(b);
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}

/// Fitted idf table plus one normalized vector per document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TfIdfModel {
    idf: BTreeMap<String, f64>,
    vectors: Vec<SparseVector>,
}

impl TfIdfModel {
    /// Fit on the corpus: idf per vocabulary term, L2-normalized tf·idf per document.
    pub fn build(stats: &CorpusStats) -> Self {
        let n = stats.num_docs();
        let mut idf = BTreeMap::new();
        let mut vectors: Vec<SparseVector> = vec![SparseVector::new(); n as usize];
        for term in stats.vocabulary() {
            let Some(postings) = stats.term_postings(term) else { continue };
            let w_idf = smoothed_idf(n, postings.len() as u32);
            idf.insert(term.clone(), w_idf);
            for (&doc, &tf) in postings {
                vectors[doc as usize].insert(term.clone(), tf as f64 * w_idf);
            }
        }
        let vectors = vectors.into_iter().map(l2_normalize).collect();
        Self { idf, vectors }
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }

    pub fn vector(&self, doc: DocId) -> Option<&SparseVector> {
        self.vectors.get(doc as usize)
    }

    pub fn num_docs(&self) -> usize {
        self.vectors.len()
    }

    /// Query vector from normalized terms, with the corpus idf.
    pub fn query_vector(&self, terms: &[String]) -> SparseVector {
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for t in terms {
            if self.idf.contains_key(t.as_str()) {
                *counts.entry(t.as_str()).or_insert(0) += 1;
            }
        }
        let raw = counts
            .into_iter()
            .map(|(t, c)| (t.to_string(), c as f64 * self.idf[t]))
            .collect();
        l2_normalize(raw)
    }

    /// Cosine similarity of every document with the query, in collection order.
    pub fn similarities(&self, terms: &[String]) -> Vec<f64> {
        let q = self.query_vector(terms);
        self.vectors.iter().map(|d| cosine(d, &q)).collect()
    }
}

/// First [`SNIPPET_WORDS`] whitespace-delimited words of `text`, unmodified.
pub fn snippet(text: &str) -> String {
    text.split_whitespace().take(SNIPPET_WORDS).collect::<Vec<_>>().join(" ")
}
