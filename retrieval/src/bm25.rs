//! BM25 Okapi scoring over [`CorpusStats`].
//!
//! ```text
//! idf(t)     = ln((N - df + 0.5) / (df + 0.5) + 1)
//! score(t,d) = idf * tf * (k1 + 1) / (tf + k1 * (1 - b + b * dl / avgdl))
//! ```
//!
//! The `+ 1` inside the logarithm keeps idf non-negative even for terms that
//! appear in every document.

use crate::config::Bm25Params;
use crate::index::{CorpusStats, DocId};

pub fn idf(num_docs: u32, df: u32) -> f64 {
    let n = num_docs as f64;
    let df = df as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

/// Contribution of one term occurring `tf` times in a document of length `dl`.
pub fn term_score(idf: f64, tf: u32, dl: u32, avgdl: f64, params: Bm25Params) -> f64 {
    if tf == 0 {
        return 0.0;
    }
    let tf = tf as f64;
    // tf > 0 implies dl > 0 and avgdl > 0 for statistics built from real documents
    let length_ratio = if avgdl > 0.0 { dl as f64 / avgdl } else { 1.0 };
    let norm = params.k1 * (1.0 - params.b + params.b * length_ratio);
    idf * tf * (params.k1 + 1.0) / (tf + norm)
}

/// Scores every document of a corpus against normalized query terms.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Scorer<'a> {
    stats: &'a CorpusStats,
    params: Bm25Params,
}

impl<'a> Bm25Scorer<'a> {
    pub fn new(stats: &'a CorpusStats, params: Bm25Params) -> Self {
        Self { stats, params }
    }

    /// One score per document, in collection order. Documents matching no term
    /// score 0.0. A term repeated in the query contributes once per occurrence.
    pub fn scores(&self, terms: &[String]) -> Vec<f64> {
        let n = self.stats.num_docs();
        let avgdl = self.stats.avgdl();
        let mut scores = vec![0.0f64; n as usize];
        for term in terms {
            let postings = match self.stats.term_postings(term) {
                Some(p) => p,
                None => continue,
            };
            let idf = idf(n, postings.len() as u32);
            for (&doc, &tf) in postings {
                scores[doc as usize] += term_score(idf, tf, self.stats.doc_len(doc), avgdl, self.params);
            }
        }
        scores
    }

    pub fn score_doc(&self, terms: &[String], doc: DocId) -> f64 {
        let n = self.stats.num_docs();
        let avgdl = self.stats.avgdl();
        terms
            .iter()
            .map(|t| {
                let tf = self.stats.tf(t, doc);
                term_score(idf(n, self.stats.df(t)), tf, self.stats.doc_len(doc), avgdl, self.params)
            })
            .sum()
    }
}
