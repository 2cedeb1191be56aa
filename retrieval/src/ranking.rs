use crate::index::DocId;
use serde::{Deserialize, Serialize};

/// One ranked result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub doc_id: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

/// Order documents by descending score. The sort is stable, so equal scores
/// keep collection order.
pub fn rank(scores: &[f64]) -> Vec<(DocId, f64)> {
    let mut ranked: Vec<(DocId, f64)> = scores.iter().enumerate().map(|(i, &s)| (i as DocId, s)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// [`rank`], keeping only positive scores, at most `k` of them.
pub fn top_k_positive(scores: &[f64], k: usize) -> Vec<(DocId, f64)> {
    let mut ranked = rank(scores);
    ranked.retain(|&(_, s)| s > 0.0);
    ranked.truncate(k);
    ranked
}
