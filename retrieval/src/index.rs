use crate::error::{Error, Result};
use crate::normalizer::Normalizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Dense position of a document in the input collection.
pub type DocId = u32;

/// An input record as supplied by a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    #[serde(default, alias = "titulo")]
    pub title: String,
    #[serde(alias = "texto", alias = "body")]
    pub text: String,
}

impl DocumentRecord {
    pub fn new(id: impl Into<String>, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into(), text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub raw_text: String,
    /// Normalized terms of `raw_text`, in order.
    pub tokens: Vec<String>,
}

/// Validate ids and normalize every record. Input order is kept.
pub fn ingest(records: Vec<DocumentRecord>, normalizer: &Normalizer) -> Result<Vec<Document>> {
    let mut seen: HashSet<String> = HashSet::with_capacity(records.len());
    let mut docs = Vec::with_capacity(records.len());
    for rec in records {
        if rec.id.is_empty() {
            return Err(Error::Validation(format!("document at position {} has an empty id", docs.len())));
        }
        if !seen.insert(rec.id.clone()) {
            return Err(Error::Validation(format!("duplicate document id {:?}", rec.id)));
        }
        let tokens = normalizer.normalize(&rec.text);
        docs.push(Document { id: rec.id, title: rec.title, raw_text: rec.text, tokens });
    }
    Ok(docs)
}

/// id → position, for documents whose ids are already known to be unique.
pub fn positions(documents: &[Document]) -> HashMap<String, DocId> {
    documents.iter().enumerate().map(|(i, d)| (d.id.clone(), i as DocId)).collect()
}

/// term → documents containing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: BTreeMap<String, BTreeSet<DocId>>,
    num_docs: u32,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Posting set of `term`, `None` when the term was never indexed.
    pub fn postings(&self, term: &str) -> Option<&BTreeSet<DocId>> {
        self.postings.get(term)
    }

    pub fn universe(&self) -> BTreeSet<DocId> {
        (0..self.num_docs).collect()
    }

    pub fn num_docs(&self) -> u32 { self.num_docs }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn terms(&self) -> impl Iterator<Item = (&String, &BTreeSet<DocId>)> {
        self.postings.iter()
    }
}

/// Term statistics shared by the two rankers.
///
/// Aggregations are keyed by term and document, never by insertion order, so
/// two builds over the same token sequences compare equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    /// term → (doc → raw term frequency). Only non-zero frequencies are stored.
    term_freqs: BTreeMap<String, BTreeMap<DocId, u32>>,
    doc_lengths: Vec<u32>,
    avgdl: f64,
}

impl CorpusStats {
    pub fn num_docs(&self) -> u32 { self.doc_lengths.len() as u32 }

    pub fn avgdl(&self) -> f64 { self.avgdl }

    pub fn doc_len(&self, doc: DocId) -> u32 {
        self.doc_lengths.get(doc as usize).copied().unwrap_or(0)
    }

    pub fn df(&self, term: &str) -> u32 {
        self.term_freqs.get(term).map_or(0, |m| m.len() as u32)
    }

    pub fn tf(&self, term: &str, doc: DocId) -> u32 {
        self.term_freqs.get(term).and_then(|m| m.get(&doc)).copied().unwrap_or(0)
    }

    /// Documents containing `term` with their frequencies, ascending by doc.
    pub fn term_postings(&self, term: &str) -> Option<&BTreeMap<DocId, u32>> {
        self.term_freqs.get(term)
    }

    pub fn vocabulary(&self) -> impl Iterator<Item = &String> {
        self.term_freqs.keys()
    }

    pub fn num_terms(&self) -> usize { self.term_freqs.len() }
}

/// Build the inverted index and corpus statistics from token sequences.
///
/// The i-th sequence belongs to document `i`.
pub fn build<I, T>(token_sequences: I) -> (InvertedIndex, CorpusStats)
where
    I: IntoIterator<Item = T>,
    T: AsRef<[String]>,
{
    let mut term_freqs: BTreeMap<String, BTreeMap<DocId, u32>> = BTreeMap::new();
    let mut doc_lengths: Vec<u32> = Vec::new();

    for tokens in token_sequences {
        let doc_id = doc_lengths.len() as DocId;
        let tokens = tokens.as_ref();
        for term in tokens {
            *term_freqs.entry(term.clone()).or_default().entry(doc_id).or_insert(0) += 1;
        }
        doc_lengths.push(tokens.len() as u32);
    }

    let num_docs = doc_lengths.len() as u32;
    let total: u64 = doc_lengths.iter().map(|&l| l as u64).sum();
    let avgdl = if num_docs > 0 { total as f64 / num_docs as f64 } else { 0.0 };

    let postings = term_freqs
        .iter()
        .map(|(term, docs)| (term.clone(), docs.keys().copied().collect()))
        .collect();

    tracing::debug!(num_docs, num_terms = term_freqs.len(), avgdl, "built corpus statistics");
    (InvertedIndex { postings, num_docs }, CorpusStats { term_freqs, doc_lengths, avgdl })
}

/// [`build`] over the stored token sequences of `documents`.
pub fn build_from_documents(documents: &[Document]) -> (InvertedIndex, CorpusStats) {
    build(documents.iter().map(|d| d.tokens.as_slice()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn statistics_follow_definitions() {
        let (index, stats) = build(vec![toks("vpn acesso vpn"), toks("acesso"), toks("")]);
        assert_eq!(stats.num_docs(), 3);
        assert_eq!(stats.tf("vpn", 0), 2);
        assert_eq!(stats.tf("vpn", 1), 0);
        assert_eq!(stats.df("acesso"), 2);
        assert_eq!(stats.df("missing"), 0);
        assert_eq!(stats.doc_len(0), 3);
        assert_eq!(stats.doc_len(2), 0);
        assert!((stats.avgdl() - 4.0 / 3.0).abs() < 1e-12);

        let acesso: Vec<DocId> = index.postings("acesso").unwrap().iter().copied().collect();
        assert_eq!(acesso, vec![0, 1]);
        assert_eq!(index.universe().len(), 3);
    }

    #[test]
    fn df_matches_posting_size() {
        let (index, stats) = build(vec![toks("a b c a"), toks("b b"), toks("c d")]);
        for (term, docs) in index.terms() {
            assert_eq!(stats.df(term) as usize, docs.len());
        }
        assert_eq!(index.num_terms(), stats.num_terms());
    }

    #[test]
    fn empty_collection_is_valid() {
        let (index, stats) = build(Vec::<Vec<String>>::new());
        assert_eq!(index.num_docs(), 0);
        assert!(index.universe().is_empty());
        assert_eq!(stats.avgdl(), 0.0);
    }

    #[test]
    fn ingest_rejects_duplicate_ids() {
        let n = Normalizer::portuguese();
        let err = ingest(
            vec![DocumentRecord::new("D1", "", "vpn"), DocumentRecord::new("D1", "", "acesso")],
            &n,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn ingest_rejects_empty_id() {
        let n = Normalizer::portuguese();
        let err = ingest(vec![DocumentRecord::new("", "", "vpn")], &n).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn record_accepts_portuguese_field_names() {
        let rec: DocumentRecord = serde_json::from_str(r#"{"id":"DOC1","titulo":"T","texto":"corpo"}"#).unwrap();
        assert_eq!(rec, DocumentRecord::new("DOC1", "T", "corpo"));
    }
}
