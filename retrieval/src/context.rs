//! The built engine: documents, boolean index, corpus statistics and TF-IDF
//! vectors, constructed once and queried by shared reference.

use crate::analyzer::{StandardAnalyzer, TextAnalyzer};
use crate::bm25::Bm25Scorer;
use crate::boolean::{self, Expr};
use crate::config::{Bm25Params, EngineConfig};
use crate::error::{Error, Result};
use crate::index::{self, CorpusStats, DocId, Document, DocumentRecord, InvertedIndex};
use crate::normalizer::Normalizer;
use crate::ranking::{self, Hit};
use crate::vector::{self, TfIdfModel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable query context over one document collection.
///
/// Two normalizers are kept: the boolean one preserves the configured
/// connectives so they remain queryable terms, the ranking one drops them as
/// ordinary stopwords. [`Document::tokens`] holds the ranking view.
#[derive(Debug, Clone)]
pub struct IndexContext {
    config: EngineConfig,
    documents: Vec<Document>,
    positions: HashMap<String, DocId>,
    boolean_index: InvertedIndex,
    stats: CorpusStats,
    tfidf: TfIdfModel,
    boolean_normalizer: Normalizer,
    ranking_normalizer: Normalizer,
}

/// Serializable form of an [`IndexContext`]; normalizers are rebuilt on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub config: EngineConfig,
    pub documents: Vec<Document>,
    pub boolean_index: InvertedIndex,
    pub stats: CorpusStats,
    pub tfidf: TfIdfModel,
}

fn normalizers(config: &EngineConfig, analyzer: Arc<dyn TextAnalyzer>) -> (Normalizer, Normalizer) {
    let ranking = Normalizer::new(analyzer, &config.locale);
    let boolean = ranking.clone().with_exceptions(&config.connectives);
    (boolean, ranking)
}

impl IndexContext {
    /// Build with the stock analyzer and the folding table from `config`.
    pub fn build(records: Vec<DocumentRecord>, config: EngineConfig) -> Result<Self> {
        let analyzer = Arc::new(StandardAnalyzer::with_folding(config.folding.clone()));
        Self::build_with_analyzer(records, config, analyzer)
    }

    pub fn build_with_analyzer(
        records: Vec<DocumentRecord>,
        config: EngineConfig,
        analyzer: Arc<dyn TextAnalyzer>,
    ) -> Result<Self> {
        config.bm25.validate()?;
        let (boolean_normalizer, ranking_normalizer) = normalizers(&config, analyzer);
        let documents = index::ingest(records, &ranking_normalizer)?;

        let boolean_tokens: Vec<Vec<String>> =
            documents.iter().map(|d| boolean_normalizer.normalize(&d.raw_text)).collect();
        let (boolean_index, _) = index::build(&boolean_tokens);
        let (_, stats) = index::build_from_documents(&documents);
        let tfidf = TfIdfModel::build(&stats);

        tracing::info!(
            num_docs = documents.len(),
            boolean_terms = boolean_index.num_terms(),
            ranking_terms = stats.num_terms(),
            avgdl = stats.avgdl(),
            "index built"
        );
        let positions = index::positions(&documents);
        Ok(Self { config, documents, positions, boolean_index, stats, tfidf, boolean_normalizer, ranking_normalizer })
    }

    /// Rebuild a context from a snapshot, rejecting one whose parts disagree
    /// on the collection size or whose ids are not unique.
    pub fn from_snapshot(snapshot: IndexSnapshot, analyzer: Arc<dyn TextAnalyzer>) -> Result<Self> {
        snapshot.config.bm25.validate()?;
        let n = snapshot.documents.len();
        let sizes = [
            snapshot.boolean_index.num_docs() as usize,
            snapshot.stats.num_docs() as usize,
            snapshot.tfidf.num_docs(),
        ];
        if sizes.iter().any(|&s| s != n) {
            return Err(Error::Validation(format!(
                "snapshot holds {} documents but its index parts cover {:?}",
                n, sizes
            )));
        }
        let positions = index::positions(&snapshot.documents);
        if positions.len() != n {
            return Err(Error::Validation("snapshot contains duplicate document ids".to_string()));
        }
        let (boolean_normalizer, ranking_normalizer) = normalizers(&snapshot.config, analyzer);
        Ok(Self {
            config: snapshot.config,
            documents: snapshot.documents,
            positions,
            boolean_index: snapshot.boolean_index,
            stats: snapshot.stats,
            tfidf: snapshot.tfidf,
            boolean_normalizer,
            ranking_normalizer,
        })
    }

    pub fn to_snapshot(&self) -> IndexSnapshot {
        IndexSnapshot {
            config: self.config.clone(),
            documents: self.documents.clone(),
            boolean_index: self.boolean_index.clone(),
            stats: self.stats.clone(),
            tfidf: self.tfidf.clone(),
        }
    }

    pub fn config(&self) -> &EngineConfig { &self.config }
    pub fn documents(&self) -> &[Document] { &self.documents }
    pub fn inverted_index(&self) -> &InvertedIndex { &self.boolean_index }
    pub fn stats(&self) -> &CorpusStats { &self.stats }
    pub fn tfidf_model(&self) -> &TfIdfModel { &self.tfidf }
    pub fn boolean_normalizer(&self) -> &Normalizer { &self.boolean_normalizer }
    pub fn ranking_normalizer(&self) -> &Normalizer { &self.ranking_normalizer }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.positions.get(id).map(|&d| &self.documents[d as usize])
    }

    // ---- boolean ----

    pub fn parse_boolean(&self, query: &str) -> Result<Expr> {
        boolean::parse(query, self.config.max_query_depth)
    }

    /// Ids of the documents satisfying `query`, ascending.
    pub fn boolean_search(&self, query: &str) -> Result<Vec<String>> {
        let expr = self.parse_boolean(query)?;
        let matched = boolean::evaluate(&expr, &self.boolean_index, &self.boolean_normalizer);
        let mut ids: Vec<String> = matched.into_iter().map(|d| self.documents[d as usize].id.clone()).collect();
        ids.sort();
        tracing::debug!(query, %expr, hits = ids.len(), "boolean query");
        Ok(ids)
    }

    /// [`Self::boolean_search`] dereferenced to documents.
    pub fn boolean_documents(&self, query: &str) -> Result<Vec<&Document>> {
        let ids = self.boolean_search(query)?;
        Ok(ids.iter().filter_map(|id| self.document(id)).collect())
    }

    // ---- BM25 ----

    // The configured parameters were validated when the context was built.

    /// BM25 score of every document, in collection order.
    pub fn bm25_scores(&self, query: &str) -> Vec<Hit> {
        let scores = self.raw_bm25(query, self.config.bm25);
        scores.iter().enumerate().map(|(d, &s)| self.hit(d as DocId, s)).collect()
    }

    pub fn bm25_scores_with(&self, query: &str, params: Bm25Params) -> Result<Vec<Hit>> {
        params.validate()?;
        let scores = self.raw_bm25(query, params);
        Ok(scores.iter().enumerate().map(|(d, &s)| self.hit(d as DocId, s)).collect())
    }

    /// Documents by descending BM25 score, optionally truncated to `top_k`.
    pub fn bm25_rank(&self, query: &str, top_k: Option<usize>) -> Vec<Hit> {
        self.ranked_bm25(query, self.config.bm25, top_k)
    }

    pub fn bm25_rank_with(&self, query: &str, params: Bm25Params, top_k: Option<usize>) -> Result<Vec<Hit>> {
        params.validate()?;
        Ok(self.ranked_bm25(query, params, top_k))
    }

    fn ranked_bm25(&self, query: &str, params: Bm25Params, top_k: Option<usize>) -> Vec<Hit> {
        let scores = self.raw_bm25(query, params);
        let mut ranked = ranking::rank(&scores);
        if let Some(k) = top_k {
            ranked.truncate(k);
        }
        tracing::debug!(query, hits = ranked.len(), "bm25 query");
        ranked.into_iter().map(|(d, s)| self.hit(d, s)).collect()
    }

    fn raw_bm25(&self, query: &str, params: Bm25Params) -> Vec<f64> {
        let terms = self.ranking_normalizer.normalize(query);
        Bm25Scorer::new(&self.stats, params).scores(&terms)
    }

    // ---- TF-IDF ----

    /// Cosine similarity of every document with `query`, in collection order.
    pub fn tfidf_scores(&self, query: &str) -> Vec<Hit> {
        let terms = self.ranking_normalizer.normalize(query);
        let sims = self.tfidf.similarities(&terms);
        sims.iter().enumerate().map(|(d, &s)| self.hit(d as DocId, s)).collect()
    }

    /// At most `k` documents with positive similarity, most similar first.
    pub fn tfidf_top_k(&self, query: &str, k: usize) -> Vec<Hit> {
        let terms = self.ranking_normalizer.normalize(query);
        let sims = self.tfidf.similarities(&terms);
        let ranked = ranking::top_k_positive(&sims, k);
        tracing::debug!(query, k, hits = ranked.len(), "tfidf query");
        ranked.into_iter().map(|(d, s)| self.hit(d, s)).collect()
    }

    /// [`Self::tfidf_top_k`] with the configured `top_k`.
    pub fn tfidf_search(&self, query: &str) -> Vec<Hit> {
        self.tfidf_top_k(query, self.config.top_k)
    }

    // ---- presentation helpers ----

    pub fn snippet(&self, doc_id: &str) -> Option<String> {
        self.document(doc_id).map(|d| vector::snippet(&d.raw_text))
    }

    /// Attach a snippet of the original text to each hit.
    pub fn with_snippets(&self, hits: Vec<Hit>) -> Vec<Hit> {
        hits.into_iter()
            .map(|mut h| {
                h.snippet = self.snippet(&h.doc_id);
                h
            })
            .collect()
    }

    fn hit(&self, doc: DocId, score: f64) -> Hit {
        Hit { doc_id: self.documents[doc as usize].id.clone(), score, snippet: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn ctx(texts: &[&str]) -> IndexContext {
        let records = texts
            .iter()
            .enumerate()
            .map(|(i, t)| DocumentRecord::new(format!("D{}", i + 1), "", *t))
            .collect();
        IndexContext::build(records, EngineConfig::default()).unwrap()
    }

    #[test]
    fn context_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<IndexContext>();
    }

    #[test]
    fn empty_collection_returns_empty_results() {
        let c = IndexContext::build(Vec::new(), EngineConfig::default()).unwrap();
        assert!(c.boolean_search(r#""vpn""#).unwrap().is_empty());
        assert!(c.boolean_search(r#"NOT "vpn""#).unwrap().is_empty());
        assert!(c.bm25_rank("vpn", None).is_empty());
        assert!(c.tfidf_top_k("vpn", 5).is_empty());
    }

    #[test]
    fn connectives_queryable_only_in_boolean_mode() {
        let c = ctx(&["vpn e acesso", "vpn acesso"]);
        assert_eq!(c.boolean_search(r#""e""#).unwrap(), vec!["D1"]);
        assert!(c.stats().df("e") == 0);
        assert!(c.bm25_scores("e").iter().all(|h| h.score == 0.0));
    }

    #[test]
    fn multi_word_literal_is_conjunctive() {
        let c = ctx(&["plano de saúde", "plano odontológico", "saúde mental"]);
        assert_eq!(c.boolean_search(r#""plano de saúde""#).unwrap(), vec!["D1"]);
    }

    #[test]
    fn stopword_only_literal_matches_nothing() {
        let c = ctx(&["de a o", "vpn"]);
        assert!(c.boolean_search(r#""de""#).unwrap().is_empty());
        assert_eq!(c.boolean_search(r#"NOT "de""#).unwrap(), vec!["D1", "D2"]);
    }

    #[test]
    fn syntax_errors_propagate() {
        let c = ctx(&["vpn"]);
        assert!(matches!(c.boolean_search(r#"("vpn""#), Err(Error::Syntax { position: 0, .. })));
    }

    #[test]
    fn stopword_query_keeps_collection_order() {
        let c = ctx(&["vpn", "acesso", "jornada"]);
        let ids: Vec<String> = c.bm25_rank("de para com", None).into_iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec!["D1", "D2", "D3"]);
    }

    #[test]
    fn snippets_use_original_text() {
        let c = ctx(&["Acesso à VPN, disponível 24h."]);
        let hits = c.with_snippets(c.tfidf_top_k("vpn", 5));
        assert_eq!(hits[0].snippet.as_deref(), Some("Acesso à VPN, disponível 24h."));
    }

    #[test]
    fn snapshot_round_trip_preserves_results() {
        let c = ctx(&["vpn acesso", "plano saúde", "jornada ponto"]);
        let restored = IndexContext::from_snapshot(c.to_snapshot(), Arc::new(StandardAnalyzer::new())).unwrap();
        assert_eq!(restored.boolean_search(r#""vpn" OR "plano""#).unwrap(), vec!["D1", "D2"]);
        assert_eq!(restored.bm25_scores("vpn"), c.bm25_scores("vpn"));
    }

    #[test]
    fn inconsistent_snapshot_rejected() {
        let c = ctx(&["vpn acesso", "plano saúde", "jornada ponto"]);
        let mut snapshot = c.to_snapshot();
        snapshot.documents.pop();
        let err = IndexContext::from_snapshot(snapshot, Arc::new(StandardAnalyzer::new())).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let mut snapshot = c.to_snapshot();
        snapshot.documents[2].id = "D1".to_string();
        let err = IndexContext::from_snapshot(snapshot, Arc::new(StandardAnalyzer::new())).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn invalid_bm25_params_rejected() {
        let c = ctx(&["vpn acesso", "vpn", "jornada"]);
        let bad = Bm25Params { k1: -1.0, b: 0.0 };
        assert!(matches!(c.bm25_rank_with("vpn", bad, None), Err(Error::Validation(_))));
        assert!(matches!(c.bm25_scores_with("vpn", bad), Err(Error::Validation(_))));
        let out_of_range = Bm25Params { k1: 1.2, b: 1.5 };
        assert!(matches!(c.bm25_rank_with("vpn", out_of_range, None), Err(Error::Validation(_))));

        let hits = c.bm25_rank_with("vpn", Bm25Params { k1: 1.2, b: 0.0 }, None).unwrap();
        assert!(hits.iter().all(|h| h.score.is_finite()));

        let config = EngineConfig { bm25: bad, ..EngineConfig::default() };
        let records = vec![DocumentRecord::new("D1", "", "vpn")];
        assert!(matches!(IndexContext::build(records, config), Err(Error::Validation(_))));
    }

    #[test]
    fn document_lookup_by_id() {
        let c = ctx(&["vpn", "acesso", "jornada"]);
        assert_eq!(c.document("D2").map(|d| d.raw_text.as_str()), Some("acesso"));
        assert!(c.document("D9").is_none());
        let docs = c.boolean_documents(r#""vpn" OR "jornada""#).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["D1", "D3"]);
    }
}
