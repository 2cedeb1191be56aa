//! Engine configuration.
//!
//! Defaults are compile-time constants; a JSON file can override any subset of
//! fields through [`EngineConfig::from_json_file`].

use crate::error::Error;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// BM25 term frequency saturation parameter.
pub const BM25_K1: f64 = 1.5;

/// BM25 document length normalization parameter.
pub const BM25_B: f64 = 0.75;

/// Number of hits kept by top-K ranking when the caller does not say otherwise.
pub const DEFAULT_TOP_K: usize = 5;

/// Maximum parenthesis nesting of a boolean query.
pub const MAX_QUERY_DEPTH: usize = 128;

/// Hard cap on any configured `max_query_depth`.
pub const QUERY_DEPTH_CEILING: usize = 256;

/// Stopword locale used when none is configured.
pub const DEFAULT_LOCALE: &str = "pt";

/// Connectives kept in the boolean index even though they are stopwords.
pub const DEFAULT_CONNECTIVES: &[&str] = &["e", "ou", "não", "nunca", "sem", "nem"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f64,
    pub b: f64,
}

impl Bm25Params {
    /// `k1` must be finite and non-negative, `b` must lie in `[0, 1]`.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !self.k1.is_finite() || self.k1 < 0.0 {
            return Err(Error::Validation(format!("bm25 k1 must be a non-negative number, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::Validation(format!("bm25 b must lie in [0, 1], got {}", self.b)));
        }
        Ok(())
    }
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: BM25_K1, b: BM25_B }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Stopword locale handed to the analyzer.
    pub locale: String,
    /// Stopwords that survive normalization for the boolean index.
    pub connectives: Vec<String>,
    pub bm25: Bm25Params,
    pub top_k: usize,
    pub max_query_depth: usize,
    /// Extra diacritic folding entries, applied before Unicode decomposition.
    pub folding: BTreeMap<char, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            connectives: DEFAULT_CONNECTIVES.iter().map(|s| s.to_string()).collect(),
            bm25: Bm25Params::default(),
            top_k: DEFAULT_TOP_K,
            max_query_depth: MAX_QUERY_DEPTH,
            folding: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut f = File::open(path)?;
        let mut buf = String::new();
        f.read_to_string(&mut buf)?;
        Self::from_json_str(&buf)
    }
}
