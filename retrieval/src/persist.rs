//! On-disk form of a built index: `snapshot.bin` (bincode) next to a small
//! human-readable `meta.json`.

use crate::analyzer::{StandardAnalyzer, TextAnalyzer};
use crate::context::{IndexContext, IndexSnapshot};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Bumped whenever the snapshot layout changes.
pub const FORMAT_VERSION: u32 = 1;

const SNAPSHOT_FILE: &str = "snapshot.bin";
const META_FILE: &str = "meta.json";

/// Summary written beside the snapshot; checked before the snapshot is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub format_version: u32,
    pub num_docs: u32,
    pub boolean_terms: usize,
    pub ranking_terms: usize,
    /// RFC 3339, UTC.
    pub created_at: String,
}

impl IndexMeta {
    fn describe(ctx: &IndexContext) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            num_docs: ctx.documents().len() as u32,
            boolean_terms: ctx.inverted_index().num_terms(),
            ranking_terms: ctx.stats().num_terms(),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
        }
    }
}

/// Directory holding one saved index.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }

    pub fn snapshot(&self) -> PathBuf {
        self.root.join(SNAPSHOT_FILE)
    }

    pub fn meta(&self) -> PathBuf {
        self.root.join(META_FILE)
    }
}

pub fn save_snapshot(paths: &IndexPaths, snapshot: &IndexSnapshot) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    fs::write(paths.snapshot(), bincode::serialize(snapshot)?)
        .with_context(|| format!("writing {}", paths.snapshot().display()))
}

pub fn load_snapshot(paths: &IndexPaths) -> Result<IndexSnapshot> {
    let bytes = fs::read(paths.snapshot()).with_context(|| format!("reading {}", paths.snapshot().display()))?;
    Ok(bincode::deserialize(&bytes)?)
}

pub fn save_meta(paths: &IndexPaths, meta: &IndexMeta) -> Result<()> {
    fs::create_dir_all(&paths.root)?;
    fs::write(paths.meta(), serde_json::to_string_pretty(meta)?)
        .with_context(|| format!("writing {}", paths.meta().display()))
}

pub fn load_meta(paths: &IndexPaths) -> Result<IndexMeta> {
    let json = fs::read_to_string(paths.meta()).with_context(|| format!("reading {}", paths.meta().display()))?;
    Ok(serde_json::from_str(&json)?)
}

/// Write `ctx` and its metadata under `paths.root`.
pub fn save_index(paths: &IndexPaths, ctx: &IndexContext) -> Result<()> {
    save_snapshot(paths, &ctx.to_snapshot())?;
    let meta = IndexMeta::describe(ctx);
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), num_docs = meta.num_docs, "index saved");
    Ok(())
}

/// Load a saved index with the stock analyzer and the folding table it was built with.
pub fn load_index(paths: &IndexPaths) -> Result<IndexContext> {
    let snapshot = load_checked(paths)?;
    let analyzer = Arc::new(StandardAnalyzer::with_folding(snapshot.config.folding.clone()));
    Ok(IndexContext::from_snapshot(snapshot, analyzer)?)
}

/// Load a saved index, rebuilding normalizers with `analyzer`.
pub fn load_index_with_analyzer(paths: &IndexPaths, analyzer: Arc<dyn TextAnalyzer>) -> Result<IndexContext> {
    Ok(IndexContext::from_snapshot(load_checked(paths)?, analyzer)?)
}

fn load_checked(paths: &IndexPaths) -> Result<IndexSnapshot> {
    let meta = load_meta(paths)?;
    if meta.format_version != FORMAT_VERSION {
        bail!("unsupported index format version {} (expected {})", meta.format_version, FORMAT_VERSION);
    }
    let snapshot = load_snapshot(paths)?;
    if snapshot.documents.len() as u32 != meta.num_docs {
        bail!("{} reports {} documents, snapshot holds {}", META_FILE, meta.num_docs, snapshot.documents.len());
    }
    Ok(snapshot)
}
