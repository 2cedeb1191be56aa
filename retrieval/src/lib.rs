//! In-memory text retrieval with three query models over one normalization
//! pipeline: boolean (AND/OR/NOT over quoted terms), BM25 and TF-IDF cosine.
//!
//! ```
//! use retrieval::{DocumentRecord, EngineConfig, IndexContext};
//!
//! let docs = vec![
//!     DocumentRecord::new("DOC1", "VPN", "Acesso à VPN disponível 24h."),
//!     DocumentRecord::new("DOC2", "Jornada", "Nova política de jornada e acesso."),
//! ];
//! let ctx = IndexContext::build(docs, EngineConfig::default()).unwrap();
//! assert_eq!(ctx.boolean_search(r#""acesso" AND NOT "jornada""#).unwrap(), vec!["DOC1"]);
//! assert_eq!(ctx.bm25_rank("vpn", Some(1))[0].doc_id, "DOC1");
//! ```

pub mod analyzer;
pub mod bm25;
pub mod boolean;
pub mod config;
pub mod context;
pub mod error;
pub mod index;
pub mod normalizer;
pub mod persist;
pub mod ranking;
pub mod vector;

pub use analyzer::{StandardAnalyzer, TextAnalyzer};
pub use config::{Bm25Params, EngineConfig};
pub use context::{IndexContext, IndexSnapshot};
pub use error::{Error, Result};
pub use index::{DocId, Document, DocumentRecord};
pub use normalizer::Normalizer;
pub use ranking::Hit;
