use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use retrieval::persist::{load_index, save_index, IndexPaths};
use retrieval::{Bm25Params, DocumentRecord, EngineConfig, Hit, IndexContext};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const FIXTURE: &str = include_str!("../../retrieval/tests/fixtures/corpus_v1.json");

const DEMO_BOOLEAN: &[&str] = &[
    r#"("vpn" AND "acesso") AND NOT "jornada""#,
    r#""benefícios" OR ("plano" AND "saúde")"#,
    r#""single-sign-on" AND NOT "senha""#,
    r#"("plano" OR "benefícios") AND "saúde""#,
    r#"NOT "phishing" AND "segurança""#,
];

const DEMO_RANKED: &str = "plano de saúde";

#[derive(Parser)]
#[command(name = "retrieve")]
#[command(about = "Boolean, BM25 and TF-IDF retrieval over a small document collection", long_about = None)]
struct Cli {
    /// JSON engine configuration; unset fields keep their defaults. Ignored with --index
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Input path (JSON/JSONL file or directory)
    #[arg(long, conflicts_with = "index")]
    input: Option<String>,
    /// Saved index directory
    #[arg(long)]
    index: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files and save it
    Build {
        #[arg(long)]
        input: String,
        #[arg(long)]
        output: String,
    },
    /// Evaluate a boolean query; prints matching ids in ascending order
    Boolean {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        query: String,
        /// Print the full documents instead of ids
        #[arg(long, default_value_t = false)]
        documents: bool,
    },
    /// Rank documents with BM25
    Bm25 {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        query: String,
        #[arg(long)]
        k: Option<usize>,
        #[arg(long)]
        k1: Option<f64>,
        #[arg(long)]
        b: Option<f64>,
        #[arg(long, default_value_t = false)]
        snippets: bool,
    },
    /// Rank documents by TF-IDF cosine similarity
    Tfidf {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        query: String,
        #[arg(long)]
        k: Option<usize>,
        #[arg(long, default_value_t = false)]
        snippets: bool,
    },
    /// Run the sample queries over the bundled fixture corpus
    Demo,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Build { input, output } => {
            let ctx = IndexContext::build(load_records(Path::new(&input))?, config)?;
            save_index(&IndexPaths::new(&output), &ctx)?;
            tracing::info!(output = %output, "index build complete");
            Ok(())
        }
        Commands::Boolean { source, query, documents } => {
            let ctx = open(&source, config)?;
            if documents {
                for doc in ctx.boolean_documents(&query)? {
                    print_json(&serde_json::json!({ "id": doc.id, "title": doc.title, "text": doc.raw_text }))?;
                }
            } else {
                for id in ctx.boolean_search(&query)? {
                    println!("{id}");
                }
            }
            Ok(())
        }
        Commands::Bm25 { source, query, k, k1, b, snippets } => {
            let ctx = open(&source, config)?;
            let defaults = ctx.config().bm25;
            let params = Bm25Params { k1: k1.unwrap_or(defaults.k1), b: b.unwrap_or(defaults.b) };
            let hits = ctx.bm25_rank_with(&query, params, k)?;
            print_hits(&ctx, hits, snippets)
        }
        Commands::Tfidf { source, query, k, snippets } => {
            let ctx = open(&source, config)?;
            let hits = ctx.tfidf_top_k(&query, k.unwrap_or(ctx.config().top_k));
            print_hits(&ctx, hits, snippets)
        }
        Commands::Demo => demo(config),
    }
}

fn open(source: &Source, config: EngineConfig) -> Result<IndexContext> {
    match (&source.input, &source.index) {
        (Some(input), _) => Ok(IndexContext::build(load_records(Path::new(input))?, config)?),
        // a saved index carries the config it was built with
        (None, Some(index)) => load_index(&IndexPaths::new(index)),
        (None, None) => bail!("either --input or --index is required"),
    }
}

fn demo(config: EngineConfig) -> Result<()> {
    let records: Vec<DocumentRecord> = serde_json::from_str(FIXTURE)?;
    let ctx = IndexContext::build(records, config)?;
    for query in DEMO_BOOLEAN {
        let ids = ctx.boolean_search(query)?;
        print_json(&serde_json::json!({ "model": "boolean", "query": query, "results": ids }))?;
    }
    let k = ctx.config().top_k;
    let bm25 = ctx.with_snippets(ctx.bm25_rank(DEMO_RANKED, Some(k)));
    print_json(&serde_json::json!({ "model": "bm25", "query": DEMO_RANKED, "results": bm25 }))?;
    let tfidf = ctx.with_snippets(ctx.tfidf_top_k(DEMO_RANKED, k));
    print_json(&serde_json::json!({ "model": "tfidf", "query": DEMO_RANKED, "results": tfidf }))?;
    Ok(())
}

fn print_hits(ctx: &IndexContext, hits: Vec<Hit>, snippets: bool) -> Result<()> {
    let hits = if snippets { ctx.with_snippets(hits) } else { hits };
    for hit in &hits {
        print_json(hit)?;
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Collect records from a file or every `.json`/`.jsonl` file under a directory,
/// in path order.
fn load_records(input_path: &Path) -> Result<Vec<DocumentRecord>> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        bail!("input path {} does not exist", input_path.display());
    }

    let mut records = Vec::new();
    for file in files {
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file, &mut records)?;
        } else {
            read_json(&file, &mut records)?;
        }
    }
    tracing::info!(num_docs = records.len(), "loaded documents");
    Ok(records)
}

fn read_jsonl(file: &Path, records: &mut Vec<DocumentRecord>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(())
}

fn read_json(file: &Path, records: &mut Vec<DocumentRecord>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                records.push(serde_json::from_value(v)?);
            }
        }
        serde_json::Value::Object(_) => records.push(serde_json::from_value(json)?),
        _ => tracing::warn!(file = %file.display(), "skipping JSON that is neither an object nor an array"),
    }
    Ok(())
}
