use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::cli::{BuildArgs, CatalogArgs};
use crate::config::EngineConfig;
use crate::fetch::{HttpFetcher, Paced};
use crate::pipeline::{BookRef, PipelineOptions};

pub fn run(args: BuildArgs) -> anyhow::Result<()> {
    let out_dir = PathBuf::from(&args.out);
    if out_dir.exists() {
        anyhow::bail!("output directory already exists: {}", out_dir.display());
    }

    let book = BookRef::parse(&args.book).context("parse --book")?;
    let mut config = load_config(args.config.as_deref())?;
    if let Some(origin) = &book.origin {
        config.base_url = origin.clone();
    }
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(delay_ms) = args.delay_ms {
        config.request_delay_ms = delay_ms;
    }
    config.validate().context("validate config")?;

    let fetcher = Paced::new(HttpFetcher::new(&config)?, config.request_delay());

    tracing::info!(book = %book.identifier, base_url = %config.base_url, "build: resolve chapters");
    let resolved = crate::pipeline::build_book(
        &fetcher,
        &config,
        &book.identifier,
        PipelineOptions {
            fetch_bodies: !args.skip_bodies,
        },
    );

    tracing::info!(out = %out_dir.display(), "build: write");
    crate::store::write_book(&resolved, &out_dir).context("write book")?;

    Ok(())
}

/// Parse a saved index page offline: stubs as JSON lines, then the classification.
pub fn catalog(args: CatalogArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    config.validate().context("validate config")?;

    let html = std::fs::read_to_string(&args.html)
        .with_context(|| format!("read catalog html: {}", args.html))?;
    let stubs = crate::catalog::parse_catalog_or_flat(&html, &config);
    let pattern = crate::classify::classify(stubs.iter().map(|stub| stub.identifier.as_str()));

    let mut out = String::new();
    for stub in &stubs {
        out.push_str(&serde_json::to_string(stub).context("serialize stub")?);
        out.push('\n');
    }
    out.push_str(&serde_json::to_string(&pattern).context("serialize pattern")?);
    out.push('\n');
    print!("{out}");

    Ok(())
}

fn load_config(path: Option<&str>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(Path::new(path)),
        None => Ok(EngineConfig::default()),
    }
}
