use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Build(BuildArgs),
    Catalog(CatalogArgs),
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Book id (e.g. `DZ0336`) or any URL under `/book/<id>`.
    #[arg(long)]
    pub book: String,

    /// Output directory (must not exist).
    #[arg(long)]
    pub out: String,

    /// YAML engine config.
    #[arg(long)]
    pub config: Option<String>,

    /// Content source origin (default: from the book URL, the config, or the built-in site).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Delay between requests (politeness).
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Only resolve the chapter list; do not fetch chapter bodies.
    #[arg(long, default_value_t = false)]
    pub skip_bodies: bool,
}

#[derive(Debug, Args)]
pub struct CatalogArgs {
    /// Saved book index page.
    #[arg(long)]
    pub html: String,

    /// YAML engine config.
    #[arg(long)]
    pub config: Option<String>,

    /// Origin used to resolve relative chapter links.
    #[arg(long)]
    pub base_url: Option<String>,
}
