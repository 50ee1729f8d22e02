use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    let cli = catalogify::cli::Cli::parse();
    catalogify::logging::init(cli.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        catalogify::cli::Command::Build(args) => {
            catalogify::build::run(args).context("build")?;
        }
        catalogify::cli::Command::Catalog(args) => {
            catalogify::build::catalog(args).context("catalog")?;
        }
    }

    Ok(())
}
