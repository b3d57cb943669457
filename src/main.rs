//! Greengrocer CLI

use std::{
    env,
    io::{self, Write},
    process::ExitCode,
};

use tracing::error;
use tracing_subscriber::EnvFilter;

use greengrocer::{
    catalog::{PriceListEntry, PriceSource, write_price_list},
    settings::{Command, OutputFormat, Settings, unicode_vars},
};

fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(error) => error.exit(),
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_level)),
        )
        .init();

    if let Err(error) = run(&settings) {
        error!("{error:#}");

        #[expect(
            clippy::print_stderr,
            reason = "the error must reach the user even when logging is filtered out"
        )]
        {
            eprintln!("Error: {error:#}");
        }

        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(settings: &Settings) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &settings.command {
        Command::Items => {
            let catalog = settings.build_catalog(unicode_vars(env::vars_os()))?;

            let entries: Vec<PriceListEntry> = catalog
                .price_list()?
                .into_iter()
                .map(PriceListEntry::from)
                .collect();

            match settings.format {
                OutputFormat::Table => write_price_list(&mut out, &entries)?,
                OutputFormat::Json => {
                    writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
                }
            }
        }
        Command::Checkout(args) => {
            let basket = args.basket_request()?.resolve()?;
            let engine = settings.build_engine(unicode_vars(env::vars_os()))?;
            let receipt = engine.checkout(&basket)?;

            match settings.format {
                OutputFormat::Table => receipt.write_to(&mut out)?,
                OutputFormat::Json => writeln!(out, "{}", receipt.to_json()?)?,
            }
        }
    }

    Ok(())
}
