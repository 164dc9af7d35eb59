//! `html-fetch`: prints the HTML found at a URL, following up to N redirects.
mod args;
mod config;
mod logging;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use fetch_logging::{fetch_debug, fetch_info};
use html_fetcher::HtmlFetcher;

use crate::args::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let resolved = config::resolve(&args)?;
    let config = &resolved.config;

    if args.print_config {
        println!("{}", config.to_ron()?);
        return Ok(ExitCode::SUCCESS);
    }

    logging::initialize(
        logging::destination(args.log_file.clone(), args.quiet),
        config.log_level(),
    );
    resolved.log_source();

    let url = args.url.context("a URL is required")?;
    let settings = config.to_settings()?;
    fetch_debug!("effective settings: {settings:?}");

    let fetcher = HtmlFetcher::from_settings(&settings)
        .with_context(|| format!("building {} transport", settings.transport))?;
    fetch_info!("fetching {url} with up to {} redirects", config.redirects);

    match fetcher.fetch(&url, config.redirects) {
        Some(html) => {
            println!("{html}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("unable to fetch HTML from {url}");
            Ok(ExitCode::FAILURE)
        }
    }
}
