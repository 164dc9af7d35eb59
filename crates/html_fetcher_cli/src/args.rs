use std::path::PathBuf;

use clap::Parser;
use html_fetcher::TransportKind;

/// Fetch a URL over HTTP/1.1 and print its HTML body.
///
/// Redirects are followed only while the redirect budget lasts. Anything that
/// is not a 200 `text/html` response ends with exit code 1.
#[derive(Parser, Debug)]
#[command(name = "html-fetch", version)]
pub struct Args {
    /// URL to fetch.
    #[arg(required_unless_present = "print_config")]
    pub url: Option<String>,

    /// Number of redirects that may be followed (default 0).
    #[arg(short, long, value_name = "N")]
    pub redirects: Option<u32>,

    /// RON file with fetch settings; flags given here take precedence.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Transport to use: `socket` (plain http only) or `reqwest`.
    #[arg(short, long, value_name = "KIND")]
    pub transport: Option<TransportKind>,

    /// Also write the log to this file.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Do not log to the terminal.
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the effective configuration as RON and exit.
    #[arg(long)]
    pub print_config: bool,
}
