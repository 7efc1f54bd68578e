//! Command line front end: load a document, run a selector, print the
//! matches.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use url::Url;

use quarry::{Dom, LoadOptions, Selection};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// quarry -- query HTML and XML documents with CSS selectors.
#[derive(Parser, Debug)]
#[command(name = "quarry", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input file (use `-` for stdin).
    file: String,

    /// CSS selector; without one the whole document is printed.
    selector: Option<String>,

    /// Log parsing and selection details to stderr.
    #[arg(long, short)]
    verbose: bool,

    // -- Loading options ---------------------------------------------------
    /// Parse and render with XML rules.
    #[arg(long)]
    xml: bool,

    /// Parse as a fragment, without the implied html/head/body.
    #[arg(long)]
    fragment: bool,

    /// Base URI for resolving `href` and `src`.
    #[arg(long, value_name = "URL")]
    base_uri: Option<Url>,

    /// Encoding of the input, overriding BOM and in-document declarations.
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    // -- Output modes ------------------------------------------------------
    /// Print the outer HTML of each match (default).
    #[arg(long, conflicts_with_all = ["text", "attr", "count"])]
    html: bool,

    /// Print the text of each match.
    #[arg(long, conflicts_with_all = ["attr", "count"])]
    text: bool,

    /// Print an attribute of each match.
    #[arg(long, value_name = "NAME", conflicts_with = "count")]
    attr: Option<String>,

    /// Print the number of matches.
    #[arg(long)]
    count: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_FAILURE: u8 = 1;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let bytes = match read_input(&cli.file) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{}: failed to read: {e}", cli.file);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let dom = match Dom::load_bytes(&bytes, load_options(&cli)) {
        Ok(dom) => dom,
        Err(e) => {
            eprintln!("{}: {e}", cli.file);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let matches = match &cli.selector {
        Some(selector) => match dom.select(selector) {
            Ok(matches) => matches,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::from(EXIT_FAILURE);
            }
        },
        None => dom.root(),
    };
    tracing::debug!(matches = matches.len(), "selector evaluated");

    let output = render_matches(&cli, &matches);
    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(output.as_bytes()) {
        eprintln!("failed to write output: {e}");
        return ExitCode::from(EXIT_FAILURE);
    }
    ExitCode::from(EXIT_SUCCESS)
}

/// Installs a stderr subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "quarry=debug" } else { "quarry=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_options(cli: &Cli) -> LoadOptions {
    let mut options = LoadOptions::default()
        .xml(cli.xml)
        .document(!cli.fragment);
    if let Some(base) = &cli.base_uri {
        options = options.base_uri(base.clone());
    }
    if let Some(label) = &cli.encoding {
        options = options.encoding(label.as_str());
    }
    options
}

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

/// Reads input from a file or stdin (when filename is `-`).
fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}

/// One line per match, or the match count.
fn render_matches(cli: &Cli, matches: &Selection) -> String {
    if cli.count {
        return format!("{}\n", matches.len());
    }
    let mut out = String::new();
    for item in matches.iter() {
        let line = if let Some(name) = &cli.attr {
            match item.attr(name) {
                Some(value) => value,
                None => continue,
            }
        } else if cli.text {
            item.text()
        } else {
            item.to_string()
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}
