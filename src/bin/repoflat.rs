//! repoflat CLI - Flatten a git repository into one text file for LLMs.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use repoflat::builder::Flattener;
use repoflat::errors::{exit_code, RepoflatError};
use repoflat::fetch::GitCli;
use repoflat::output::{format_summary, output_file_name, write_document, OutputFormat, Summary};
use repoflat::tokens::{count_tokens_with_encoding, Encoding};
use repoflat::walker::DEFAULT_MAX_LINES;
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "repoflat")]
#[command(about = "Flatten a git repository into a single token-annotated text file")]
#[command(version)]
struct Cli {
    /// Git repository URL (HTTPS or SSH)
    url: String,

    /// Additional patterns to exclude
    #[arg(long, num_args = 1.., value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Collapse whitespace in code files (documentation is left as is)
    #[arg(long)]
    minify: bool,

    /// Maximum number of lines per file
    #[arg(long, default_value_t = DEFAULT_MAX_LINES)]
    max_lines: usize,

    /// Token encoding for size estimates
    #[arg(long, default_value = "cl100k")]
    encoding: EncodingArg,

    /// Write to this path instead of <repository-slug>.txt
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the summary (and errors) as JSON
    #[arg(long)]
    json: bool,

    /// Log every traversal decision and list included/excluded files
    #[arg(
        short,
        long,
        env = "DEBUG",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    verbose: bool,
}

#[derive(Clone, ValueEnum)]
enum EncodingArg {
    Cl100k,
    O200k,
    P50k,
    R50k,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Cl100k => Encoding::Cl100kBase,
            EncodingArg::O200k => Encoding::O200kBase,
            EncodingArg::P50k => Encoding::P50kBase,
            EncodingArg::R50k => Encoding::R50kBase,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let result = run(&cli).and_then(|summary| {
        let rendered = format_summary(&summary, format, cli.verbose)?;
        Ok(rendered)
    });

    match result {
        Ok(rendered) => print!("{}", ensure_newline(rendered)),
        Err(e) => {
            tracing::debug!(error = ?e, "Run failed");
            if cli.json {
                #[derive(Serialize)]
                struct ErrorOutput {
                    error: String,
                }

                let payload = ErrorOutput {
                    error: e.to_string(),
                };

                let json = serde_json::to_string(&payload)
                    .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
                eprintln!("{json}");
            } else {
                eprintln!("error: {}", e);
            }
            std::process::exit(exit_code(&e));
        }
    }
}

/// RUST_LOG always takes precedence; otherwise DEBUG when verbose, WARN if not.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { Level::DEBUG } else { Level::WARN };
        EnvFilter::default().add_directive(level.into())
    });
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn run(cli: &Cli) -> Result<Summary, RepoflatError> {
    let encoding: Encoding = cli.encoding.clone().into();

    let flattened = Flattener::new()
        .exclude(cli.exclude.iter().cloned())
        .minify(cli.minify)
        .max_lines(cli.max_lines)
        .encoding(encoding)
        .flatten_repository(&cli.url, &GitCli::new())?;

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(output_file_name(&cli.url)));

    let bytes = write_document(&output, &flattened.document)?;
    let tokens = count_tokens_with_encoding(&flattened.document, encoding);

    Ok(Summary::new(output, bytes, tokens, &flattened))
}

fn ensure_newline(mut s: String) -> String {
    if !s.ends_with('\n') {
        s.push('\n');
    }
    s
}
