//! sstc — compile a story script into a playable artifact.
//!
//! ```bash
//! sstc story.sst                    # writes story.json
//! sstc story.sst -o out.yaml --format yaml
//! sstc story.sst --tokens           # dump the token stream
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use sstc::config::{self, CompilerConfig, OutputFormat};
use sstc::dsl::lexer::Lexer;
use sstc::dsl::{CompileError, Story};

/// Compile a visual-novel story script into a JSON or YAML artifact.
#[derive(Parser, Debug)]
#[command(name = "sstc", version, about)]
struct Args {
    /// Story source file.
    input: PathBuf,

    /// Artifact path [default: story.json, or story.yaml with --format yaml].
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Artifact format (overrides the config file).
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Config file [default: ~/.sstc/config.yaml].
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the token stream and exit without compiling.
    #[arg(long)]
    tokens: bool,

    /// More logging on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(args.verbose))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(&args) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

/// `RUST_LOG` wins over `-v`.
fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "sstc=warn",
        1 => "sstc=info",
        _ => "sstc=debug",
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    if args.tokens {
        return dump_tokens(&args.input);
    }

    let mut config = match &args.config {
        Some(path) => config::load_config_from(path)
            .map_err(|e| format!("cannot load config '{}': {e}", path.display()))?,
        None => config::load_config(),
    };
    if let Some(format) = args.format {
        config.format = format;
    }

    let story = config.compiler().compile_file(&args.input)?;
    let rendered = render(&story, &config)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(config.format.default_output()));
    std::fs::write(&output, rendered)
        .map_err(|e| format!("cannot write '{}': {e}", output.display()))?;

    tracing::info!(output = %output.display(), "wrote artifact");
    println!("{}", output.display());
    Ok(())
}

fn render(story: &Story, config: &CompilerConfig) -> Result<String, Box<dyn Error>> {
    let text = match config.format {
        OutputFormat::Json => story.to_json(config.pretty)?,
        OutputFormat::Yaml => story.to_yaml()?,
    };
    Ok(text)
}

/// One token per line: `line:col KIND lexeme`.
fn dump_tokens(input: &Path) -> Result<(), Box<dyn Error>> {
    let mut lexer = Lexer::open(input)?;
    for token in lexer.tokenize() {
        println!("{}:{} {} {}", token.line, token.col, token.kind, token.lexeme);
    }
    if let Some(e) = lexer.take_io_error() {
        return Err(CompileError::io(format!("failed to read source: {e}")).into());
    }
    Ok(())
}
