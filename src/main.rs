//! Snippet Press CLI
//!
//! Usage:
//!   snippet-press [OPTIONS] <FILES>...
//!
//! Options:
//!   -l, --list             List imported snippets and groups
//!   -s, --snippet <KEY>    Snippet to produce
//!   -d, --data <FILE>      Production data (JSON object)
//!   -c, --config <FILE>    Engine configuration (TOML format)
//!   -v, --verbose          More log output (repeatable)
//!   -q, --quiet            Only log errors
//!   -h, --help             Print help

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{info, Level};

use snippet_press::{
    Data, EngineConfig, ProduceError, ResourceHost, ResourceRef, SnippetEngine, SnippetError,
};

#[derive(Parser)]
#[command(name = "snippet-press")]
#[command(about = "Produce XML output from snippet documents")]
struct Cli {
    /// Snippet documents, imported in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// List imported snippets and groups
    #[arg(short, long)]
    list: bool,

    /// Key of the snippet to produce, e.g. /menu/item
    #[arg(short, long)]
    snippet: Option<String>,

    /// Production data as a JSON object
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Engine configuration (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// Logs resources; a command-line run has no document to include them in
struct LogHost;

impl ResourceHost for LogHost {
    fn report_resource(&mut self, resource: &ResourceRef) {
        info!(kind = %resource.kind, path = %resource.path, "resource referenced");
    }
}

fn main() {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, _) => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    let data = match &cli.data {
        Some(path) => match read_data(path) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("Error reading data '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Data::new(),
    };

    let mut engine = SnippetEngine::with_config(config);
    for path in &cli.files {
        let text = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        };
        let source = path.to_string_lossy();
        if let Err(e) = engine.import_str(&source, &text, &mut LogHost) {
            eprintln!("Error: {}", SnippetError::from(e));
            std::process::exit(1);
        }
    }

    if cli.list {
        print_listing(&engine);
    }

    if let Some(key) = &cli.snippet {
        match engine.produce(key.as_str(), &data) {
            Ok(output) => println!("{}", output.to_xml()),
            Err(ProduceError::Expression(e)) => {
                eprint!("{}", e.format_colored(key));
                std::process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: {}", SnippetError::from(e));
                std::process::exit(1);
            }
        }
    } else if !cli.list {
        eprintln!("Nothing to do: pass --snippet <KEY> or --list");
        std::process::exit(2);
    }
}

fn read_data(path: &Path) -> Result<Data, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let json: serde_json::Value = serde_json::from_str(&content).map_err(|e| e.to_string())?;
    match json {
        serde_json::Value::Object(map) => Ok(Data::from(map)),
        other => Err(format!("expected a JSON object, found {}", json_kind(&other))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn print_listing(engine: &SnippetEngine) {
    for key in engine.list_snippets("/", false) {
        println!("{}", key);
    }
    for group in engine.list_groups("/", true) {
        println!("{}", group);
        for key in engine.list_snippets(&group, false) {
            println!("  {}", key);
        }
    }
}
