//! # Linelex - Grammar-driven syntax highlighting
//!
//! Command-line front end over the highlighting engine.
//!
//! ## Quick Start
//!
//! ```bash
//! # Classify every column of a file
//! cargo run -- highlight path/to/file.c
//!
//! # Show styled segments with an explicit grammar
//! cargo run -- highlight script --syntax Bash --mode segments
//!
//! # List available grammars
//! cargo run -- list
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linelex_core::{Config, Document};
use linelex_syntax::{LanguageQuery, Registry};

/// Linelex - a line-incremental syntax highlighter
#[derive(Parser, Debug)]
#[command(name = "linelex")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Extra grammar directory, searched before the configured ones
    #[arg(short, long = "grammar-dir", value_name = "DIR", global = true)]
    grammar_dirs: Vec<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Highlight a file and print the result line by line
    Highlight {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Grammar id or name; chosen from the file when omitted
        #[arg(short, long, value_name = "NAME")]
        syntax: Option<String>,

        #[arg(short, long, value_enum, default_value_t = Mode::TextTypes)]
        mode: Mode,
    },

    /// List available grammars
    List,

    /// Print the grammar id chosen for a file
    Choose {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Mime type hint
        #[arg(long, value_name = "TYPE")]
        mime: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One text-type character per column
    TextTypes,
    /// Styled segments with their attribute names
    Segments,
    /// Context stack and folding depth after each line
    States,
    /// Column ranges with their themed foreground color
    Formats,
}

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting Linelex v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };
    let mut search_paths = args.grammar_dirs.clone();
    search_paths.append(&mut config.syntax.search_paths);
    config.syntax.search_paths = search_paths;
    let registry = config.registry();

    match args.command {
        Command::Highlight { file, syntax, mode } => {
            let mut document = open_document(&file, syntax.as_deref(), &config, &registry)?;
            document.set_theme(config.theme()?);
            print_document(&document, mode)?;
        }
        Command::List => {
            let catalog = registry.catalog();
            for header in catalog.headers() {
                println!(
                    "{:<16} {:<24} {:<12} prio {:>3}{}  {}",
                    header.id,
                    header.name,
                    header.section,
                    header.priority,
                    if header.hidden { " hidden" } else { "" },
                    header.extensions.join(";"),
                );
            }
        }
        Command::Choose { file, mime } => {
            let first_line = first_line(&file);
            let query = LanguageQuery {
                mime_type: mime.as_deref(),
                file_path: Some(&file),
                first_line: first_line.as_deref(),
                ..Default::default()
            };
            match registry.choose_language(&query) {
                Some(id) => println!("{}", id),
                None => println!("none"),
            }
        }
    }

    Ok(())
}

fn open_document(
    file: &Path,
    syntax: Option<&str>,
    config: &Config,
    registry: &Registry,
) -> anyhow::Result<Document> {
    if let Some(name) = syntax {
        let language = registry.load_by_name(name)?;
        let text = std::fs::read_to_string(file)?;
        return Ok(Document::from_str(&text, Some(language)));
    }

    let mut document = Document::open(file, registry)?;
    if document.language().is_none() {
        if let Some(fallback) = &config.syntax.default_grammar {
            tracing::info!("Falling back to grammar '{}'", fallback);
            document.set_language(Some(registry.load_by_name(fallback)?));
        }
    }
    Ok(document)
}

fn print_document(document: &Document, mode: Mode) -> anyhow::Result<()> {
    for line in 0..document.len_lines() {
        match mode {
            Mode::TextTypes => {
                let types = document
                    .line_state(line)?
                    .map(|state| state.text_types().to_string())
                    .unwrap_or_default();
                println!("{:>5} |{}|", line + 1, types);
            }
            Mode::Segments => {
                let text: Vec<char> = document.line(line)?.chars().collect();
                let segments: Vec<String> = document
                    .segments(line)?
                    .iter()
                    .map(|segment| {
                        let fragment: String =
                            text[segment.start..segment.start + segment.len].iter().collect();
                        format!("[{}:{:?}]", segment.style.name(), fragment)
                    })
                    .collect();
                println!("{:>5} {}", line + 1, segments.join(" "));
            }
            Mode::States => {
                let state = document.line_state(line)?;
                let names = state
                    .map(|state| state.stack().context_names().join(" > "))
                    .unwrap_or_default();
                let depth = state.map(|state| state.folding_depth()).unwrap_or(0);
                println!("{:>5} fold {:>2}  {}", line + 1, depth, names);
            }
            Mode::Formats => {
                let formats: Vec<String> = document
                    .formats(line)?
                    .into_iter()
                    .map(|(range, format)| {
                        let color = format
                            .foreground
                            .map(|color| color.to_hex())
                            .unwrap_or_else(|| "-".to_string());
                        let mut flags = String::new();
                        if format.bold {
                            flags.push('b');
                        }
                        if format.italic {
                            flags.push('i');
                        }
                        format!("{}..{} {}{}", range.start, range.end, color, flags)
                    })
                    .collect();
                println!("{:>5} {}", line + 1, formats.join(", "));
            }
        }
    }
    Ok(())
}

fn first_line(file: &Path) -> Option<String> {
    let text = std::fs::read_to_string(file).ok()?;
    text.lines().next().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["linelex", "list"]);
        assert!(matches!(args.command, Command::List));
        assert!(args.grammar_dirs.is_empty());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_args_highlight() {
        let args = Args::parse_from([
            "linelex",
            "-vv",
            "highlight",
            "test.c",
            "--mode",
            "segments",
            "--grammar-dir",
            "/tmp/grammars",
        ]);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.grammar_dirs, vec![PathBuf::from("/tmp/grammars")]);
        match args.command {
            Command::Highlight { file, syntax, mode } => {
                assert_eq!(file, PathBuf::from("test.c"));
                assert!(syntax.is_none());
                assert_eq!(mode, Mode::Segments);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_args_choose_with_mime() {
        let args = Args::parse_from(["linelex", "choose", "script", "--mime", "text/x-sh"]);
        match args.command {
            Command::Choose { file, mime } => {
                assert_eq!(file, PathBuf::from("script"));
                assert_eq!(mime.as_deref(), Some("text/x-sh"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
