//! Command-line arguments and logging setup

use clap::Parser;
use std::sync::Once;

/// Lazy expression engine over JSON ASTs
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "lazyeval", version, about)]
pub struct Cli {
    /// Evaluate the JSON AST stored in FILE
    #[arg(short, long)]
    pub file: Option<String>,

    /// Evaluate an inline JSON AST
    #[arg(short, long)]
    pub eval: Option<String>,

    /// Start an interactive session
    #[arg(short, long)]
    pub repl: bool,

    /// Pretty-print event JSON
    #[arg(short, long)]
    pub pretty: bool,
}

impl Cli {
    /// Arguments that evaluate `path`.
    pub fn with_file(path: impl Into<String>) -> Self {
        Cli {
            file: Some(path.into()),
            ..Cli::default()
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, e.g. `RUST_LOG=notebook=debug`.
/// Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
                .with(filter)
                .init();
        }
    });
}
