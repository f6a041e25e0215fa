//! # Stagewise
//!
//! The command-line binary for the Stagewise progress classifier.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │          apps/stagewise (THE BINARY)          │
//! │                                               │
//! │   ┌─────────────┐        ┌────────────────┐   │
//! │   │    CLI      │        │    Config      │   │
//! │   │   (clap)    │        │ (toml + env)   │   │
//! │   └──────┬──────┘        └───────┬────────┘   │
//! │          └───────────┬───────────┘            │
//! │                      ▼                        │
//! │             ┌────────────────┐                │
//! │             │ stagewise-core │                │
//! │             │  (THE LOGIC)   │                │
//! │             └────────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! stagewise classify -f save.json
//! stagewise compare --local local.json --cloud cloud.json
//! stagewise export -o table.bin -t binary
//! ```

use clap::Parser;
use stagewise::cli;
use stagewise::config::{Config, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = cli::Cli::parse();

    // Config decides the log format, so it loads before tracing exists.
    let loaded = Config::load(cli.config.as_deref()).and_then(Config::with_env_overrides);
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };

    init_tracing(&config, cli.verbose);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli, &config) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &Config, verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.filter_directive(verbose).into());

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Print the Stagewise startup banner.
fn print_banner() {
    println!(
        r#"
  ┌─┐┌┬┐┌─┐┌─┐┌─┐┬ ┬┬┌─┐┌─┐
  └─┐ │ ├─┤│ ┬├┤ ││││└─┐├┤
  └─┘ ┴ ┴ ┴└─┘└─┘└┴┘┴└─┘└─┘

  Progress Stage Classifier v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
