//! plantid - plant species identification server.
//!
//! Accepts uploaded plant photos over HTTP and returns ranked species
//! predictions from a locally loaded ONNX image classifier.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod inference;
pub mod labels;
pub mod output;
pub mod pipeline;
pub mod preprocess;
pub mod server;

use clap::Parser;
use cli::{Cli, Command, ConfigAction, ServeArgs};
use config::{Config, ConfigLocation, load_config, save_config, validate_config};
use inference::OnnxOptions;
use labels::LabelMap;
use pipeline::BatchOptions;
use server::{AppState, ModelSettings};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub use error::{Error, Result};

/// Main entry point for the plantid CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        None | Some(Command::Serve) => {
            let config = load_config(cli.config.as_deref())?;
            serve(&cli.serve, config)
        }
        Some(Command::Config { action }) => handle_config_command(action, cli.config.as_deref()),
        Some(Command::Labels { input, output }) => handle_labels_command(&input, output.as_deref()),
    }
}

/// Resolved settings for one server run: config file values overridden by
/// CLI flags and environment.
#[derive(Debug, Clone)]
struct ServeSettings {
    addr: String,
    body_limit_bytes: usize,
    model: ModelSettings,
    defaults: BatchOptions,
}

fn resolve_settings(args: &ServeArgs, mut config: Config) -> Result<ServeSettings> {
    if let Some(top_k) = args.top_k {
        config.inference.top_k = top_k;
    }
    if let Some(batch_size) = args.batch_size {
        config.inference.batch_size = batch_size;
    }
    validate_config(&config)?;

    let host = args.host.clone().unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);

    let positive = |value: usize, name: &str| {
        NonZeroUsize::new(value).ok_or_else(|| Error::ConfigValidation {
            message: format!("{name} must be at least 1"),
        })
    };

    Ok(ServeSettings {
        addr: format!("{host}:{port}"),
        body_limit_bytes: config.server.body_limit_bytes,
        model: ModelSettings {
            model_path: args.model_path.clone().unwrap_or(config.model.path),
            labels_path: args.labels_path.clone().unwrap_or(config.model.labels),
            manifest_path: args.manifest_path.clone().or(config.model.manifest),
            dense_labels_output: args
                .dense_labels_output
                .clone()
                .or(config.model.dense_labels_output),
            onnx: OnnxOptions {
                intra_threads: config.inference.intra_threads,
            },
        },
        defaults: BatchOptions {
            top_k: positive(config.inference.top_k, "top_k")?,
            batch_size: positive(config.inference.batch_size, "batch_size")?,
        },
    })
}

/// Load the model, then serve until interrupted.
fn serve(args: &ServeArgs, config: Config) -> Result<()> {
    let settings = resolve_settings(args, config)?;

    info!("Loading model: {}", settings.model.model_path.display());
    let state = Arc::new(AppState::load(&settings.model, settings.defaults));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal {
            message: format!("Failed to create async runtime: {e}"),
        })?;

    runtime.block_on(server::serve(
        state,
        &settings.addr,
        settings.body_limit_bytes,
    ))
}

fn init_logging(verbose: u8, quiet: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // ORT logging is suppressed by default; raise verbosity to see it.
    let filter_str = if quiet {
        "warn,ort=off"
    } else {
        match verbose {
            0 => "info,ort=off",
            1 => "debug,ort=warn",
            2 => "trace,ort=info",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_str));

    // Logs go to stderr so `labels` and `config show` output stays parseable.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_config_command(action: ConfigAction, explicit: Option<&Path>) -> Result<()> {
    let location = ConfigLocation::resolve(explicit)?;
    let path = location.path();

    match action {
        ConfigAction::Init => {
            if path.exists() {
                println!("Configuration file already exists: {}", path.display());
            } else {
                save_config(&Config::default(), path)?;
                println!("Created configuration file: {}", path.display());
            }
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(explicit)?;
            println!("{config:#?}");
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn handle_labels_command(input: &Path, output: Option<&Path>) -> Result<()> {
    let labels = LabelMap::load(input)?;

    match output {
        Some(path) => {
            labels.write_dense(path)?;
            println!("Wrote {} classes to {}", labels.len(), path.display());
        }
        None => println!("{}", labels.to_dense_json()),
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(cli: &[&str]) -> ServeArgs {
        let mut full = vec!["plantid"];
        full.extend_from_slice(cli);
        Cli::try_parse_from(full).unwrap().serve
    }

    #[test]
    fn test_resolve_uses_config_defaults() {
        let mut config = Config::default();
        config.server.port = 9001;
        config.model.path = PathBuf::from("/models/plants.onnx");

        let settings = resolve_settings(&args(&["--host", "127.0.0.1"]), config).unwrap();

        assert!(settings.addr.starts_with("127.0.0.1:"));
        assert_eq!(settings.model.model_path, Path::new("/models/plants.onnx"));
        assert_eq!(settings.defaults.batch_size.get(), 8);
    }

    #[test]
    fn test_resolve_cli_overrides_config() {
        let mut config = Config::default();
        config.inference.top_k = 9;

        let settings = resolve_settings(
            &args(&["--port", "7000", "-k", "2", "--labels-path", "l.json"]),
            config,
        )
        .unwrap();

        assert!(settings.addr.ends_with(":7000"));
        assert_eq!(settings.defaults.top_k.get(), 2);
        assert_eq!(settings.model.labels_path, Path::new("l.json"));
    }

    #[test]
    fn test_resolve_rejects_invalid_config() {
        let mut config = Config::default();
        config.inference.top_k = 0;
        let result = resolve_settings(&args(&[]), config);
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }
}
