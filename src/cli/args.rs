//! CLI argument definitions.

use crate::cli::validators::{parse_batch_size, parse_top_k_arg};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Plant species identification server.
#[derive(Debug, Parser)]
#[command(name = "plantid")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run (default: serve).
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Options for the server.
    #[command(flatten)]
    pub serve: ServeArgs,

    /// Path to the configuration file (default: platform config dir).
    #[arg(long, global = true, env = "PLANTID_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase verbosity (-v: debug, -vv: trace+ORT info, -vvv: full trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the model and serve HTTP requests.
    Serve,
    /// Manage configuration.
    Config {
        /// Configuration action to perform.
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Check a label file and print its dense class-index form.
    Labels {
        /// Label JSON file (class id -> species name).
        input: PathBuf,
        /// Write the dense map here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Config subcommand actions.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Create default configuration file.
    Init,
    /// Display current configuration.
    Show,
    /// Print configuration file path.
    Path,
}

/// Arguments for the server.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Bind address.
    #[arg(long, global = true, env = "PLANTID_HOST")]
    pub host: Option<String>,

    /// Listening port.
    #[arg(short, long, global = true, env = "PORT")]
    pub port: Option<u16>,

    /// Path to ONNX model file.
    #[arg(short, long, global = true, env = "PLANTID_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Path to label JSON file.
    #[arg(short, long, global = true, env = "PLANTID_LABELS_PATH")]
    pub labels_path: Option<PathBuf>,

    /// Path to model manifest JSON.
    #[arg(long, global = true, env = "PLANTID_MANIFEST_PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Write the dense label map here at startup.
    #[arg(long, global = true)]
    pub dense_labels_output: Option<PathBuf>,

    /// Default number of predictions per image.
    #[arg(short = 'k', long, global = true, value_parser = parse_top_k_arg, env = "PLANTID_TOP_K")]
    pub top_k: Option<usize>,

    /// Maximum images per forward pass.
    #[arg(short, long, global = true, value_parser = parse_batch_size, env = "PLANTID_BATCH_SIZE")]
    pub batch_size: Option<usize>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args_serves() {
        let cli = Cli::try_parse_from(["plantid"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_parse_with_options() {
        let cli = Cli::try_parse_from([
            "plantid",
            "--port",
            "9000",
            "-m",
            "plants.onnx",
            "-k",
            "3",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.serve.port, Some(9000));
        assert_eq!(cli.serve.model_path, Some(PathBuf::from("plants.onnx")));
        assert_eq!(cli.serve.top_k, Some(3));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_parse_serve_subcommand_options() {
        let cli = Cli::try_parse_from(["plantid", "serve", "--port", "8123"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Serve)));
        assert_eq!(cli.serve.port, Some(8123));
    }

    #[test]
    fn test_cli_rejects_zero_top_k() {
        assert!(Cli::try_parse_from(["plantid", "--top-k", "0"]).is_err());
        assert!(Cli::try_parse_from(["plantid", "--top-k=-2"]).is_err());
    }

    #[test]
    fn test_cli_parse_config_subcommand() {
        let cli = Cli::try_parse_from(["plantid", "config", "show"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Show
            })
        ));
    }

    #[test]
    fn test_cli_parse_labels_subcommand() {
        let cli = Cli::try_parse_from(["plantid", "labels", "in.json", "-o", "out.json"]).unwrap();
        match cli.command {
            Some(Command::Labels { input, output }) => {
                assert_eq!(input, PathBuf::from("in.json"));
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
