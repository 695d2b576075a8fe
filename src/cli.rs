use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::ml::ModelFormat;

#[derive(Parser)]
#[command(name = "obesity-predict")]
#[command(version)]
#[command(about = "Obesity level prediction service and survey client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (default.toml plus the OBESITY_ENV file)
    #[arg(short, long, global = true, default_value = "config")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the prediction API server (default)
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Bind port
        #[arg(short, long)]
        port: Option<u16>,

        /// Model artifact path
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Model format (xgboost, dense, onnx); detected from the file if omitted
        #[arg(short, long)]
        format: Option<ModelFormat>,

        /// Accept values outside the documented feature ranges
        #[arg(long)]
        no_range_check: bool,
    },
    /// Fill in the survey interactively and submit it
    Form {
        /// API base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Submit a JSON payload file
    Predict {
        /// Path to a JSON request body
        #[arg(short = 'P', long)]
        payload: PathBuf,

        /// API base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Submit the canned test cases
    TestCases {
        /// API base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from([
            "obesity-predict",
            "serve",
            "--port",
            "9000",
            "--format",
            "dense",
            "--no-range-check",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Serve {
                port,
                format,
                no_range_check,
                host,
                ..
            }) => {
                assert_eq!(port, Some(9000));
                assert_eq!(format, Some(ModelFormat::Dense));
                assert!(no_range_check);
                assert!(host.is_none());
            }
            _ => panic!("expected serve"),
        }
        assert_eq!(cli.config, PathBuf::from("config"));
    }

    #[test]
    fn no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["obesity-predict", "--config", "/etc/obesity"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("/etc/obesity"));
    }
}
