//! Waste Manager - command-line entry point
//!
//! Streams items from stdin through the pipeline using the built-in prefix
//! classifier and template transformer.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use waste_manager::config::{PipelineConfig, TransformerSection};
use waste_manager::observability::init_default_logging;
use waste_manager::rules::{PrefixClassifier, TemplateTransformer, ITEM_PLACEHOLDER};
use waste_manager::{PipelineError, PipelineResult, WasteManager};

/// Order-preserving classify-and-transform pipeline
#[derive(Parser)]
#[command(name = "waste-manager")]
#[command(about = "Classify items as recyclable or waste and transform them in order")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "WASTE_MANAGER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read items from stdin, one per line, and print both output streams
    ///
    /// `:prefix <text>` replaces the classifier's waste prefix and
    /// `:template <text>` replaces the transformer template for every
    /// following line.
    Run {
        /// Print a JSON metrics snapshot to stderr when input ends
        #[arg(long)]
        stats: bool,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

/// One line of `run` input
#[derive(Debug, PartialEq, Eq)]
enum Directive {
    Item(String),
    SetPrefix(String),
    SetTemplate(String),
    Rejected(&'static str),
    Skip,
}

fn parse_directive(line: &str) -> Directive {
    if let Some(prefix) = line.strip_prefix(":prefix ") {
        if prefix.is_empty() {
            return Directive::Rejected("waste prefix must not be empty");
        }
        return Directive::SetPrefix(prefix.to_string());
    }
    if let Some(template) = line.strip_prefix(":template ") {
        if !template.contains(ITEM_PLACEHOLDER) {
            return Directive::Rejected("template must contain {item}");
        }
        return Directive::SetTemplate(template.to_string());
    }
    if line.is_empty() {
        return Directive::Skip;
    }
    Directive::Item(line.to_string())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting waste-manager v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run { stats } => run_pipeline(config, stats).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn load_configuration(config_path: &Option<PathBuf>) -> PipelineResult<PipelineConfig> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(PipelineConfig::load_from_file(path)?)
        }
        None => {
            let default_paths = ["waste-manager.toml", "config/waste-manager.toml"];

            for path_str in default_paths {
                let path = PathBuf::from(path_str);
                if path.exists() {
                    info!("Loading configuration from: {}", path.display());
                    return Ok(PipelineConfig::load_from_file(&path)?);
                }
            }

            info!("No configuration file found, using built-in defaults");
            Ok(PipelineConfig::default())
        }
    }
}

async fn run_pipeline(config: PipelineConfig, stats: bool) -> Result<(), Box<dyn std::error::Error>> {
    let manager = WasteManager::new(
        PrefixClassifier::from(&config.classifier),
        TemplateTransformer::from(&config.transformer),
    );
    info!(
        pipeline = %config.pipeline.name,
        pipeline_id = %manager.id(),
        "Pipeline running, reading items from stdin"
    );

    let metrics = manager.metrics().clone();
    let (intake, outputs, waste) = manager.into_parts();

    let output_printer = tokio::spawn(async move {
        loop {
            match outputs.next().await {
                Ok(output) => println!("output {output}"),
                Err(PipelineError::Closed) => break,
                Err(PipelineError::TransformFailed { sequence, source }) => {
                    println!("failed {sequence} {source}")
                }
                Err(e) => println!("failed {e}"),
            }
        }
    });
    let waste_printer = tokio::spawn(async move {
        while let Ok(value) = waste.next().await {
            println!("waste {value}");
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_directive(&line) {
            Directive::Item(item) => intake.submit(item)?,
            Directive::SetPrefix(prefix) => {
                intake.set_classifier(PrefixClassifier::new(prefix)).await?;
            }
            Directive::SetTemplate(template) => {
                let section = TransformerSection {
                    template,
                    ..config.transformer.clone()
                };
                intake
                    .set_transformer(TemplateTransformer::from(&section))
                    .await?;
            }
            Directive::Rejected(reason) => {
                warn!(line = %line, reason, "Ignoring directive");
            }
            Directive::Skip => {}
        }
    }

    // End of input: both streams drain and then close.
    drop(intake);
    output_printer.await?;
    waste_printer.await?;

    if stats {
        eprintln!("{}", serde_json::to_string_pretty(&metrics.snapshot())?);
    }

    info!("Input exhausted, all items delivered");
    Ok(())
}

fn handle_config_command(
    config: PipelineConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item() {
        assert_eq!(
            parse_directive("scrap1"),
            Directive::Item("scrap1".to_string())
        );
    }

    #[test]
    fn test_parse_swaps() {
        assert_eq!(
            parse_directive(":prefix junk"),
            Directive::SetPrefix("junk".to_string())
        );
        assert_eq!(
            parse_directive(":template new {item}"),
            Directive::SetTemplate("new {item}".to_string())
        );
    }

    #[test]
    fn test_parse_blank_and_unknown_directive() {
        assert_eq!(parse_directive(""), Directive::Skip);
        assert_eq!(
            parse_directive(":other"),
            Directive::Item(":other".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_empty_prefix() {
        assert!(matches!(parse_directive(":prefix "), Directive::Rejected(_)));
    }

    #[test]
    fn test_parse_rejects_template_without_placeholder() {
        assert!(matches!(
            parse_directive(":template constant"),
            Directive::Rejected(_)
        ));
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let path = Some(PathBuf::from("/nonexistent/waste-manager.toml"));
        assert!(matches!(
            load_configuration(&path),
            Err(PipelineError::Config(waste_manager::ConfigError::FileRead(_)))
        ));
    }
}
