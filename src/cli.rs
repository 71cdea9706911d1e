//! Command-line interface definition using clap.
//!
//! [`Args`] holds the raw flags; [`Args::to_config`] layers them over the
//! config file (if any) and the built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::config::PipelineConfig;
use crate::error::Result;

/// Chart the mood and topics of a Telegram chat export.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatmood")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    chatmood ChatExport/messages.html
    chatmood ChatExport/ -o results/sentiment.csv --chart-dir results/charts
    chatmood ChatExport/ --topics Politics,Economy,Sports
    chatmood ChatExport/ --sentiment-model-dir ./models/sentiment --topic-model-dir ./models/nli
    chatmood ChatExport/ --extract-only -o messages.csv")]
pub struct Args {
    /// Export pages (messages.html, messages2.html, ...) or export directories
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// TOML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path of the CSV export
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for chart files
    #[arg(long, value_name = "DIR")]
    pub chart_dir: Option<PathBuf>,

    /// Candidate topics, comma separated
    #[arg(long, value_delimiter = ',', value_name = "TOPICS")]
    pub topics: Option<Vec<String>>,

    /// Hugging Face id of the sentiment model
    #[arg(long, value_name = "ID")]
    pub sentiment_model: Option<String>,

    /// Hugging Face id of the zero-shot topic model
    #[arg(long, value_name = "ID")]
    pub topic_model: Option<String>,

    /// Load the sentiment model from a local directory instead of the hub
    #[arg(long, value_name = "DIR")]
    pub sentiment_model_dir: Option<PathBuf>,

    /// Load the topic model from a local directory instead of the hub
    #[arg(long, value_name = "DIR")]
    pub topic_model_dir: Option<PathBuf>,

    /// Only extract messages and write the CSV; no models are loaded
    #[arg(long)]
    pub extract_only: bool,
}

impl Args {
    /// Builds the effective configuration: defaults, then the config file,
    /// then command-line flags.
    pub fn to_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(topics) = &self.topics {
            config.topics = topics
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }
        if let Some(output) = &self.output {
            config.output.export_path.clone_from(output);
        }
        if let Some(dir) = &self.chart_dir {
            config.output.chart_dir.clone_from(dir);
        }
        if let Some(model) = &self.sentiment_model {
            config.classifier.sentiment_model.clone_from(model);
        }
        if let Some(model) = &self.topic_model {
            config.classifier.topic_model.clone_from(model);
        }
        if let Some(dir) = &self.sentiment_model_dir {
            config.classifier.sentiment_model_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.topic_model_dir {
            config.classifier.topic_model_dir = Some(dir.clone());
        }

        config.validate()?;
        Ok(config)
    }
}
