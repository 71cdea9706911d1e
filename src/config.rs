//! Configuration types for the pipeline stages.
//!
//! Every struct implements `Default`, builder-style `with_*` methods and
//! serde, so a full [`PipelineConfig`] can be loaded from TOML:
//!
//! ```toml
//! topics = ["Politics", "Economy", "Technology"]
//!
//! [classifier]
//! sentiment_model = "MonoHime/rubert-base-cased-sentiment-new"
//! max_tokens = 512
//!
//! [output]
//! chart_dir = "images"
//! export_path = "results/sentiment_results.csv"
//! ```
//!
//! # Example
//!
//! ```rust
//! use chatmood::config::{ClassifierConfig, PipelineConfig};
//!
//! let config = PipelineConfig::new()
//!     .with_topics(["Sports", "Weather"])
//!     .with_classifier(ClassifierConfig::new().with_max_tokens(256));
//!
//! assert_eq!(config.topics.len(), 2);
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChatmoodError, Result};
use crate::message::Sentiment;

/// Default candidate topics for zero-shot classification.
pub const DEFAULT_TOPICS: [&str; 5] = ["Politics", "Economy", "Technology", "World News", "News"];

/// Selectors and normalization rules for Telegram Desktop HTML exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Exact class list of a message container (default: `body`).
    ///
    /// Containers with any additional, missing or repeated class are ignored.
    /// Multiple classes must be listed in document order.
    pub container_class: String,

    /// Class of the text element inside a container (default: `text`)
    pub text_class: String,

    /// Exact class list of the date element (default: `pull_right date details`)
    pub date_class: String,

    /// Attribute holding the full timestamp (default: `title`)
    pub date_attribute: String,

    /// Class of the sender element (default: `from_name`)
    pub sender_class: String,

    /// Number of leading characters kept from the timestamp (default: 10)
    pub timestamp_width: usize,

    /// Date separator used by the export (default: `.`)
    pub date_separator: char,

    /// Separator written into normalized timestamps (default: `/`)
    pub replacement_separator: char,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            container_class: "body".to_string(),
            text_class: "text".to_string(),
            date_class: "pull_right date details".to_string(),
            date_attribute: "title".to_string(),
            sender_class: "from_name".to_string(),
            timestamp_width: 10,
            date_separator: '.',
            replacement_separator: '/',
        }
    }
}

impl ExtractorConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the exact container class.
    #[must_use]
    pub fn with_container_class(mut self, class: impl Into<String>) -> Self {
        self.container_class = class.into();
        self
    }

    /// Sets the text element class.
    #[must_use]
    pub fn with_text_class(mut self, class: impl Into<String>) -> Self {
        self.text_class = class.into();
        self
    }

    /// Sets the separators used for timestamp normalization.
    #[must_use]
    pub fn with_separators(mut self, from: char, to: char) -> Self {
        self.date_separator = from;
        self.replacement_separator = to;
        self
    }
}

/// Settings for the sentiment and topic classifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Hub identifier of the sentiment sequence classifier
    pub sentiment_model: String,

    /// Hub identifier of the NLI model used for zero-shot topics
    pub topic_model: String,

    /// Local directory with `config.json`, `tokenizer.json` and weights.
    ///
    /// When set, the hub is never contacted for the sentiment model.
    pub sentiment_model_dir: Option<PathBuf>,

    /// Local directory override for the topic model
    pub topic_model_dir: Option<PathBuf>,

    /// Token budget per input; longer texts are truncated (default: 512)
    pub max_tokens: usize,

    /// Class index to label table of the sentiment model.
    ///
    /// Default: `[Neutral, Positive, Negative]`.
    pub sentiment_labels: Vec<Sentiment>,

    /// NLI hypothesis; `{}` is replaced by the candidate topic
    pub hypothesis_template: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sentiment_model: "MonoHime/rubert-base-cased-sentiment-new".to_string(),
            topic_model: "cointegrated/rubert-base-cased-nli-threeway".to_string(),
            sentiment_model_dir: None,
            topic_model_dir: None,
            max_tokens: 512,
            sentiment_labels: vec![
                Sentiment::Neutral,
                Sentiment::Positive,
                Sentiment::Negative,
            ],
            hypothesis_template: "This example is {}.".to_string(),
        }
    }
}

impl ClassifierConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sentiment model identifier.
    #[must_use]
    pub fn with_sentiment_model(mut self, model: impl Into<String>) -> Self {
        self.sentiment_model = model.into();
        self
    }

    /// Sets the topic model identifier.
    #[must_use]
    pub fn with_topic_model(mut self, model: impl Into<String>) -> Self {
        self.topic_model = model.into();
        self
    }

    /// Loads the sentiment model from a local directory.
    #[must_use]
    pub fn with_sentiment_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sentiment_model_dir = Some(dir.into());
        self
    }

    /// Loads the topic model from a local directory.
    #[must_use]
    pub fn with_topic_model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.topic_model_dir = Some(dir.into());
        self
    }

    /// Sets the token budget.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Sets the class index to label table.
    #[must_use]
    pub fn with_sentiment_labels(mut self, labels: Vec<Sentiment>) -> Self {
        self.sentiment_labels = labels;
        self
    }

    /// Sets the NLI hypothesis template.
    #[must_use]
    pub fn with_hypothesis_template(mut self, template: impl Into<String>) -> Self {
        self.hypothesis_template = template.into();
        self
    }
}

/// Where charts and the tabular export are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for chart files, created on first save (default: `images`)
    pub chart_dir: PathBuf,

    /// Tabular export path (default: `sentiment_results.csv`)
    pub export_path: PathBuf,

    /// File name of the timeline chart
    pub timeline_file: String,

    /// File name of the sentiment histogram
    pub histogram_file: String,

    /// File name of the topic frequency chart
    pub topics_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            chart_dir: PathBuf::from("images"),
            export_path: PathBuf::from("sentiment_results.csv"),
            timeline_file: "sentiment_timeline.json".to_string(),
            histogram_file: "sentiment_histogram.json".to_string(),
            topics_file: "topic_frequency.json".to_string(),
        }
    }
}

impl OutputConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the chart directory.
    #[must_use]
    pub fn with_chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chart_dir = dir.into();
        self
    }

    /// Sets the tabular export path.
    #[must_use]
    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Candidate topics, in display order
    pub topics: Vec<String>,
    pub extractor: ExtractorConfig,
    pub classifier: ClassifierConfig,
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topics: DEFAULT_TOPICS.iter().map(ToString::to_string).collect(),
            extractor: ExtractorConfig::default(),
            classifier: ClassifierConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ChatmoodError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ChatmoodError::config_file(path, e.to_string()))?;
        config
            .validate()
            .map_err(|e| ChatmoodError::config_file(path, e.to_string()))?;
        Ok(config)
    }

    /// Serializes the configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ChatmoodError::config(e.to_string()))
    }

    /// Replaces the candidate topic list.
    #[must_use]
    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: ExtractorConfig) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    /// Checks invariants that serde can't express.
    pub fn validate(&self) -> Result<()> {
        if self.topics.is_empty() {
            return Err(ChatmoodError::config("topics must not be empty"));
        }
        if self.classifier.sentiment_labels.is_empty() {
            return Err(ChatmoodError::config(
                "classifier.sentiment_labels must not be empty",
            ));
        }
        if self.classifier.max_tokens == 0 {
            return Err(ChatmoodError::config(
                "classifier.max_tokens must be positive",
            ));
        }
        if !self.classifier.hypothesis_template.contains("{}") {
            return Err(ChatmoodError::config(
                "classifier.hypothesis_template must contain '{}'",
            ));
        }
        Ok(())
    }
}
