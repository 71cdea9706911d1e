//! End-to-end pipeline: extract, classify, aggregate, render, export.
//!
//! [`Pipeline`] is an explicit object. It owns its configuration and a shared
//! [`ClassifierService`], performs no work at construction and can be run any
//! number of times.
//!
//! # Stage order
//!
//! 1. Resolve inputs (files, or export directories via
//!    [`discover_export_files`]) and extract messages.
//! 2. Load both classifier models. A load failure aborts the run before any
//!    chart or table is written.
//! 3. Classify every message in place.
//! 4. Aggregate.
//! 5. Save the three charts and the tabular export.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "candle")]
//! # fn main() -> chatmood::Result<()> {
//! use chatmood::config::PipelineConfig;
//! use chatmood::pipeline::Pipeline;
//!
//! let pipeline = Pipeline::from_config(PipelineConfig::default())?;
//! let report = pipeline.run(&["export/messages.html"])?;
//! println!("{} messages, charts in {:?}", report.messages.len(), report.charts);
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "candle"))]
//! # fn main() {}
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::aggregate::{Aggregates, aggregate};
use crate::classify::ClassifierService;
use crate::config::PipelineConfig;
use crate::error::{ChatmoodError, Result};
use crate::export::export_table;
use crate::extract::{HtmlExtractor, discover_export_files};
use crate::message::Message;
use crate::render::{ChartWriter, render_histogram, render_timeline, render_topic_frequency};

/// Outcome of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Export files read, in order
    pub sources: Vec<PathBuf>,
    /// Messages after classification
    pub messages: Vec<Message>,
    /// Aggregate views
    pub aggregates: Aggregates,
    /// Written chart files: timeline, histogram, topic frequency
    pub charts: Vec<PathBuf>,
    /// Written tabular export
    pub export_path: PathBuf,
}

/// Outcome of an extract-only run.
#[derive(Debug, Clone)]
pub struct ExtractReport {
    pub sources: Vec<PathBuf>,
    pub messages: Vec<Message>,
    pub export_path: PathBuf,
}

/// The sentiment and topic pipeline.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    extractor: HtmlExtractor,
    classifier: Arc<ClassifierService>,
}

impl Pipeline {
    /// Creates a pipeline around an existing classifier service.
    ///
    /// The configuration is validated; no model is loaded.
    pub fn new(config: PipelineConfig, classifier: Arc<ClassifierService>) -> Result<Self> {
        config.validate()?;
        let extractor = HtmlExtractor::new(config.extractor.clone())?;
        Ok(Self {
            config,
            extractor,
            classifier,
        })
    }

    /// Creates a pipeline backed by the transformer models named in `config`.
    #[cfg(feature = "candle")]
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let classifier = ClassifierService::from_config(&config.classifier)?;
        Self::new(config, Arc::new(classifier))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The shared classifier service.
    pub fn classifier(&self) -> &Arc<ClassifierService> {
        &self.classifier
    }

    /// Reads and extracts every input.
    pub fn extract<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<(Vec<PathBuf>, Vec<Message>)> {
        let sources = resolve_inputs(inputs)?;
        let messages = self.extractor.extract_files(&sources)?;
        Ok((sources, messages))
    }

    /// Classifies `messages` in place and aggregates them. No file IO.
    pub fn analyze(&self, messages: &mut [Message]) -> Result<Aggregates> {
        self.classifier
            .classify_all(messages, &self.config.topics)?;
        for message in messages.iter_mut() {
            message.prepare_attributes();
        }
        Ok(aggregate(messages, &self.config.topics))
    }

    /// Runs every stage and writes the charts and the export.
    pub fn run<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<PipelineReport> {
        let (sources, mut messages) = self.extract(inputs)?;

        self.classifier.ensure_initialized()?;
        let aggregates = self.analyze(&mut messages)?;
        let (charts, export_path) = self.write_outputs(&messages, &aggregates)?;

        tracing::info!(
            messages = messages.len(),
            days = aggregates.timeline.len(),
            "Pipeline finished"
        );

        Ok(PipelineReport {
            sources,
            messages,
            aggregates,
            charts,
            export_path,
        })
    }

    /// Saves the three charts and the tabular export.
    pub fn write_outputs(
        &self,
        messages: &[Message],
        aggregates: &Aggregates,
    ) -> Result<(Vec<PathBuf>, PathBuf)> {
        let output = &self.config.output;
        let writer = ChartWriter::new(&output.chart_dir);

        let charts = vec![
            writer.save_chart(&render_timeline(&aggregates.timeline), &output.timeline_file)?,
            writer.save_chart(&render_histogram(&aggregates.histogram), &output.histogram_file)?,
            writer.save_chart(&render_topic_frequency(&aggregates.topics), &output.topics_file)?,
        ];

        export_table(messages, &output.export_path)?;
        Ok((charts, output.export_path.clone()))
    }

    /// Extracts messages and writes them to the export without classifying.
    ///
    /// No model is constructed, so this works without any classifier backend.
    pub fn extract_only<P: AsRef<Path>>(
        config: &PipelineConfig,
        inputs: &[P],
    ) -> Result<ExtractReport> {
        let extractor = HtmlExtractor::new(config.extractor.clone())?;
        let sources = resolve_inputs(inputs)?;
        let mut messages = extractor.extract_files(&sources)?;
        for message in &mut messages {
            message.prepare_attributes();
        }

        export_table(&messages, &config.output.export_path)?;
        Ok(ExtractReport {
            sources,
            messages,
            export_path: config.output.export_path.clone(),
        })
    }
}

/// Expands inputs into export files.
///
/// Files are kept as given; directories are replaced by their export pages
/// in page order.
pub fn resolve_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    if inputs.is_empty() {
        return Err(ChatmoodError::config("no input files given"));
    }

    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            let pages = discover_export_files(input)?;
            if pages.is_empty() {
                tracing::warn!(dir = %input.display(), "No export pages found in directory");
            }
            files.extend(pages);
        } else {
            files.push(input.to_path_buf());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{LabelTable, ModelSlot, SentimentModel, TopicModel};
    use crate::config::OutputConfig;
    use crate::message::Sentiment;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{TempDir, tempdir};

    struct KeywordSentiment;

    impl SentimentModel for KeywordSentiment {
        fn class_scores(&self, text: &str) -> Result<Vec<f32>> {
            Ok(if text.contains("good") {
                vec![0.0, 1.0, 0.0]
            } else if text.contains("bad") {
                vec![0.0, 0.0, 1.0]
            } else {
                vec![1.0, 0.0, 0.0]
            })
        }
    }

    struct LastTopic;

    impl TopicModel for LastTopic {
        fn candidate_scores(&self, _text: &str, candidates: &[String]) -> Result<Vec<f32>> {
            Ok((0..candidates.len()).map(|i| i as f32).collect())
        }
    }

    fn page(bodies: &[(&str, &str)]) -> String {
        let mut html = String::from("<html><body>");
        for (date, text) in bodies {
            html.push_str(&format!(
                r#"<div class="body"><div class="pull_right date details" title="{date} 10:00:00">10:00</div><div class="text">{text}</div></div>"#
            ));
        }
        html.push_str("</body></html>");
        html
    }

    fn config_in(dir: &TempDir) -> PipelineConfig {
        PipelineConfig::default()
            .with_topics(["Politics", "News"])
            .with_output(
                OutputConfig::default()
                    .with_chart_dir(dir.path().join("images"))
                    .with_export_path(dir.path().join("out").join("results.csv")),
            )
    }

    fn mock_service(loads: &Arc<AtomicUsize>) -> Arc<ClassifierService> {
        let counter = Arc::clone(loads);
        Arc::new(ClassifierService::new(
            ModelSlot::new("sentiment model", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(KeywordSentiment) as Arc<dyn SentimentModel>)
            }),
            ModelSlot::from_handle("topic model", Arc::new(LastTopic) as Arc<dyn TopicModel>),
            LabelTable::canonical(),
        ))
    }

    #[test]
    fn test_run_writes_all_outputs() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("messages.html");
        fs::write(
            &input,
            page(&[
                ("15.01.2024", "good"),
                ("15.01.2024", "bad"),
                ("16.01.2024", "good"),
            ]),
        )
        .unwrap();

        let loads = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(config_in(&dir), mock_service(&loads)).unwrap();
        let report = pipeline.run(&[&input]).unwrap();

        assert_eq!(report.sources, vec![input]);
        assert_eq!(report.messages.len(), 3);
        assert!(report.messages.iter().all(Message::is_classified));
        assert_eq!(report.messages[0].category.as_deref(), Some("News"));

        let scores: Vec<_> = report.aggregates.timeline.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![0, 1]);

        assert_eq!(report.charts.len(), 3);
        for chart in &report.charts {
            assert!(chart.starts_with(dir.path().join("images")));
            assert!(chart.exists());
        }
        let table = fs::read_to_string(&report.export_path).unwrap();
        assert!(table.starts_with("Date,Sentiment,Content"));
        assert!(table.contains("15/01/2024,Negative,bad"));
    }

    #[test]
    fn test_repeated_runs_reuse_models() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("messages.html");
        fs::write(&input, page(&[("15.01.2024", "good")])).unwrap();

        let loads = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(config_in(&dir), mock_service(&loads)).unwrap();
        let first = pipeline.run(&[&input]).unwrap();
        let second = pipeline.run(&[&input]).unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(first.aggregates, second.aggregates);
    }

    #[test]
    fn test_empty_document_produces_empty_outputs() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("messages.html");
        fs::write(&input, "<html><body><p>nothing</p></body></html>").unwrap();

        let pipeline = Pipeline::new(config_in(&dir), mock_service(&Arc::default())).unwrap();
        let report = pipeline.run(&[&input]).unwrap();

        assert!(report.messages.is_empty());
        assert!(report.aggregates.timeline.is_empty());
        assert_eq!(report.aggregates.topics.total(), 0);
        assert!(report.charts.iter().all(|p| p.exists()));
        assert_eq!(
            fs::read_to_string(report.export_path).unwrap(),
            "Date,Sentiment,Content\n"
        );
    }

    #[test]
    fn test_resource_failure_writes_nothing() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("messages.html");
        fs::write(&input, page(&[("15.01.2024", "good")])).unwrap();

        let service = Arc::new(ClassifierService::new(
            ModelSlot::new("sentiment model", || {
                Err(ChatmoodError::resource_init("sentiment model", "weights not found"))
            }),
            ModelSlot::from_handle("topic model", Arc::new(LastTopic) as Arc<dyn TopicModel>),
            LabelTable::canonical(),
        ));
        let config = config_in(&dir);
        let pipeline = Pipeline::new(config.clone(), service).unwrap();

        let err = pipeline.run(&[&input]).unwrap_err();
        assert!(err.is_resource_init());
        assert!(!config.output.chart_dir.exists());
        assert!(!config.output.export_path.exists());
    }

    #[test]
    fn test_directory_input_reads_pages_in_order() {
        let dir = tempdir().unwrap();
        let export = dir.path().join("export");
        fs::create_dir(&export).unwrap();
        fs::write(export.join("messages2.html"), page(&[("16.01.2024", "second")])).unwrap();
        fs::write(export.join("messages.html"), page(&[("15.01.2024", "first")])).unwrap();

        let pipeline = Pipeline::new(config_in(&dir), mock_service(&Arc::default())).unwrap();
        let (sources, messages) = pipeline.extract(&[&export]).unwrap();

        assert_eq!(sources.len(), 2);
        let contents: Vec<_> = messages.iter().map(Message::content).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[test]
    fn test_extract_only_skips_classification() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("messages.html");
        fs::write(&input, page(&[("15.01.2024", "hello")])).unwrap();

        let config = config_in(&dir);
        let report = Pipeline::extract_only(&config, &[&input]).unwrap();

        assert_eq!(report.messages.len(), 1);
        assert!(report.messages[0].mood.is_none());
        let table = fs::read_to_string(report.export_path).unwrap();
        assert!(table.contains("15/01/2024,,hello"));
        assert!(!config.output.chart_dir.exists());
    }

    #[test]
    fn test_missing_input_is_io_error() {
        let dir = tempdir().unwrap();
        let pipeline = Pipeline::new(config_in(&dir), mock_service(&Arc::default())).unwrap();
        let err = pipeline.run(&[dir.path().join("absent.html")]).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_no_inputs_rejected() {
        let empty: [&Path; 0] = [];
        assert!(resolve_inputs(&empty).unwrap_err().is_config());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PipelineConfig::default().with_topics(Vec::<String>::new());
        assert!(Pipeline::new(config, mock_service(&Arc::default())).is_err());
    }

    #[test]
    fn test_analyze_snapshots_attributes() {
        let pipeline =
            Pipeline::new(PipelineConfig::default(), mock_service(&Arc::default())).unwrap();
        let mut messages = vec![Message::new("good", "15/01/2024")];
        let aggregates = pipeline.analyze(&mut messages).unwrap();

        assert_eq!(messages[0].mood, Some(Sentiment::Positive));
        assert_eq!(
            messages[0].attribute(crate::message::AttributeKey::Content),
            Some("good")
        );
        assert_eq!(aggregates.histogram.positive, 1);
    }
}
