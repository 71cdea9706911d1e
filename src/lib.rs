//! # Chatmood
//!
//! Sentiment and topic timelines for Telegram chat exports.
//!
//! ## Overview
//!
//! Chatmood reads the HTML pages Telegram Desktop writes when a chat is
//! exported, labels every message with a sentiment (`Positive`, `Negative`,
//! `Neutral`) and one of a list of candidate topics, and turns the result
//! into:
//!
//! - a timeline of summed sentiment per day,
//! - a sentiment histogram and a topic frequency table, saved as charts,
//! - a `Date,Sentiment,Content` CSV export.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "candle")]
//! # fn main() -> chatmood::Result<()> {
//! use chatmood::prelude::*;
//!
//! let config = PipelineConfig::new().with_topics(["Politics", "Economy", "News"]);
//! let pipeline = Pipeline::from_config(config)?;
//!
//! let report = pipeline.run(&["ChatExport/messages.html"])?;
//! for row in &report.aggregates.timeline {
//!     println!("{}: {:+}", row.bucket, row.score);
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "candle"))]
//! # fn main() {}
//! ```
//!
//! ## Bring Your Own Models
//!
//! The classifier service only needs the [`SentimentModel`](classify::SentimentModel)
//! and [`TopicModel`](classify::TopicModel) traits, so any backend (or a test
//! double) can be plugged in through [`Pipeline::new`](pipeline::Pipeline::new).
//!
//! ## Module Structure
//!
//! - [`extract`] — HTML export parsing into [`Message`]s
//! - [`classify`] — [`ClassifierService`](classify::ClassifierService), lazy model slots
//!   - [`classify::candle`] — BERT classifier and NLI zero-shot backend (feature `candle`)
//! - [`aggregate`] — timeline, histogram and topic frequency views
//! - [`render`] — backend-neutral charts and the Vega-Lite writer
//! - [`export`] — CSV export
//! - [`pipeline`] — the end-to-end [`Pipeline`](pipeline::Pipeline)
//! - [`config`] — serde/TOML configuration
//! - [`error`] — [`ChatmoodError`] and [`Result`]
//! - [`cli`] — CLI arguments (feature `cli`)
//!
//! ## Features
//!
//! | Feature | Enables |
//! |---------|---------|
//! | `candle` | transformer backends (candle, tokenizers, hf-hub) |
//! | `cli` | the `chatmood` binary |
//! | `full` | both of the above (default) |
//! | `gen-test` | the `gen_test` synthetic export generator |

pub mod aggregate;
pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod message;
pub mod pipeline;
pub mod render;

// Re-export the main types at the crate root for convenience
pub use error::{ChatmoodError, Result};
pub use message::{Message, Sentiment};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chatmood::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Message, Sentiment};

    pub use crate::error::{ChatmoodError, Result};

    pub use crate::config::{ClassifierConfig, ExtractorConfig, OutputConfig, PipelineConfig};

    pub use crate::extract::{HtmlExtractor, discover_export_files, extract};

    pub use crate::classify::{ClassifierService, LabelTable, ModelSlot, SentimentModel, TopicModel};

    pub use crate::aggregate::{Aggregates, DateBucket, aggregate};

    pub use crate::render::{
        Chart, ChartWriter, render_histogram, render_timeline, render_topic_frequency,
    };

    pub use crate::export::{export_table, to_csv};

    pub use crate::pipeline::{Pipeline, PipelineReport};
}
