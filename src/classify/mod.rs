//! Sentiment and topic classification.
//!
//! The [`ClassifierService`] wraps two independent models behind a stable
//! interface:
//!
//! - [`SentimentModel`] scores a text against a fixed set of classes; the
//!   service maps the arg-max class index to a [`Sentiment`] through a
//!   [`LabelTable`].
//! - [`TopicModel`] scores a text against caller-supplied candidate topics
//!   (zero-shot, single label); the service returns the top candidate.
//!
//! Both models live in [`ModelSlot`]s: they are loaded on first use, shared
//! by every later call and reloaded only after [`ClassifierService::reset`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use chatmood::classify::{ClassifierService, LabelTable, ModelSlot, SentimentModel, TopicModel};
//! use chatmood::{Result, Sentiment};
//!
//! struct AlwaysPositive;
//! impl SentimentModel for AlwaysPositive {
//!     fn class_scores(&self, _text: &str) -> Result<Vec<f32>> {
//!         Ok(vec![0.1, 0.8, 0.1]) // [Neutral, Positive, Negative]
//!     }
//! }
//!
//! struct FirstTopic;
//! impl TopicModel for FirstTopic {
//!     fn candidate_scores(&self, _text: &str, candidates: &[String]) -> Result<Vec<f32>> {
//!         Ok((0..candidates.len()).map(|i| if i == 0 { 1.0 } else { 0.0 }).collect())
//!     }
//! }
//!
//! let service = ClassifierService::new(
//!     ModelSlot::new("sentiment model", || Ok(Arc::new(AlwaysPositive) as Arc<dyn SentimentModel>)),
//!     ModelSlot::new("topic model", || Ok(Arc::new(FirstTopic) as Arc<dyn TopicModel>)),
//!     LabelTable::canonical(),
//! );
//!
//! assert_eq!(service.classify_sentiment("great news")?, Sentiment::Positive);
//! let topics = vec!["Sports".to_string(), "Weather".to_string()];
//! assert_eq!(service.classify_topic("match tonight", &topics)?, "Sports");
//! # Ok::<(), chatmood::ChatmoodError>(())
//! ```

#[cfg(feature = "candle")]
pub mod candle;
mod slot;

pub use slot::ModelSlot;

use std::sync::Arc;

use crate::error::{ChatmoodError, Result};
use crate::message::{Message, Sentiment};

/// A model that scores a text against a fixed set of classes.
pub trait SentimentModel: Send + Sync {
    /// Returns one score per class index. Higher is more likely.
    fn class_scores(&self, text: &str) -> Result<Vec<f32>>;
}

/// A zero-shot model that scores a text against arbitrary candidate labels.
pub trait TopicModel: Send + Sync {
    /// Returns one score per candidate, aligned with `candidates`.
    fn candidate_scores(&self, text: &str, candidates: &[String]) -> Result<Vec<f32>>;
}

/// Fixed mapping from sentiment model class index to label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<Sentiment>,
}

impl LabelTable {
    /// Creates a table; `labels[i]` is the label of class index `i`.
    pub fn new(labels: Vec<Sentiment>) -> Result<Self> {
        if labels.is_empty() {
            return Err(ChatmoodError::config("sentiment label table is empty"));
        }
        Ok(Self { labels })
    }

    /// The canonical table `[Neutral, Positive, Negative]`.
    pub fn canonical() -> Self {
        Self {
            labels: vec![Sentiment::Neutral, Sentiment::Positive, Sentiment::Negative],
        }
    }

    /// Returns the label of a class index.
    pub fn label(&self, index: usize) -> Result<Sentiment> {
        self.labels
            .get(index)
            .copied()
            .ok_or(ChatmoodError::UnknownClassIndex {
                index,
                labels: self.labels.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::canonical()
    }
}

/// Index of the highest score. Ties go to the lowest index; NaN is ignored.
///
/// ```
/// use chatmood::classify::argmax;
///
/// assert_eq!(argmax(&[0.2, 0.7, 0.1]), Some(1));
/// assert_eq!(argmax(&[0.5, 0.5]), Some(0));
/// assert_eq!(argmax(&[]), None);
/// ```
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// Numerically stable softmax.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return exps;
    }
    exps.into_iter().map(|e| e / sum).collect()
}

/// Classification front-end over lazily loaded sentiment and topic models.
#[derive(Debug)]
pub struct ClassifierService {
    sentiment: ModelSlot<dyn SentimentModel>,
    topic: ModelSlot<dyn TopicModel>,
    labels: LabelTable,
}

impl ClassifierService {
    /// Creates a service from two model slots and a label table.
    pub fn new(
        sentiment: ModelSlot<dyn SentimentModel>,
        topic: ModelSlot<dyn TopicModel>,
        labels: LabelTable,
    ) -> Self {
        Self {
            sentiment,
            topic,
            labels,
        }
    }

    /// Creates a service backed by the transformer models named in `config`.
    ///
    /// Nothing is downloaded or loaded until the first classification.
    #[cfg(feature = "candle")]
    pub fn from_config(config: &crate::config::ClassifierConfig) -> Result<Self> {
        let labels = LabelTable::new(config.sentiment_labels.clone())?;

        let sentiment_config = config.clone();
        let sentiment = ModelSlot::new("sentiment model", move || {
            let model = candle::BertSequenceClassifier::from_source(
                &sentiment_config.sentiment_model,
                sentiment_config.sentiment_model_dir.as_deref(),
                sentiment_config.max_tokens,
                "sentiment model",
            )?;
            if model.num_labels() != sentiment_config.sentiment_labels.len() {
                tracing::warn!(
                    model_labels = model.num_labels(),
                    table_labels = sentiment_config.sentiment_labels.len(),
                    "Sentiment label table size differs from the model head"
                );
            }
            Ok(Arc::new(model) as Arc<dyn SentimentModel>)
        });

        let topic_config = config.clone();
        let topic = ModelSlot::new("topic model", move || {
            let model = candle::NliZeroShotClassifier::from_source(
                &topic_config.topic_model,
                topic_config.topic_model_dir.as_deref(),
                topic_config.max_tokens,
                &topic_config.hypothesis_template,
            )?;
            Ok(Arc::new(model) as Arc<dyn TopicModel>)
        });

        Ok(Self::new(sentiment, topic, labels))
    }

    /// Loads both models if they aren't loaded yet.
    pub fn ensure_initialized(&self) -> Result<()> {
        self.sentiment.ensure_initialized()?;
        self.topic.ensure_initialized()?;
        Ok(())
    }

    /// Drops both cached models; the next call reloads them.
    pub fn reset(&self) {
        self.sentiment.reset();
        self.topic.reset();
    }

    /// Returns the sentiment label of `text`.
    pub fn classify_sentiment(&self, text: &str) -> Result<Sentiment> {
        let model = self.sentiment.ensure_initialized()?;
        let scores = model.class_scores(text)?;
        let index = argmax(&scores)
            .ok_or_else(|| ChatmoodError::inference("sentiment model returned no scores"))?;
        self.labels.label(index)
    }

    /// Returns the best matching candidate topic for `text`.
    pub fn classify_topic(&self, text: &str, candidates: &[String]) -> Result<String> {
        if candidates.is_empty() {
            return Err(ChatmoodError::NoCandidates);
        }
        let model = self.topic.ensure_initialized()?;
        let scores = model.candidate_scores(text, candidates)?;
        if scores.len() != candidates.len() {
            return Err(ChatmoodError::inference(format!(
                "topic model returned {} scores for {} candidates",
                scores.len(),
                candidates.len()
            )));
        }
        let index = argmax(&scores)
            .ok_or_else(|| ChatmoodError::inference("topic model returned no usable scores"))?;
        Ok(candidates[index].clone())
    }

    /// Assigns both labels to `message`, replacing earlier ones.
    pub fn classify_message(&self, message: &mut Message, topics: &[String]) -> Result<()> {
        let mood = self.classify_sentiment(message.content())?;
        let category = self.classify_topic(message.content(), topics)?;
        tracing::debug!(%mood, category = %category, "Classified message");
        message.update_labels(category, mood);
        Ok(())
    }

    /// Classifies every message in place.
    ///
    /// Both models are loaded before the first message is touched, so a
    /// load failure leaves all messages unchanged.
    pub fn classify_all(&self, messages: &mut [Message], topics: &[String]) -> Result<()> {
        if topics.is_empty() {
            return Err(ChatmoodError::NoCandidates);
        }
        self.ensure_initialized()?;
        for message in messages.iter_mut() {
            self.classify_message(message, topics)?;
        }
        tracing::info!(messages = messages.len(), "Classified messages");
        Ok(())
    }

    /// The sentiment model slot.
    pub fn sentiment_slot(&self) -> &ModelSlot<dyn SentimentModel> {
        &self.sentiment
    }

    /// The topic model slot.
    pub fn topic_slot(&self) -> &ModelSlot<dyn TopicModel> {
        &self.topic
    }

    /// The class index to label table.
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }
}
