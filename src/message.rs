//! Chat message and sentiment label types.
//!
//! This module provides [`Message`], the unit that flows through the whole
//! pipeline, and [`Sentiment`], the categorical output of the sentiment
//! classifier.
//!
//! # Lifecycle
//!
//! 1. The extractor creates a message with `content` and a normalized
//!    `timestamp` string (`dd/mm/yyyy`).
//! 2. The classifier service assigns `mood` and `category`. A repeated run
//!    overwrites them.
//! 3. The aggregator reads messages; it never mutates them.
//!
//! # Examples
//!
//! ```
//! use chatmood::{Message, Sentiment};
//!
//! let mut msg = Message::new("Rates are up again", "15/01/2024");
//! assert_eq!(msg.sentiment_score(), 0); // unset mood counts as neutral
//!
//! msg.update_labels("Economy", Sentiment::Negative);
//! assert_eq!(msg.category.as_deref(), Some("Economy"));
//! assert_eq!(msg.sentiment_score(), -1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sentiment label produced by the classifier.
///
/// The numeric conversion is fixed: `Positive → +1`, `Negative → -1`,
/// `Neutral → 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Display order for charts and histograms: `Negative`, `Neutral`, `Positive`.
    pub const DISPLAY_ORDER: [Sentiment; 3] =
        [Sentiment::Negative, Sentiment::Neutral, Sentiment::Positive];

    /// Returns the numeric score of this label.
    ///
    /// ```
    /// use chatmood::Sentiment;
    ///
    /// assert_eq!(Sentiment::Positive.score(), 1);
    /// assert_eq!(Sentiment::Negative.score(), -1);
    /// assert_eq!(Sentiment::Neutral.score(), 0);
    /// ```
    pub fn score(self) -> i8 {
        match self {
            Sentiment::Positive => 1,
            Sentiment::Negative => -1,
            Sentiment::Neutral => 0,
        }
    }

    /// Maps a score back to its display label.
    ///
    /// Only `-1`, `0` and `1` have a label.
    pub fn from_score(score: i8) -> Option<Sentiment> {
        match score {
            1 => Some(Sentiment::Positive),
            -1 => Some(Sentiment::Negative),
            0 => Some(Sentiment::Neutral),
            _ => None,
        }
    }

    /// Returns the canonical label text.
    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Negative => "Negative",
            Sentiment::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(format!(
                "Unknown sentiment: '{}'. Expected one of: Positive, Negative, Neutral",
                s
            )),
        }
    }
}

/// Converts a sentiment label to its score.
///
/// Total: unrecognized labels score `0`, same as `Neutral`.
///
/// ```
/// use chatmood::message::sentiment_score;
///
/// assert_eq!(sentiment_score("Positive"), 1);
/// assert_eq!(sentiment_score("Negative"), -1);
/// assert_eq!(sentiment_score("Neutral"), 0);
/// assert_eq!(sentiment_score("sarcastic"), 0);
/// ```
pub fn sentiment_score(label: &str) -> i8 {
    label.parse::<Sentiment>().map(Sentiment::score).unwrap_or(0)
}

/// Keys of the typed attribute side table on [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKey {
    /// Canonical timestamp snapshot
    Timestamp,
    /// Canonical content snapshot
    Content,
    /// Sender snapshot, when known
    Sender,
}

/// A chat message extracted from an export.
///
/// `content` is fixed at construction; read it through [`Message::content`].
/// The labels start unset and are assigned by the classifier service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    content: String,

    /// Normalized date string, `dd/mm/yyyy` for well-formed exports.
    ///
    /// Not validated at extraction; the aggregator decides whether it parses.
    pub timestamp: String,

    /// Author display name, when the export carries one for this message.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub sender: Option<String>,

    /// Topic label from the zero-shot classifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub category: Option<String>,

    /// Sentiment label from the sentiment classifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub mood: Option<Sentiment>,

    /// Snapshots of derived fields for downstream consumers.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    #[serde(default)]
    pub attributes: BTreeMap<AttributeKey, String>,
}

impl Message {
    /// Creates an unclassified message.
    pub fn new(content: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            timestamp: timestamp.into(),
            sender: None,
            category: None,
            mood: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Builder method to set the sender.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Returns the message text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Sets the topic label, replacing any previous one.
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = Some(category.into());
    }

    /// Sets the sentiment label, replacing any previous one.
    pub fn set_mood(&mut self, mood: Sentiment) {
        self.mood = Some(mood);
    }

    /// Sets both labels at once.
    pub fn update_labels(&mut self, category: impl Into<String>, mood: Sentiment) {
        self.set_category(category);
        self.set_mood(mood);
    }

    /// Returns `true` once both labels are assigned.
    pub fn is_classified(&self) -> bool {
        self.category.is_some() && self.mood.is_some()
    }

    /// Score of the assigned mood; an unset mood counts as neutral.
    pub fn sentiment_score(&self) -> i8 {
        self.mood.map(Sentiment::score).unwrap_or(0)
    }

    /// Snapshots the canonical timestamp, content and sender into
    /// [`Message::attributes`].
    pub fn prepare_attributes(&mut self) {
        self.attributes
            .insert(AttributeKey::Timestamp, self.timestamp.clone());
        self.attributes
            .insert(AttributeKey::Content, self.content.clone());
        if let Some(sender) = &self.sender {
            self.attributes.insert(AttributeKey::Sender, sender.clone());
        }
    }

    /// Returns a snapshotted attribute.
    pub fn attribute(&self, key: AttributeKey) -> Option<&str> {
        self.attributes.get(&key).map(String::as_str)
    }
}
