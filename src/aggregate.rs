//! Aggregation of classified messages.
//!
//! Three views, all pure functions of the message slice:
//!
//! | View | Function | Shape |
//! |------|----------|-------|
//! | Timeline | [`timeline`] | one row per date bucket, summed scores, ascending |
//! | Histogram | [`histogram`] | message count per score `-1`, `0`, `+1` |
//! | Topic frequency | [`topic_frequency`] | count per candidate topic, zero-filled |
//!
//! Timestamps are parsed here with the fixed `dd/mm/yyyy` format. Anything
//! that fails to parse goes to the single [`DateBucket::Unparsed`] bucket,
//! which sorts after every real date.
//!
//! # Example
//!
//! ```
//! use chatmood::aggregate::{aggregate, DateBucket};
//! use chatmood::{Message, Sentiment};
//!
//! let mut a = Message::new("great", "15/01/2024");
//! a.update_labels("Economy", Sentiment::Positive);
//! let mut b = Message::new("awful", "15/01/2024");
//! b.update_labels("Economy", Sentiment::Negative);
//!
//! let topics = vec!["Politics".to_string(), "Economy".to_string()];
//! let result = aggregate(&[a, b], &topics);
//!
//! assert_eq!(result.timeline.len(), 1);
//! assert_eq!(result.timeline[0].score, 0);
//! assert_eq!(result.topics.get("Economy"), Some(2));
//! assert_eq!(result.topics.get("Politics"), Some(0));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::message::{Message, Sentiment};

/// Date format of normalized timestamps.
pub const BUCKET_FORMAT: &str = "%d/%m/%Y";

/// Day-granularity grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateBucket {
    /// A calendar date
    Date(NaiveDate),
    /// Every timestamp that failed to parse
    Unparsed,
}

impl DateBucket {
    /// Parses a normalized timestamp; failures yield [`DateBucket::Unparsed`].
    ///
    /// ```
    /// use chatmood::aggregate::DateBucket;
    /// use chrono::NaiveDate;
    ///
    /// assert_eq!(
    ///     DateBucket::parse("15/01/2024"),
    ///     DateBucket::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
    /// );
    /// assert_eq!(DateBucket::parse("31/02/2024"), DateBucket::Unparsed);
    /// assert_eq!(DateBucket::parse(""), DateBucket::Unparsed);
    /// ```
    pub fn parse(timestamp: &str) -> Self {
        NaiveDate::parse_from_str(timestamp.trim(), BUCKET_FORMAT)
            .map(DateBucket::Date)
            .unwrap_or(DateBucket::Unparsed)
    }

    /// Returns the date, if any.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            DateBucket::Date(date) => Some(*date),
            DateBucket::Unparsed => None,
        }
    }
}

impl fmt::Display for DateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateBucket::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            DateBucket::Unparsed => f.write_str("unparsed"),
        }
    }
}

/// Serialized as an ISO date string, or `null` for the unparsed bucket.
impl Serialize for DateBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DateBucket::Date(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
            DateBucket::Unparsed => serializer.serialize_none(),
        }
    }
}

/// One timeline point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineRow {
    pub bucket: DateBucket,
    /// Sum of the sentiment scores of the bucket's messages
    pub score: i64,
    /// Number of messages in the bucket
    pub messages: usize,
}

/// Message counts per sentiment score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SentimentHistogram {
    pub negative: usize,
    pub neutral: usize,
    pub positive: usize,
}

impl SentimentHistogram {
    /// Count for one label.
    pub fn count(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
            Sentiment::Positive => self.positive,
        }
    }

    /// `(label, count)` in display order: Negative, Neutral, Positive.
    pub fn rows(&self) -> [(Sentiment, usize); 3] {
        Sentiment::DISPLAY_ORDER.map(|s| (s, self.count(s)))
    }

    pub fn total(&self) -> usize {
        self.negative + self.neutral + self.positive
    }

    fn record(&mut self, score: i8) {
        match score {
            s if s < 0 => self.negative += 1,
            0 => self.neutral += 1,
            _ => self.positive += 1,
        }
    }
}

/// Occurrences per candidate topic, in candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicFrequencyTable {
    rows: Vec<(String, usize)>,
}

impl TopicFrequencyTable {
    /// Count for a topic; `None` if it isn't a candidate.
    pub fn get(&self, topic: &str) -> Option<usize> {
        self.rows
            .iter()
            .find(|(name, _)| name == topic)
            .map(|(_, count)| *count)
    }

    /// `(topic, count)` pairs in candidate order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.rows.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.rows.iter().map(|(_, count)| count).sum()
    }
}

impl Serialize for TopicFrequencyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Row<'a> {
            topic: &'a str,
            count: usize,
        }
        serializer.collect_seq(self.iter().map(|(topic, count)| Row { topic, count }))
    }
}

/// All three aggregate views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Aggregates {
    pub timeline: Vec<TimelineRow>,
    pub histogram: SentimentHistogram,
    pub topics: TopicFrequencyTable,
}

/// Builds every view from one pass over the input.
pub fn aggregate(messages: &[Message], candidate_topics: &[String]) -> Aggregates {
    Aggregates {
        timeline: timeline(messages),
        histogram: histogram(messages),
        topics: topic_frequency(messages, candidate_topics),
    }
}

/// Sums sentiment scores per date bucket, ascending, unparsed bucket last.
pub fn timeline(messages: &[Message]) -> Vec<TimelineRow> {
    let mut buckets: BTreeMap<DateBucket, (i64, usize)> = BTreeMap::new();
    for message in messages {
        let entry = buckets
            .entry(DateBucket::parse(&message.timestamp))
            .or_default();
        entry.0 += i64::from(message.sentiment_score());
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(bucket, (score, messages))| TimelineRow {
            bucket,
            score,
            messages,
        })
        .collect()
}

/// Counts messages per sentiment score. Unset moods count as neutral.
pub fn histogram(messages: &[Message]) -> SentimentHistogram {
    let mut histogram = SentimentHistogram::default();
    for message in messages {
        histogram.record(message.sentiment_score());
    }
    histogram
}

/// Counts messages per candidate topic.
///
/// Every candidate appears (zero-filled); labels outside the list and
/// unclassified messages are dropped. Duplicate candidates keep their first
/// position.
pub fn topic_frequency(messages: &[Message], candidate_topics: &[String]) -> TopicFrequencyTable {
    let mut observed: HashMap<&str, usize> = HashMap::new();
    for category in messages.iter().filter_map(|m| m.category.as_deref()) {
        *observed.entry(category).or_default() += 1;
    }

    let mut rows: Vec<(String, usize)> = Vec::with_capacity(candidate_topics.len());
    for topic in candidate_topics {
        if rows.iter().any(|(name, _)| name == topic) {
            continue;
        }
        let count = observed.get(topic.as_str()).copied().unwrap_or(0);
        rows.push((topic.clone(), count));
    }

    TopicFrequencyTable { rows }
}
