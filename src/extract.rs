//! Message extraction from Telegram Desktop HTML exports.
//!
//! Telegram exports chats as HTML pages with one container per message:
//!
//! ```html
//! <div class="message default clearfix" id="message42">
//!   <div class="body">
//!     <div class="pull_right date details" title="15.01.2024 10:30:00 UTC+03:00">10:30</div>
//!     <div class="from_name">Alice</div>
//!     <div class="text">Hello!</div>
//!   </div>
//! </div>
//! ```
//!
//! Only containers whose class list is *exactly* `body` are read. Service
//! messages carry `class="body details"` and forwarded blocks
//! `class="forwarded body"`; both are ignored. A container without a text
//! element (photos, stickers, calls) is skipped silently.
//!
//! Large chats are split into `messages.html`, `messages2.html`, ... ; use
//! [`discover_export_files`] and [`HtmlExtractor::extract_files`] for those.
//!
//! # Example
//!
//! ```rust
//! use chatmood::extract::extract;
//!
//! let html = r#"
//!     <div class="body">
//!       <div class="pull_right date details" title="15.01.2024 10:30:00">10:30</div>
//!       <div class="text">Hello!</div>
//!     </div>
//!     <div class="body details">Alice joined the group</div>
//! "#;
//!
//! let messages = extract(html)?;
//! assert_eq!(messages.len(), 1);
//! assert_eq!(messages[0].content(), "Hello!");
//! assert_eq!(messages[0].timestamp, "15/01/2024");
//! # Ok::<(), chatmood::ChatmoodError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use scraper::{CaseSensitivity, ElementRef, Html, Selector};

use crate::config::ExtractorConfig;
use crate::error::{ChatmoodError, Result};
use crate::message::Message;

/// Extracts messages from a document using the default Telegram layout.
pub fn extract(raw_document: &str) -> Result<Vec<Message>> {
    Ok(HtmlExtractor::new(ExtractorConfig::default())?.extract(raw_document))
}

/// Normalizes a raw timestamp attribute into `dd/mm/yyyy` form.
///
/// Keeps the first `timestamp_width` characters and swaps the date
/// separator. No validation happens here.
///
/// ```
/// use chatmood::config::ExtractorConfig;
/// use chatmood::extract::normalize_timestamp;
///
/// let config = ExtractorConfig::default();
/// assert_eq!(normalize_timestamp("15.01.2024 10:30:00 UTC+03:00", &config), "15/01/2024");
/// assert_eq!(normalize_timestamp("garbage", &config), "garbage");
/// ```
pub fn normalize_timestamp(raw: &str, config: &ExtractorConfig) -> String {
    raw.chars()
        .take(config.timestamp_width)
        .map(|c| {
            if c == config.date_separator {
                config.replacement_separator
            } else {
                c
            }
        })
        .collect()
}

/// HTML message extractor with pre-compiled selectors.
#[derive(Debug)]
pub struct HtmlExtractor {
    config: ExtractorConfig,
    container: Selector,
    text: Selector,
    container_classes: Vec<String>,
    date_classes: Vec<String>,
}

impl HtmlExtractor {
    /// Compiles the selectors described by `config`.
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let container_classes = class_tokens(&config.container_class, "container_class")?;
        let date_classes = class_tokens(&config.date_class, "date_class")?;

        let container = parse_selector(&format!("div.{}", container_classes.join(".")))?;
        let text = parse_selector(&format!("div.{}", config.text_class))?;

        Ok(Self {
            config,
            container,
            text,
            container_classes,
            date_classes,
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extracts messages from one HTML document, in document order.
    pub fn extract(&self, raw_document: &str) -> Vec<Message> {
        let document = Html::parse_document(raw_document);

        let mut containers = 0usize;
        let mut skipped = 0usize;
        let mut messages = Vec::new();

        for element in document
            .select(&self.container)
            .filter(|el| has_exact_classes(*el, &self.container_classes))
        {
            containers += 1;
            match self.parse_container(element) {
                Some(message) => messages.push(message),
                None => skipped += 1,
            }
        }

        if containers == 0 {
            tracing::warn!("No message containers found in document");
        }
        tracing::debug!(
            containers,
            skipped,
            extracted = messages.len(),
            "Extracted messages from document"
        );

        messages
    }

    /// Reads and extracts a single export file.
    pub fn extract_file(&self, path: &Path) -> Result<Vec<Message>> {
        let content = fs::read_to_string(path)?;
        let messages = self.extract(&content);
        tracing::info!(
            path = %path.display(),
            messages = messages.len(),
            "Parsed export file"
        );
        Ok(messages)
    }

    /// Extracts several export files and concatenates them in the given order.
    pub fn extract_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        for path in paths {
            messages.extend(self.extract_file(path.as_ref())?);
        }
        Ok(messages)
    }

    fn parse_container(&self, element: ElementRef<'_>) -> Option<Message> {
        let Some(text_el) = element.select(&self.text).next() else {
            tracing::debug!("Skipping container without text element");
            return None;
        };
        let content = text_el.text().collect::<String>().trim().to_string();

        let raw_timestamp = element
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "div" && has_exact_classes(*el, &self.date_classes))
            .and_then(|el| el.value().attr(&self.config.date_attribute))
            .unwrap_or_default();
        let timestamp = normalize_timestamp(raw_timestamp, &self.config);

        // Joined messages have no sender of their own; a nested forwarded
        // block's `from_name` belongs to the original author.
        let mut message = Message::new(content, timestamp);
        if let Some(sender) = element
            .children()
            .filter_map(ElementRef::wrap)
            .find(|el| {
                el.value()
                    .has_class(&self.config.sender_class, CaseSensitivity::CaseSensitive)
            })
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
        {
            message.sender = Some(sender);
        }

        Some(message)
    }
}

/// Compares the `class` attribute token by token, in order.
///
/// `Element::classes` deduplicates and sorts, so `class="body body"` would
/// look identical to `class="body"` there.
fn has_exact_classes(element: ElementRef<'_>, expected: &[String]) -> bool {
    element.value().attr("class").is_some_and(|raw| {
        raw.split_whitespace()
            .eq(expected.iter().map(String::as_str))
    })
}

fn class_tokens(classes: &str, field: &str) -> Result<Vec<String>> {
    let tokens: Vec<String> = classes.split_whitespace().map(ToString::to_string).collect();
    if tokens.is_empty() {
        return Err(ChatmoodError::config(format!("{field} must not be empty")));
    }
    Ok(tokens)
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ChatmoodError::config(format!("invalid selector '{}': {}", selector, e)))
}

/// Finds the HTML pages of a Telegram export directory in page order.
///
/// Matches `messages.html` (page 1) and `messagesN.html` (page N).
pub fn discover_export_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(page) = export_page_number(name) {
            pages.push((page, path));
        }
    }

    pages.sort_by_key(|(page, _)| *page);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn export_page_number(file_name: &str) -> Option<u32> {
    let number = file_name
        .strip_prefix("messages")?
        .strip_suffix(".html")?;
    if number.is_empty() {
        Some(1)
    } else {
        number.parse().ok()
    }
}
