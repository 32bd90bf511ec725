//! Value objects for the chat dialogue domain

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::IntErrorKind;

/// Stable channel-level identity of a user (e.g. a phone number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A question/answer entry from the FAQ catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    /// Catalog identifier
    pub id: u64,
    /// Question shown in the numbered list
    pub question: String,
    /// Answer returned on selection
    pub answer: String,
}

impl FaqEntry {
    /// Create a new FAQ entry
    pub fn new(id: u64, question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id,
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// One logged exchange: what the user sent and what was replied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub user_id: UserId,
    pub inbound_text: String,
    pub outbound_text: String,
    pub timestamp: DateTime<Utc>,
}

impl InteractionRecord {
    /// Create a record stamped with the current time
    pub fn new(
        user_id: UserId,
        inbound_text: impl Into<String>,
        outbound_text: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            inbound_text: inbound_text.into(),
            outbound_text: outbound_text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Reserved command words, matched on trimmed lowercase text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyword {
    /// "reset" or "exit"
    Reset,
    /// "faq" or "faqs"
    Faq,
}

impl Keyword {
    /// Match inbound text against the reserved words
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "reset" | "exit" => Some(Self::Reset),
            "faq" | "faqs" => Some(Self::Faq),
            _ => None,
        }
    }
}

/// Outcome of interpreting text as a 1-based FAQ selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaqSelection {
    /// A valid zero-based index into the active list
    Valid(usize),
    /// A number outside `1..=len`
    OutOfRange { requested: i64, max: usize },
    /// Does not start with a base-10 integer
    NotANumber,
}

impl FaqSelection {
    /// Parse `text` against a list of `len` entries.
    ///
    /// Only the leading integer counts: `"2."` and `"1 please"` select entries
    /// 2 and 1. Integers too large for `i64` saturate and are out of range.
    pub fn parse(text: &str, len: usize) -> Self {
        let text = text.trim_start();
        let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
        let digits = unsigned.len() - unsigned.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return Self::NotANumber;
        }

        let leading = &text[..text.len() - unsigned.len() + digits];
        let requested = match leading.parse::<i64>() {
            Ok(n) => n,
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => i64::MAX,
                IntErrorKind::NegOverflow => i64::MIN,
                _ => return Self::NotANumber,
            },
        };

        match usize::try_from(requested) {
            Ok(n) if (1..=len).contains(&n) => Self::Valid(n - 1),
            _ => Self::OutOfRange { requested, max: len },
        }
    }
}
