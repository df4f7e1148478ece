//! Labeled phrase tables for yes/no recognition

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which side of a yes/no question a phrase belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternLabel {
    Affirmative,
    Negative,
}

impl fmt::Display for PatternLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternLabel::Affirmative => f.write_str("affirmative"),
            PatternLabel::Negative => f.write_str("negative"),
        }
    }
}

/// Errors raised while building a [`PatternTable`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternTableError {
    #[error("{0} phrase list is empty")]
    EmptyLabel(PatternLabel),
    #[error("{0} phrase list contains a blank phrase")]
    BlankPhrase(PatternLabel),
}

const DEFAULT_AFFIRMATIVE: &[&str] = &[
    "yes",
    "y",
    "yep",
    "yeah",
    "sure",
    "ok",
    "okay",
    "yes please",
    "yes thanks",
    "yes thank you",
];

const DEFAULT_NEGATIVE: &[&str] = &["no", "n", "nope", "nah", "no thanks", "no thank you"];

/// Accepted phrasings for each label, normalized to trimmed lowercase.
///
/// Both lists are guaranteed non-empty. The table is immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPatternTable")]
pub struct PatternTable {
    affirmative: Vec<String>,
    negative: Vec<String>,
}

#[derive(Deserialize)]
struct RawPatternTable {
    affirmative: Vec<String>,
    negative: Vec<String>,
}

impl TryFrom<RawPatternTable> for PatternTable {
    type Error = PatternTableError;

    fn try_from(raw: RawPatternTable) -> Result<Self, Self::Error> {
        PatternTable::new(raw.affirmative, raw.negative)
    }
}

impl PatternTable {
    pub fn new<A, N>(affirmative: A, negative: N) -> Result<Self, PatternTableError>
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        Ok(Self {
            affirmative: normalize(PatternLabel::Affirmative, affirmative)?,
            negative: normalize(PatternLabel::Negative, negative)?,
        })
    }

    /// Build a table from `;`-separated lists, e.g. `"Yes;y;sure"`
    pub fn from_delimited(affirmative: &str, negative: &str) -> Result<Self, PatternTableError> {
        Self::new(split_list(affirmative), split_list(negative))
    }

    pub fn phrases(&self, label: PatternLabel) -> &[String] {
        match label {
            PatternLabel::Affirmative => &self.affirmative,
            PatternLabel::Negative => &self.negative,
        }
    }
}

impl Default for PatternTable {
    fn default() -> Self {
        Self {
            affirmative: DEFAULT_AFFIRMATIVE.iter().map(|p| (*p).to_string()).collect(),
            negative: DEFAULT_NEGATIVE.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(';').filter(|p| !p.trim().is_empty())
}

fn normalize<I>(label: PatternLabel, phrases: I) -> Result<Vec<String>, PatternTableError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut normalized = Vec::new();
    for phrase in phrases {
        let phrase = phrase.as_ref().trim();
        if phrase.is_empty() {
            return Err(PatternTableError::BlankPhrase(label));
        }
        normalized.push(phrase.to_lowercase());
    }
    if normalized.is_empty() {
        return Err(PatternTableError::EmptyLabel(label));
    }
    Ok(normalized)
}
