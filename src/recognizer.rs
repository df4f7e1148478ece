//! Local yes/no recognizer
//!
//! Scores a reply against the affirmative and negative phrase lists of a
//! [`PatternTable`] and picks the strictly stronger label.
//!
//! Matching works on tokens rather than raw characters:
//! 1. Every phrase token must be found, in order, in the reply
//! 2. Consecutive phrase tokens may be separated by at most two other tokens
//! 3. Tokens of three or more characters also match at one edit of distance,
//!    at a reduced weight, but only when the phrase covers the whole reply

mod patterns;

pub use patterns::{PatternLabel, PatternTable, PatternTableError};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Floor awarded to any full phrase match
const BASE_SCORE: f64 = 0.4;

/// Maximum number of reply tokens allowed between two matched phrase tokens
const MAX_TOKEN_GAP: usize = 2;

const FUZZY_TOKEN_WEIGHT: f64 = 0.75;
const FUZZY_MIN_TOKEN_LEN: usize = 3;

/// Outcome of recognizing a single reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionOutcome {
    Affirmative,
    Negative,
    Indeterminate,
}

impl From<PatternLabel> for RecognitionOutcome {
    fn from(label: PatternLabel) -> Self {
        match label {
            PatternLabel::Affirmative => RecognitionOutcome::Affirmative,
            PatternLabel::Negative => RecognitionOutcome::Negative,
        }
    }
}

/// Best score of a reply against one label's phrases, in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecognitionScore {
    pub label: PatternLabel,
    pub score: f64,
}

/// Recognizes yes/no style replies against a [`PatternTable`]
#[derive(Debug, Clone)]
pub struct BooleanRecognizer {
    table: PatternTable,
    affirmative: Vec<Vec<String>>,
    negative: Vec<Vec<String>>,
    threshold: f64,
}

impl BooleanRecognizer {
    pub fn new(table: PatternTable) -> Self {
        let tokenize_all = |label| {
            table
                .phrases(label)
                .iter()
                .map(|phrase| tokenize(phrase))
                .collect::<Vec<_>>()
        };
        let affirmative = tokenize_all(PatternLabel::Affirmative);
        let negative = tokenize_all(PatternLabel::Negative);
        Self {
            table,
            affirmative,
            negative,
            threshold: 0.0,
        }
    }

    /// Require the winning score to be strictly above `threshold`
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Best score per label, affirmative first
    pub fn scores(&self, text: &str) -> [RecognitionScore; 2] {
        let reply = tokenize(text);
        let best = |phrases: &[Vec<String>]| {
            phrases
                .iter()
                .map(|phrase| score_phrase(&reply, phrase))
                .fold(0.0, f64::max)
        };
        [
            RecognitionScore {
                label: PatternLabel::Affirmative,
                score: best(&self.affirmative),
            },
            RecognitionScore {
                label: PatternLabel::Negative,
                score: best(&self.negative),
            },
        ]
    }

    pub fn recognize(&self, text: &str) -> RecognitionOutcome {
        let [yes, no] = self.scores(text);
        let winner = match yes.score.partial_cmp(&no.score) {
            Some(Ordering::Greater) => Some(yes),
            Some(Ordering::Less) => Some(no),
            // Ties never classify
            _ => None,
        };

        let outcome = match winner {
            Some(winner) if winner.score > self.threshold => winner.label.into(),
            _ => RecognitionOutcome::Indeterminate,
        };

        tracing::trace!(
            affirmative = yes.score,
            negative = no.score,
            ?outcome,
            "Recognized reply"
        );
        outcome
    }
}

impl Default for BooleanRecognizer {
    fn default() -> Self {
        Self::new(PatternTable::default())
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}

/// Weight of a reply token standing in for a phrase token, if it matches at all
fn token_weight(reply_token: &str, phrase_token: &str) -> Option<f64> {
    if reply_token == phrase_token {
        return Some(1.0);
    }
    let long_enough = reply_token.chars().count() >= FUZZY_MIN_TOKEN_LEN
        && phrase_token.chars().count() >= FUZZY_MIN_TOKEN_LEN;
    if long_enough && strsim::levenshtein(reply_token, phrase_token) == 1 {
        Some(FUZZY_TOKEN_WEIGHT)
    } else {
        None
    }
}

/// Score a tokenized phrase against a tokenized reply
///
/// Returns 0 unless every phrase token is found. A phrase using a fuzzy token
/// must account for every reply token. An exact match of the whole reply
/// scores 1.
#[allow(clippy::cast_precision_loss)] // token counts are tiny
fn score_phrase(reply: &[String], phrase: &[String]) -> f64 {
    if reply.is_empty() || phrase.is_empty() {
        return 0.0;
    }

    let mut best = 0.0_f64;
    for start in 0..reply.len() {
        let mut cursor = start;
        let mut matched = 0usize;
        let mut total_gap = 0usize;
        let mut weight = 0.0;
        let mut fuzzy = false;

        for token in phrase {
            let found = reply
                .get(cursor..)
                .unwrap_or_default()
                .iter()
                .enumerate()
                .find_map(|(offset, candidate)| {
                    token_weight(candidate, token).map(|w| (cursor + offset, w))
                });
            let Some((position, token_weight)) = found else {
                break;
            };
            let gap = if matched == 0 { 0 } else { position - cursor };
            if gap > MAX_TOKEN_GAP {
                break;
            }
            matched += 1;
            total_gap += gap;
            weight += token_weight;
            fuzzy |= token_weight < 1.0;
            cursor = position + 1;
        }

        // "sur" alone is a typo of "sure"; "not yet" is not a typo of "yes"
        if fuzzy && (matched != reply.len() || total_gap > 0) {
            continue;
        }
        if matched == phrase.len() {
            let quality = weight / matched as f64;
            let accuracy = matched as f64 / (matched + total_gap) as f64;
            let coverage = matched as f64 / reply.len() as f64;
            best = best.max(BASE_SCORE + (1.0 - BASE_SCORE) * quality * accuracy * coverage);
        }
    }
    best
}
