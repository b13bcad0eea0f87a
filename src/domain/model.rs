use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A purchasable work. Title and author together are the only identity the shop offers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub author: String,
}

impl Item {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" by {}", self.title, self.author)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurchaseRecord {
    pub purchased_at: DateTime<Utc>,
    pub price: f64,
}

/// Form fields the shop expects when an item is put into the basket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub fields: Vec<(String, String)>,
}

impl SubmissionPayload {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub item: Item,
    pub price: f64,
    pub payload: SubmissionPayload,
}

impl Candidate {
    pub fn new(item: Item, price: f64, payload: SubmissionPayload) -> Self {
        Self {
            item,
            price,
            payload,
        }
    }
}

/// Candidates decoded from one catalog page, at most one per item.
#[derive(Debug, Clone, Default)]
pub struct CandidateBatch {
    candidates: Vec<Candidate>,
}

impl CandidateBatch {
    /// Keeps the first candidate of each item; later repeats on the same page are dropped.
    pub fn from_candidates(candidates: impl IntoIterator<Item = Candidate>) -> Self {
        let mut seen = HashSet::new();
        let candidates = candidates
            .into_iter()
            .filter(|c| seen.insert(c.item.clone()))
            .collect();
        Self { candidates }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Live,
    DryRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    TargetMet,
    CycleLimitReached,
}
