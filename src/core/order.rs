use crate::domain::model::{Candidate, Item};
use crate::domain::summary::OrderSummary;
use crate::utils::error::{BasketError, Result};
use std::collections::HashSet;

/// Items accepted during the current run, in acceptance order.
#[derive(Debug, Clone, Default)]
pub struct OrderAccumulator {
    accepted: Vec<Candidate>,
    index: HashSet<Item>,
    total: f64,
}

impl OrderAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a candidate to the order.
    ///
    /// A negative or non-finite price is a [`BasketError::Validation`] and
    /// leaves the order unchanged, so the total only ever grows.
    pub fn add(&mut self, candidate: Candidate) -> Result<()> {
        if !candidate.price.is_finite() || candidate.price < 0.0 {
            return Err(BasketError::Validation {
                message: format!(
                    "{} has an invalid price {}",
                    candidate.item, candidate.price
                ),
            });
        }
        if !self.index.insert(candidate.item.clone()) {
            return Err(BasketError::duplicate(&candidate.item));
        }
        self.total += candidate.price;
        self.accepted.push(candidate);
        Ok(())
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.index.contains(item)
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn is_target_met(&self, target: f64) -> bool {
        self.total >= target
    }

    pub fn remaining(&self, target: f64) -> f64 {
        (target - self.total).max(0.0)
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.accepted.iter()
    }

    pub fn summary(&self, checkout_url: Option<String>) -> OrderSummary {
        OrderSummary {
            items: self
                .accepted
                .iter()
                .map(|c| (c.item.clone(), c.price))
                .collect(),
            total: self.total,
            checkout_url,
        }
    }
}
