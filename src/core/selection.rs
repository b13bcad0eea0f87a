use crate::core::ledger::Ledger;
use crate::domain::model::{Candidate, CandidateBatch, Item};
use crate::domain::ports::Storage;
use rand::Rng;

/// Caller-supplied content predicate over an item and its offer price.
pub trait ContentFilter: Send + Sync {
    fn accepts(&self, item: &Item, price: f64) -> bool;
}

impl<F> ContentFilter for F
where
    F: Fn(&Item, f64) -> bool + Send + Sync,
{
    fn accepts(&self, item: &Item, price: f64) -> bool {
        self(item, price)
    }
}

/// Rejects titles containing any excluded word and anything not cheaper than `max_price`.
#[derive(Debug, Clone)]
pub struct TitleFilter {
    excluded_words: Vec<String>,
    max_price: f64,
}

impl TitleFilter {
    pub fn new(excluded_words: Vec<String>, max_price: f64) -> Self {
        Self {
            excluded_words,
            max_price,
        }
    }
}

impl ContentFilter for TitleFilter {
    fn accepts(&self, item: &Item, price: f64) -> bool {
        price < self.max_price
            && !self
                .excluded_words
                .iter()
                .any(|word| item.title.contains(word.as_str()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub accepted: Vec<Candidate>,
    pub total: f64,
}

impl Selection {
    pub fn contains(&self, item: &Item) -> bool {
        self.accepted.iter().any(|c| &c.item == item)
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Greedy random accumulation over one page.
pub struct SelectionEngine<R: Rng> {
    rng: R,
}

impl<R: Rng> SelectionEngine<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Draws candidates without replacement until the accepted sum reaches `ceiling`.
    ///
    /// Items already in the ledger are never eligible. Items the filter rejects
    /// are consumed without counting towards the sum. The last accepted item may
    /// push the sum past `ceiling`.
    pub fn select<S, F>(
        &mut self,
        batch: &CandidateBatch,
        ledger: &Ledger<S>,
        ceiling: f64,
        filter: &F,
    ) -> Selection
    where
        S: Storage,
        F: ContentFilter + ?Sized,
    {
        let mut remaining: Vec<&Candidate> = batch
            .candidates()
            .iter()
            .filter(|c| !ledger.contains(&c.item))
            .collect();

        let mut selection = Selection::default();
        while selection.total < ceiling && !remaining.is_empty() {
            let index = self.rng.gen_range(0..remaining.len());
            let drawn = remaining.swap_remove(index);

            if filter.accepts(&drawn.item, drawn.price) {
                selection.total += drawn.price;
                selection.accepted.push(drawn.clone());
            } else {
                tracing::debug!("Filtered out {} ({:.2})", drawn.item, drawn.price);
            }
        }

        selection
    }
}
