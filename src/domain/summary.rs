use crate::domain::model::Item;
use std::fmt::Write;

pub const SUMMARY_SUBJECT: &str = "Buy some random books";

/// What the operator is told once a run is over.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSummary {
    pub items: Vec<(Item, f64)>,
    pub total: f64,
    pub checkout_url: Option<String>,
}

impl OrderSummary {
    pub fn subject(&self) -> &'static str {
        SUMMARY_SUBJECT
    }

    pub fn render(&self) -> String {
        let mut body = format!("Ordering {:.2} euros worth of books.\n", self.total);
        match &self.checkout_url {
            Some(url) => {
                let _ = writeln!(body, "Please pay at {}", url);
            }
            None => body.push_str("No checkout link available, open the basket to pay.\n"),
        }

        if !self.items.is_empty() {
            body.push('\n');
            for (item, price) in &self.items {
                let _ = writeln!(body, "- {} ({:.2}€)", item, price);
            }
        }
        body
    }
}
