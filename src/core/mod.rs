pub mod driver;
pub mod ledger;
pub mod order;
pub mod selection;

pub use crate::domain::model::{Candidate, CandidateBatch, Item, PurchaseRecord};
pub use crate::domain::ports::{Catalog, Notifier, PageSource, PurchaseExecutor, Storage};
pub use crate::utils::error::Result;
