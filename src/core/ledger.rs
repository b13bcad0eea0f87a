use crate::domain::model::{Item, PurchaseRecord};
use crate::domain::ports::Storage;
use crate::utils::error::{BasketError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One line of the persisted ledger file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerEntry {
    title: String,
    author: String,
    purchased_at: DateTime<Utc>,
    price: f64,
}

/// Every item ever bought, persisted after each purchase.
///
/// The ledger is the only durable state of the tool. It is loaded once per run,
/// grows by one entry per [`Ledger::record`] call and is rewritten in full on
/// every call, so a crash loses at most the purchase in flight.
pub struct Ledger<S: Storage> {
    storage: S,
    path: String,
    entries: BTreeMap<Item, PurchaseRecord>,
}

impl<S: Storage> Ledger<S> {
    /// Loads the ledger at `path`. A missing file is an empty ledger.
    pub async fn load(storage: S, path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let data = match storage.read_file(&path).await {
            Ok(data) => data,
            Err(BasketError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No ledger at {}, starting empty", path);
                return Ok(Self {
                    storage,
                    path,
                    entries: BTreeMap::new(),
                });
            }
            Err(e) => return Err(e),
        };

        let raw: Vec<LedgerEntry> = if data.iter().all(u8::is_ascii_whitespace) {
            Vec::new()
        } else {
            serde_json::from_slice(&data)?
        };

        let mut entries = BTreeMap::new();
        for entry in raw {
            let item = Item::new(entry.title, entry.author);
            let record = PurchaseRecord {
                purchased_at: entry.purchased_at,
                price: entry.price,
            };
            if entries.insert(item.clone(), record).is_some() {
                return Err(BasketError::duplicate(&item));
            }
        }

        tracing::info!("Loaded ledger with {} purchased items from {}", entries.len(), path);
        Ok(Self {
            storage,
            path,
            entries,
        })
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.entries.contains_key(item)
    }

    pub fn get(&self, item: &Item) -> Option<&PurchaseRecord> {
        self.entries.get(item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Item, &PurchaseRecord)> {
        self.entries.iter()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Records a purchase and writes the ledger through to storage.
    ///
    /// Fails with [`BasketError::DuplicateItem`] when the item is already known.
    /// If the write fails the entry is removed again, so memory and storage agree.
    /// Negative and non-finite prices are refused, since JSON cannot hold them.
    pub async fn record(
        &mut self,
        item: Item,
        price: f64,
        purchased_at: DateTime<Utc>,
    ) -> Result<()> {
        if !price.is_finite() || price < 0.0 {
            return Err(BasketError::Validation {
                message: format!("refusing to record {} at price {}", item, price),
            });
        }
        if self.entries.contains_key(&item) {
            return Err(BasketError::duplicate(&item));
        }

        self.entries.insert(
            item.clone(),
            PurchaseRecord {
                purchased_at,
                price,
            },
        );

        if let Err(e) = self.persist().await {
            self.entries.remove(&item);
            return Err(e);
        }

        tracing::debug!("Recorded {} at {:.2}", item, price);
        Ok(())
    }

    async fn persist(&self) -> Result<()> {
        let raw: Vec<LedgerEntry> = self
            .entries
            .iter()
            .map(|(item, record)| LedgerEntry {
                title: item.title.clone(),
                author: item.author.clone(),
                purchased_at: record.purchased_at,
                price: record.price,
            })
            .collect();

        let json = serde_json::to_vec_pretty(&raw)?;
        self.storage.write_file(&self.path, &json).await
    }
}
