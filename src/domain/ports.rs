use crate::domain::model::{Candidate, CandidateBatch};
use crate::domain::summary::OrderSummary;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Source of catalog pages.
///
/// `Ok(None)` means the page could not be fetched this time; the caller retries
/// with another page. `Err` is reserved for failures that make further fetching
/// pointless, such as a rejected session.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn fetch(&self, page_ref: &str) -> Result<Option<CandidateBatch>>;
}

#[async_trait]
pub trait PurchaseExecutor: Send + Sync {
    async fn submit(&self, candidate: &Candidate) -> Result<()>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &OrderSummary) -> Result<()>;
}

// One session object usually plays both roles, so the driver borrows it twice.
#[async_trait]
impl<'a, T: Catalog + ?Sized> Catalog for &'a T {
    async fn fetch(&self, page_ref: &str) -> Result<Option<CandidateBatch>> {
        (**self).fetch(page_ref).await
    }
}

#[async_trait]
impl<'a, T: PurchaseExecutor + ?Sized> PurchaseExecutor for &'a T {
    async fn submit(&self, candidate: &Candidate) -> Result<()> {
        (**self).submit(candidate).await
    }
}

pub trait PageSource: Send {
    fn next_page_ref(&mut self) -> String;
}

impl<F> PageSource for F
where
    F: FnMut() -> String + Send,
{
    fn next_page_ref(&mut self) -> String {
        self()
    }
}
