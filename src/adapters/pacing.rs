use crate::domain::ports::PageSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::Duration;

pub const PAGE_PLACEHOLDER: &str = "$PAGE$";

/// Random pause before each request to the shop.
#[derive(Debug)]
pub struct Pacer {
    max_delay: Duration,
    rng: Mutex<StdRng>,
}

impl Pacer {
    pub fn new(max_delay: Duration) -> Self {
        Self {
            max_delay,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn next_delay(&self) -> Duration {
        if self.max_delay.is_zero() {
            return Duration::ZERO;
        }
        let fraction: f64 = match self.rng.lock() {
            Ok(mut rng) => rng.gen(),
            Err(poisoned) => poisoned.into_inner().gen(),
        };
        self.max_delay.mul_f64(fraction)
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tracing::trace!("Sleeping {:?} before request", delay);
            tokio::time::sleep(delay).await;
        }
    }
}

/// Catalog page URLs with a uniformly drawn page number in `0..=max_page`.
#[derive(Debug)]
pub struct UrlTemplate<R: Rng = StdRng> {
    template: String,
    max_page: u32,
    rng: R,
}

impl UrlTemplate<StdRng> {
    pub fn new(template: impl Into<String>, max_page: u32) -> Self {
        Self::with_rng(template, max_page, StdRng::from_entropy())
    }
}

impl<R: Rng> UrlTemplate<R> {
    pub fn with_rng(template: impl Into<String>, max_page: u32, rng: R) -> Self {
        Self {
            template: template.into(),
            max_page,
            rng,
        }
    }

    pub fn page_url(&self, page: u32) -> String {
        self.template.replace(PAGE_PLACEHOLDER, &page.to_string())
    }
}

impl<R: Rng + Send> PageSource for UrlTemplate<R> {
    fn next_page_ref(&mut self) -> String {
        let page = self.rng.gen_range(0..=self.max_page);
        self.page_url(page)
    }
}
