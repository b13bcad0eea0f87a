use async_trait::async_trait;
use httpmock::prelude::*;
use random_basket::domain::ports::Notifier;
use random_basket::domain::summary::OrderSummary;
use random_basket::{app, LocalStorage, Result, RunMode, RunStatus, TomlConfig};
use std::io::Write;
use std::sync::Mutex;
use tempfile::{NamedTempFile, TempDir};

#[derive(Default)]
struct RecordingNotifier {
    summaries: Mutex<Vec<OrderSummary>>,
}

impl RecordingNotifier {
    fn summaries(&self) -> Vec<OrderSummary> {
        self.summaries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, summary: &OrderSummary) -> Result<()> {
        self.summaries.lock().unwrap().push(summary.clone());
        Ok(())
    }
}

fn product(title: &str, author: &str, price: &str, id: u32) -> String {
    format!(
        r#"<div class="mx-product-list-item">
             <a class="mx-product-list-item-title">{title}</a>
             <a class="mx-product-list-item-manufacturer-link">{author}</a>
             <span class="mx-product-list-item-price">{price}</span>
             <form><input name="aid" value="{id}"><input name="am" value="1"></form>
           </div>"#
    )
}

fn catalog_page() -> String {
    format!(
        "<html><body>{}{}{}{}</body></html>",
        product("Der Prozess", "Franz Kafka", "2,00 €", 1),
        product("Effi Briest", "Theodor Fontane", "2,00 €", 2),
        product("Atlas der Alpen", "Diercke", "1,00 €", 3),
        product("Ulysses", "James Joyce", "9,99 €", 4),
    )
}

fn basket_page(server: &MockServer) -> String {
    format!(
        r#"<html><body><form data-ga-label="Paypal Express" action="{}">
             <input name="cl" value="paypal"></form></body></html>"#,
        server.url("/paypal")
    )
}

/// Writes a config pointing every shop URL at `server` and loads it back.
fn config_file(server: &MockServer, max_item_price: f64) -> (NamedTempFile, TomlConfig) {
    let toml = format!(
        r#"
[shop]
base_url = "{base}"
login_url = "{login}"
basket_url = "{basket}"
page_url = "{page}"
max_page = 0
max_delay_seconds = 0.0

[account]
email = "me@example.com"
password = "secret"

[purchase]
target_spend = 4.0
max_item_price = {max_item_price:.1}
excluded_title_words = ["Atlas"]
max_cycles = 3

[ledger]
path = "library.json"
"#,
        base = server.url("/"),
        login = server.url("/Mein-Konto/"),
        basket = server.url("/Warenkorb/"),
        page = server.url("/list?page=$PAGE$"),
    );

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();
    let config = TomlConfig::from_file(file.path()).unwrap();
    (file, config)
}

struct Shop {
    server: MockServer,
}

impl Shop {
    fn start() -> Self {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/Mein-Konto/")
                .x_www_form_urlencoded_tuple("lgn_usr", "me@example.com");
            then.status(200).body("<p>Willkommen</p>");
        });
        server.mock(|when, then| {
            when.method(GET).path("/list").query_param("page", "0");
            then.status(200).body(catalog_page());
        });
        Self { server }
    }
}

#[tokio::test]
async fn test_live_run_checks_out_once_and_notifies() {
    let shop = Shop::start();
    let server = &shop.server;
    let add_mock = server.mock(|when, then| {
        when.method(POST).path("/");
        then.status(200);
    });
    let basket_mock = server.mock(|when, then| {
        when.method(GET).path("/Warenkorb/");
        then.status(200).body(basket_page(server));
    });
    let paypal_mock = server.mock(|when, then| {
        when.method(POST).path("/paypal").x_www_form_urlencoded_tuple("cl", "paypal");
        then.status(200).body("pay here");
    });

    let (_file, config) = config_file(server, 3.0);
    config.validate_config().unwrap();
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
    let notifier = RecordingNotifier::default();

    let report = app::run(&config, RunMode::Live, storage, &notifier).await.unwrap();

    assert_eq!(report.status, RunStatus::TargetMet);
    assert_eq!(report.order.len(), 2);
    assert_eq!(add_mock.hits(), 2);
    assert_eq!(basket_mock.hits(), 1);
    assert_eq!(paypal_mock.hits(), 1);

    let summaries = notifier.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total, 4.0);
    assert_eq!(summaries[0].checkout_url, Some(server.url("/paypal")));

    let raw = std::fs::read_to_string(dir.path().join("library.json")).unwrap();
    let entries: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(entries.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_dry_run_never_touches_basket_or_ledger() {
    let shop = Shop::start();
    let server = &shop.server;
    let add_mock = server.mock(|when, then| {
        when.method(POST).path("/");
        then.status(200);
    });
    let basket_mock = server.mock(|when, then| {
        when.method(GET).path("/Warenkorb/");
        then.status(200).body(basket_page(server));
    });
    let paypal_mock = server.mock(|when, then| {
        when.method(POST).path("/paypal");
        then.status(200);
    });

    let (_file, config) = config_file(server, 3.0);
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
    let notifier = RecordingNotifier::default();

    let report = app::run(&config, RunMode::DryRun, storage, &notifier).await.unwrap();

    assert_eq!(report.status, RunStatus::TargetMet);
    assert_eq!(report.order.len(), 2);
    assert_eq!(add_mock.hits(), 0);
    assert_eq!(basket_mock.hits(), 0);
    assert_eq!(paypal_mock.hits(), 0);
    assert!(notifier.summaries().is_empty());
    assert!(!dir.path().join("library.json").exists());
}

#[tokio::test]
async fn test_failed_checkout_still_notifies_without_link() {
    let shop = Shop::start();
    let server = &shop.server;
    server.mock(|when, then| {
        when.method(POST).path("/");
        then.status(200);
    });
    let basket_mock = server.mock(|when, then| {
        when.method(GET).path("/Warenkorb/");
        then.status(500);
    });

    let (_file, config) = config_file(server, 3.0);
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
    let notifier = RecordingNotifier::default();

    app::run(&config, RunMode::Live, storage, &notifier).await.unwrap();

    assert_eq!(basket_mock.hits(), 1);
    let summaries = notifier.summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].checkout_url, None);
}

#[tokio::test]
async fn test_rejected_checkout_session_is_an_error() {
    let shop = Shop::start();
    let server = &shop.server;
    server.mock(|when, then| {
        when.method(POST).path("/");
        then.status(200);
    });
    server.mock(|when, then| {
        when.method(GET).path("/Warenkorb/");
        then.status(403);
    });

    let (_file, config) = config_file(server, 3.0);
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
    let notifier = RecordingNotifier::default();

    let err = app::run(&config, RunMode::Live, storage, &notifier).await.unwrap_err();

    assert!(err.is_authentication());
    assert!(notifier.summaries().is_empty());
}

#[tokio::test]
async fn test_empty_order_skips_checkout_and_notification() {
    let shop = Shop::start();
    let server = &shop.server;
    let basket_mock = server.mock(|when, then| {
        when.method(GET).path("/Warenkorb/");
        then.status(200).body(basket_page(server));
    });

    let (_file, config) = config_file(server, 0.5);
    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
    let notifier = RecordingNotifier::default();

    let report = app::run(&config, RunMode::Live, storage, &notifier).await.unwrap();

    assert_eq!(report.status, RunStatus::CycleLimitReached);
    assert_eq!(report.cycles, 3);
    assert!(report.order.is_empty());
    assert_eq!(basket_mock.hits(), 0);
    assert!(notifier.summaries().is_empty());
}
