use crate::adapters::html::{self, CompiledLayout};
use crate::adapters::pacing::Pacer;
use crate::domain::model::{Candidate, CandidateBatch};
use crate::domain::ports::{Catalog, PurchaseExecutor};
use crate::utils::error::{BasketError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ORIGIN, USER_AGENT};
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:84.0) Gecko/20100101 Firefox/84.0";
pub const DEFAULT_LOGIN_FAILURE_MARKER: &str = "falsches Passwort";

#[derive(Debug, Clone)]
pub struct ShopEndpoints {
    pub base_url: String,
    pub login_url: String,
    pub basket_url: String,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub login_failure_marker: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            login_failure_marker: DEFAULT_LOGIN_FAILURE_MARKER.to_string(),
        }
    }
}

/// One logged-in browsing session against the shop.
///
/// Holds the cookie jar, so the same value must be used for login, page
/// fetches and basket submissions.
pub struct ShopSession {
    client: Client,
    endpoints: ShopEndpoints,
    layout: CompiledLayout,
    pacer: Pacer,
    login_failure_marker: String,
}

impl ShopSession {
    pub fn new(
        endpoints: ShopEndpoints,
        layout: CompiledLayout,
        pacer: Pacer,
        options: SessionOptions,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&options.user_agent).map_err(|e| BasketError::InvalidConfigValue {
                field: "shop.user_agent".to_string(),
                value: options.user_agent.clone(),
                reason: e.to_string(),
            })?,
        );
        headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
        if let Ok(origin) = HeaderValue::from_str(endpoints.base_url.trim_end_matches('/')) {
            headers.insert(ORIGIN, origin);
        }

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            client,
            endpoints,
            layout,
            pacer,
            login_failure_marker: options.login_failure_marker,
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        self.pacer.pause().await;
        tracing::info!("🔑 Logging in as {}", email);

        let form = [
            ("lgn_usr", email),
            ("lgn_pwd", password),
            ("lang", "0"),
            ("listtype", ""),
            ("actcontrol", "account"),
            ("fnc", "login_noredirect"),
            ("cl", "account"),
            ("tpl", ""),
            ("mxSourceUrl", self.endpoints.login_url.as_str()),
        ];
        let response = self
            .client
            .post(&self.endpoints.login_url)
            .form(&form)
            .send()
            .await?;

        check_session(response.status())?;
        let body = response.text().await?;
        if body.contains(&self.login_failure_marker) {
            return Err(BasketError::Authentication {
                message: format!("shop rejected the credentials for {}", email),
            });
        }

        tracing::debug!("Login accepted");
        Ok(())
    }

    /// Posts the checkout form found in the basket and returns the payment page URL.
    pub async fn checkout_url(&self) -> Result<String> {
        self.pacer.pause().await;
        let response = self.client.get(&self.endpoints.basket_url).send().await?;
        check_session(response.status())?;
        if !response.status().is_success() {
            return Err(BasketError::Checkout {
                message: format!("basket page returned {}", response.status()),
            });
        }

        let body = response.text().await?;
        let form = html::find_checkout_form(&body, &self.layout).ok_or_else(|| {
            BasketError::Checkout {
                message: "checkout form not found in basket page".to_string(),
            }
        })?;

        let action = reqwest::Url::parse(&self.endpoints.basket_url)
            .and_then(|base| base.join(&form.action))
            .map_err(|e| BasketError::Checkout {
                message: format!("invalid form action {:?}: {}", form.action, e),
            })?;

        self.pacer.pause().await;
        let response = self.client.post(action).form(&form.fields).send().await?;
        check_session(response.status())?;
        Ok(response.url().to_string())
    }
}

fn check_session(status: StatusCode) -> Result<()> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(BasketError::Authentication {
            message: format!("shop answered {}", status),
        });
    }
    Ok(())
}

#[async_trait]
impl Catalog for ShopSession {
    async fn fetch(&self, page_ref: &str) -> Result<Option<CandidateBatch>> {
        self.pacer.pause().await;

        let response = match self.client.get(page_ref).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Fetching {} failed: {}", page_ref, e);
                return Ok(None);
            }
        };

        check_session(response.status())?;
        if response.status() != StatusCode::OK {
            tracing::warn!("Fetching {} returned {}", page_ref, response.status());
            return Ok(None);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Reading {} failed: {}", page_ref, e);
                return Ok(None);
            }
        };

        let batch = html::decode_page(&body, &self.layout);
        tracing::debug!("Decoded {} candidates from {}", batch.len(), page_ref);
        Ok(Some(batch))
    }
}

#[async_trait]
impl PurchaseExecutor for ShopSession {
    async fn submit(&self, candidate: &Candidate) -> Result<()> {
        self.pacer.pause().await;

        let response = self
            .client
            .post(&self.endpoints.base_url)
            .form(&candidate.payload.fields)
            .send()
            .await?;

        check_session(response.status())?;
        if !response.status().is_success() {
            return Err(BasketError::Validation {
                message: format!("basket submission returned {}", response.status()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::html::PageLayout;
    use crate::domain::model::{Item, SubmissionPayload};
    use httpmock::prelude::*;

    fn session(server: &MockServer) -> ShopSession {
        let endpoints = ShopEndpoints {
            base_url: server.url("/"),
            login_url: server.url("/Mein-Konto/"),
            basket_url: server.url("/Warenkorb/"),
        };
        ShopSession::new(
            endpoints,
            PageLayout::default().compile().unwrap(),
            Pacer::disabled(),
            SessionOptions::default(),
        )
        .unwrap()
    }

    const PAGE: &str = r#"<html><body>
        <div class="mx-product-list-item">
          <a class="mx-product-list-item-title">Faust</a>
          <a class="mx-product-list-item-manufacturer-link">Goethe</a>
          <span class="mx-product-list-item-price">2,49 €</span>
          <form><input name="aid" value="42"></form>
        </div></body></html>"#;

    #[tokio::test]
    async fn test_fetch_decodes_page() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET).path("/list").query_param("page", "3");
            then.status(200).body(PAGE);
        });

        let batch = session(&server)
            .fetch(&server.url("/list?page=3"))
            .await
            .unwrap()
            .unwrap();

        page_mock.assert();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.candidates()[0].item, Item::new("Faust", "Goethe"));
        assert_eq!(batch.candidates()[0].price, 2.49);
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/list");
            then.status(503);
        });

        let result = session(&server).fetch(&server.url("/list")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_fetch_connection_failure_is_unavailable() {
        let server = MockServer::start();
        let session = session(&server);

        let result = session.fetch("http://127.0.0.1:9/list").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_fetch_forbidden_is_authentication_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/list");
            then.status(403);
        });

        let err = session(&server).fetch(&server.url("/list")).await.unwrap_err();
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/Mein-Konto/")
                .x_www_form_urlencoded_tuple("lgn_usr", "me@example.com");
            then.status(200).body("<p>Sie haben ein falsches Passwort eingegeben</p>");
        });

        let err = session(&server)
            .login("me@example.com", "wrong")
            .await
            .unwrap_err();
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn test_login_accepted() {
        let server = MockServer::start();
        let login_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/Mein-Konto/")
                .x_www_form_urlencoded_tuple("lgn_usr", "me@example.com")
                .x_www_form_urlencoded_tuple("lgn_pwd", "secret")
                .x_www_form_urlencoded_tuple("fnc", "login_noredirect")
                .x_www_form_urlencoded_tuple("mxSourceUrl", server.url("/Mein-Konto/"));
            then.status(200).body("<p>Willkommen</p>");
        });

        session(&server).login("me@example.com", "secret").await.unwrap();
        login_mock.assert();
    }

    #[tokio::test]
    async fn test_submit_posts_payload() {
        let server = MockServer::start();
        let basket_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/")
                .x_www_form_urlencoded_tuple("aid", "42")
                .x_www_form_urlencoded_tuple("am", "1");
            then.status(200);
        });

        let candidate = Candidate::new(
            Item::new("Faust", "Goethe"),
            2.49,
            SubmissionPayload::new(vec![
                ("aid".to_string(), "42".to_string()),
                ("am".to_string(), "1".to_string()),
            ]),
        );
        session(&server).submit(&candidate).await.unwrap();
        basket_mock.assert();
    }

    #[tokio::test]
    async fn test_checkout_url_follows_form() {
        let server = MockServer::start();
        let basket = format!(
            r#"<html><body><form data-ga-label="Paypal Express" action="{}">
                 <input name="cl" value="paypal"></form></body></html>"#,
            server.url("/paypal")
        );
        server.mock(|when, then| {
            when.method(GET).path("/Warenkorb/");
            then.status(200).body(basket);
        });
        let paypal_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/paypal")
                .x_www_form_urlencoded_tuple("cl", "paypal");
            then.status(200).body("pay here");
        });

        let url = session(&server).checkout_url().await.unwrap();

        paypal_mock.assert();
        assert_eq!(url, server.url("/paypal"));
    }

    #[tokio::test]
    async fn test_checkout_without_form_fails() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/Warenkorb/");
            then.status(200).body("<html><body>empty</body></html>");
        });

        let err = session(&server).checkout_url().await.unwrap_err();
        assert!(matches!(err, BasketError::Checkout { .. }));
    }
}
