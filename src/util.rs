use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::redirect;
use reqwest_cookie_store::CookieStoreMutex;

pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Settings applied to every request made by an [`HttpClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub user_agent: String,
    /// Upper bound for a single request, including reading the body.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: CHROME_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Final URL after any redirects were followed.
    pub url: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn error_for_status(self) -> Result<Self, TransportError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TransportError::Status {
                url: self.url,
                status: self.status,
            })
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
}

impl TransportError {
    fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout { url: url.into() }
        } else {
            TransportError::ReqwestError(e)
        }
    }
}

/// The HTTP operations the resolver needs. Implementations must keep
/// cookies between calls on the same instance.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError>;

    async fn post_form(
        &self,
        url: &str,
        query: &[(&str, &str)],
        form: &[(&str, &str)],
        follow_redirects: bool,
    ) -> Result<HttpResponse, TransportError>;
}

pub struct HttpClient {
    pub client: reqwest::Client,
    /// Same settings and cookie jar as `client`, but never follows redirects.
    pub client_no_redirect: reqwest::Client,
    pub cookies: Arc<CookieStoreMutex>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> reqwest::Result<HttpClient> {
        let cookies = Arc::new(CookieStoreMutex::default());

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .cookie_provider(cookies.clone())
            .build()?;

        let client_no_redirect = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .cookie_provider(cookies.clone())
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(HttpClient {
            client,
            client_no_redirect,
            cookies,
        })
    }

    async fn read(url: &str, resp: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = resp.status().as_u16();
        let final_url = resp.url().to_string();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;

        Ok(HttpResponse {
            status,
            url: final_url,
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;

        Self::read(url, resp).await
    }

    async fn post_form(
        &self,
        url: &str,
        query: &[(&str, &str)],
        form: &[(&str, &str)],
        follow_redirects: bool,
    ) -> Result<HttpResponse, TransportError> {
        debug!("POST {}", url);
        let client = if follow_redirects {
            &self.client
        } else {
            &self.client_no_redirect
        };

        let resp = client
            .post(url)
            .query(query)
            .form(form)
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(url, e))?;

        Self::read(url, resp).await
    }
}
