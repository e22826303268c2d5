use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};

use crate::error::LogoError;

pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);
pub const PAGE_TIMEOUT: Duration = Duration::from_secs(30);

// Several CDNs refuse requests without a browser-looking agent.
const BROWSER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A failure below HTTP: DNS, connect, TLS, timeout, broken body.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

pub trait LogoClient: Send + Sync {
    /// One GET with the image timeout. Never retries.
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    /// One GET of an HTML page with the longer page timeout.
    fn get_page(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.get(url)
    }
}

#[derive(Clone)]
pub struct HttpLogoClient {
    client: Client,
    page_client: Client,
}

impl HttpLogoClient {
    pub fn new() -> Result<Self, LogoError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("image/avif,image/webp,image/png,image/*,*/*;q=0.8"),
        );
        headers.insert(
            "X-Client",
            HeaderValue::from_str(&format!("airline-logos/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| LogoError::HttpSetup(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers.clone())
            .timeout(IMAGE_TIMEOUT)
            .build()
            .map_err(|err| LogoError::HttpSetup(err.to_string()))?;
        let page_client = Client::builder()
            .default_headers(headers)
            .timeout(PAGE_TIMEOUT)
            .build()
            .map_err(|err| LogoError::HttpSetup(err.to_string()))?;

        Ok(Self {
            client,
            page_client,
        })
    }

    fn send(client: &Client, url: &str) -> Result<HttpResponse, TransportError> {
        let response = client
            .get(url)
            .send()
            .map_err(|err| TransportError(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|err| TransportError(err.to_string()))?
            .to_vec();
        Ok(HttpResponse { status, body })
    }
}

impl LogoClient for HttpLogoClient {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        Self::send(&self.client, url)
    }

    fn get_page(&self, url: &str) -> Result<HttpResponse, TransportError> {
        Self::send(&self.page_client, url)
    }
}

impl<T: LogoClient + ?Sized> LogoClient for &T {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        (**self).get(url)
    }

    fn get_page(&self, url: &str) -> Result<HttpResponse, TransportError> {
        (**self).get_page(url)
    }
}
