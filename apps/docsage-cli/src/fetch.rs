use std::time::Duration;

use anyhow::{bail, Result};
use docsage_core::source::load_content;
use docsage_core::RawDocument;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{error, info};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

pub fn http_client() -> Result<Client> {
    Ok(Client::builder().timeout(FETCH_TIMEOUT).user_agent(concat!("docsage/", env!("CARGO_PKG_VERSION"))).build()?)
}

pub fn check_url(url: &str) -> Result<()> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("Invalid URL format: {url}");
    }
    Ok(())
}

/// Fetch `url` and turn the body into a document. Network and HTTP errors come back
/// as a document with an error status, like unreadable files do.
pub fn fetch_url(client: &Client, url: &str) -> RawDocument {
    let outcome = check_url(url).and_then(|_| {
        let response = client.get(url).send()?.error_for_status()?;
        let content_type = response.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("text/plain").to_string();
        Ok((response.text()?, content_type))
    });
    match outcome {
        Ok((body, content_type)) => {
            info!(%url, %content_type, bytes = body.len(), "fetched url");
            load_content(url, &body, &content_type)
        }
        Err(e) => {
            error!(%url, error = %e, "fetch failed");
            RawDocument::failed(url, e.to_string())
        }
    }
}
