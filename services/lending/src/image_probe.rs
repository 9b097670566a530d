//! Image URL reachability probe
//!
//! Book covers are given as URLs; before a book is accepted into the
//! catalog the URL has to resolve to an actual image resource. The probe is
//! the only blocking boundary call in the request path, so it runs with a
//! short timeout, and any network failure or timeout counts as a failed
//! check rather than an error.

use anyhow::Result;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

const PROBE_TIMEOUT_SECS: u64 = 5;

/// Probe for checking that an image URL points at a real image
#[derive(Clone)]
pub struct ImageProbe {
    client: reqwest::Client,
}

impl ImageProbe {
    /// Create a new probe with the default timeout
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }

    /// Check that the URL resolves with status 200 and an `image/*`
    /// Content-Type. Returns false on any failure, including timeouts.
    pub async fn check(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => {
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok());
                response.status().is_success() && is_image_content_type(content_type)
            }
            Err(e) => {
                debug!("Image probe failed for {}: {}", url, e);
                false
            }
        }
    }
}

fn is_image_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|v| v.trim_start().starts_with("image/"))
}
