//! HTTP GET for the tag list and tag detail pages.
//!
//! Uses the curl crate (libcurl). Pages are small HTML documents, so the body
//! is collected in memory; archives go through [`crate::downloader`] instead.

use std::time::Duration;

use crate::error::HarvestError;

const USER_AGENT: &str = concat!("icon-harvest/", env!("CARGO_PKG_VERSION"));

/// Bytes/sec below which a transfer counts as stalled.
const LOW_SPEED_LIMIT: u32 = 1024;

/// Timeouts applied to every curl handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Upper bound on the whole request.
    pub timeout: Duration,
    /// How long a transfer may stay below `LOW_SPEED_LIMIT` before aborting.
    pub low_speed_time: Duration,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(600),
            low_speed_time: Duration::from_secs(60),
        }
    }
}

impl CurlOptions {
    pub(crate) fn apply(&self, easy: &mut curl::easy::Easy) -> Result<(), curl::Error> {
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.useragent(USER_AGENT)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.low_speed_limit(LOW_SPEED_LIMIT)?;
        easy.low_speed_time(self.low_speed_time)?;
        easy.timeout(self.timeout)?;
        Ok(())
    }
}

/// Status and body of a page GET.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u32,
    pub body: String,
}

/// Performs a GET and returns the status with the (lossily decoded) body.
///
/// Follows redirects. Runs in the current thread; call from `spawn_blocking`
/// if used from async code.
pub fn fetch_page(url: &str, curl: &CurlOptions) -> Result<PageResponse, curl::Error> {
    let mut body: Vec<u8> = Vec::new();

    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    curl.apply(&mut easy)?;

    {
        let mut transfer = easy.transfer();
        transfer.write_function(|data| {
            body.extend_from_slice(data);
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let status = easy.response_code()?;
    Ok(PageResponse {
        status,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

/// Fetches a page and insists on HTTP 200. `context` names the page in errors
/// (e.g. "tags page", "tag page 'arrows'").
pub fn fetch_html(url: &str, context: &str, curl: &CurlOptions) -> Result<String, HarvestError> {
    let page = fetch_page(url, curl).map_err(|source| HarvestError::FetchNetwork {
        context: context.to_string(),
        source,
    })?;
    if page.status != 200 {
        return Err(HarvestError::FetchStatus {
            context: context.to_string(),
            status: page.status,
        });
    }
    tracing::debug!(url, bytes = page.body.len(), "fetched {}", context);
    Ok(page.body)
}
