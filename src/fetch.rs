use std::time::Duration;

/// Per-request timeout for scoring pages. Keeps a bad page from
/// stalling a whole poll cycle.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Blocking HTTP fetcher for third-party scoring pages.
///
/// One instance per watchdog; the underlying client reuses connections
/// across poll cycles.
pub struct ScoreFetcher {
    client: reqwest::blocking::Client,
}

impl ScoreFetcher {
    pub fn new() -> Result<Self, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| format!("HTTP client init error: {}", e))?;
        Ok(ScoreFetcher { client })
    }

    /// Fetch raw markup from a scoring source URL.
    ///
    /// Network failures and non-success statuses are errors; the
    /// watchdog treats them as transient and retries next cycle.
    pub fn fetch(&self, url: &str) -> Result<String, String> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| format!("Fetch error for {}: {}", url, e))?;
        let response = response
            .error_for_status()
            .map_err(|e| format!("Bad status from {}: {}", url, e))?;
        response
            .text()
            .map_err(|e| format!("Body read error for {}: {}", url, e))
    }
}
