//! Shared HTTP request helpers for CLI commands.

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub fn base_url(port: u16) -> String {
    format!("http://127.0.0.1:{}", port)
}

pub async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to meshgated at {} (is it running?)", url))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("{} returned {}: {}", url, status, body);
    }

    resp.json::<T>().await.context("failed to parse response")
}
