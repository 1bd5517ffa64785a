//! Image Cache - fetch files over HTTP and keep a local cache of them
//!
//! Fetches each configured path several times: the first fetch fills the
//! cache, later ones should be answered with 304 and served from memory.

use std::collections::HashMap;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_cache::cli::Cli;
use image_cache::fetch::FetchSource;
use image_cache::{Config, FileFetcher, ReqwestClient};

/// Digests seen for one path, split by where the body came from.
#[derive(Debug, Default)]
struct Digests {
    network: Option<String>,
    cache: Option<String>,
}

/// Why a path failed the end-of-run check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Problem {
    /// Body served from the cache differs from the one fetched
    Mismatch,
    /// Fetched more than once yet never answered from the cache
    NeverCached,
}

/// Paths whose cached copy cannot be trusted, in `urls` order.
///
/// `NeverCached` is only reported when `rounds >= 2`, since a single round
/// never reaches the cache.
fn verify<'a>(
    urls: &'a [String],
    digests: &HashMap<&str, Digests>,
    rounds: usize,
) -> Vec<(&'a str, Problem)> {
    urls.iter()
        .map(String::as_str)
        .filter_map(|url| {
            let seen = digests.get(url);
            match seen.and_then(|d| d.cache.as_ref()) {
                Some(cached) => match seen.and_then(|d| d.network.as_ref()) {
                    Some(fetched) if fetched != cached => Some((url, Problem::Mismatch)),
                    _ => None,
                },
                None if rounds >= 2 => Some((url, Problem::NeverCached)),
                None => None,
            }
        })
        .collect()
}

/// Main entry point.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables, then CLI arguments
/// 2. Initialize tracing subscriber for logging
/// 3. Create the cache store and HTTP client
/// 4. Fetch every path `rounds` times
/// 5. Check that cached bodies match the fetched ones
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().apply(Config::from_env());

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    let default_filter = if config.verbose {
        "image_cache=debug"
    } else {
        "image_cache=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Configuration loaded: host={}, capacity={} bytes, urls={}, rounds={}",
        config.host,
        config.capacity,
        config.urls.len(),
        config.rounds
    );

    let client = ReqwestClient::new(config.scheme.clone()).context("Failed to build HTTP client")?;
    let fetcher = FileFetcher::with_capacity(client, config.capacity, config.host.clone())
        .context("Failed to create cache")?;

    let mut digests: HashMap<&str, Digests> = HashMap::new();
    for url in &config.urls {
        for round in 0..config.rounds {
            let outcome = fetcher
                .fetch(url)
                .await
                .with_context(|| format!("Fetch {} of {} failed", round + 1, url))?;

            let seen = digests.entry(url.as_str()).or_default();
            match outcome.source {
                FetchSource::Network => seen.network = Some(outcome.digest),
                FetchSource::Cache => seen.cache = Some(outcome.digest),
            }
        }
    }

    if config.verbose {
        let cache = fetcher.cache().read().await;
        debug!("Cache contents:\n{}", cache);
        debug!("Cache stats: {}", serde_json::to_string(&cache.stats())?);
    }

    let problems = verify(&config.urls, &digests, config.rounds);
    for &(url, problem) in &problems {
        match problem {
            Problem::Mismatch => error!(url, "Cached file does not match the fetched file"),
            Problem::NeverCached => warn!(url, "File was never served from the cache"),
        }
    }
    if !problems.is_empty() {
        bail!("{} file(s) failed the cache check", problems.len());
    }

    info!("Done");
    Ok(())
}
