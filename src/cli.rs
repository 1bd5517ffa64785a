//! Command line arguments, layered over [`Config`].

use clap::Parser;

use crate::config::Config;

/// Fetch files over HTTP and keep a local cache of them.
#[derive(Debug, Parser)]
#[command(name = "image_cache", version, about)]
pub struct Cli {
    /// Host in hostname[:port] format
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Path to fetch, starting with / (repeatable)
    #[arg(short = 'U', long = "url")]
    pub urls: Vec<String>,

    /// Cache capacity in bytes
    #[arg(short, long)]
    pub capacity: Option<usize>,

    /// URL scheme, https or http
    #[arg(long)]
    pub scheme: Option<String>,

    /// How many times each path is fetched
    #[arg(long)]
    pub rounds: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Overrides `config` with every argument that was given.
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(host) = self.host {
            config.host = host;
        }
        if !self.urls.is_empty() {
            config.urls = self.urls;
        }
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(scheme) = self.scheme {
            config.scheme = scheme;
        }
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        config.verbose |= self.verbose;
        config
    }
}
