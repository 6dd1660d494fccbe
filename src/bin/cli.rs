//! pressping CLI
//!
//! Watches a press release page and posts new releases to a webhook.

use std::io;
use std::path::PathBuf;

use clap::Parser;
use pressping::{
    config,
    error::Result,
    models::{ClientConfig, PollSettings, SiteOverrides},
    pipeline::Poller,
    services::{HttpFetcher, WebhookNotifier},
    utils::http,
};

/// pressping - Press Release Watcher
#[derive(Parser, Debug)]
#[command(
    name = "pressping",
    version,
    about = "Monitor a press release site and notify a webhook about new releases"
)]
struct Cli {
    /// Path to the config file (.json or .toml)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Set a new URL for press releases
    #[arg(long)]
    url: Option<String>,

    /// Set a new notification webhook URL
    #[arg(long)]
    webhook: Option<String>,

    /// Set a new CSS selector for publication dates ("" clears it)
    #[arg(long)]
    date_selector: Option<String>,

    /// Set the number of links checked in case date checking fails
    #[arg(long)]
    num_links: Option<usize>,

    /// Seconds between each check for a new press release
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    delay: u64,

    /// Keep the previous links when a check finds none
    #[arg(long)]
    keep_baseline_on_empty: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> SiteOverrides {
        SiteOverrides {
            url: self.url.clone(),
            notify_url: self.webhook.clone(),
            date_selector: self.date_selector.clone(),
            num_links: self.num_links,
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("pressping starting...");

    let site = config::resolve_site(
        &cli.config,
        &cli.overrides(),
        io::stdin().lock(),
        io::stdout(),
    )
    .inspect_err(|e| log::error!("{}", e))?;

    log::info!("Current config: {}", site);

    if cli.show_config {
        return Ok(());
    }

    let client = http::create_client(&ClientConfig::default())?;
    let fetcher = HttpFetcher::new(client.clone());
    let notifier = WebhookNotifier::new(client);
    let settings = PollSettings {
        delay_secs: cli.delay,
        keep_baseline_on_empty: cli.keep_baseline_on_empty,
    };

    let poller = Poller::new(site, &fetcher, &notifier, settings);
    if let Some(note) = poller.extractor().setup_note() {
        log::info!("{}", note);
    }

    log::info!(
        "Checking {} every {}s",
        poller.site().url,
        cli.delay
    );
    poller.run().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_defaults_to_fifteen() {
        let cli = Cli::try_parse_from(["pressping"]).unwrap();
        assert_eq!(cli.delay, 15);
    }

    #[test]
    fn test_zero_delay_is_rejected() {
        assert!(Cli::try_parse_from(["pressping", "--delay", "0"]).is_err());
        assert!(Cli::try_parse_from(["pressping", "--delay", "1"]).is_ok());
    }
}
