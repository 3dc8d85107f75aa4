//! calfeed - calendar data source feeds
//!
//! Command-line host: loads configuration, runs one feed and prints the
//! events it produces.

use anyhow::Context;
use calfeed_domain::{CalendarEvent, PluginConfig};
use calfeed_infra::config;
use calfeed_lib::cli::{self, Commands};
use calfeed_lib::{list_feeds, parse_setting, run_feed, utils, AppContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (cli, dotenv) =
        cli::load_env_then_parse(None, std::env::args_os()).unwrap_or_else(|err| err.exit());
    utils::logging::init(cli.log_json);

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) => tracing::debug!(error = %err, "no .env loaded"),
    }

    let host = config::load(cli.config).context("failed to load configuration")?;
    let ctx = AppContext::new(host).context("failed to initialize")?;

    match cli.command {
        Commands::List { json } => {
            let feeds = list_feeds(&ctx);
            if json {
                println!("{}", serde_json::to_string_pretty(&feeds)?);
            } else {
                for feed in feeds {
                    let marker = if feed.configured { "*" } else { " " };
                    println!("{marker} {:<26} {}", feed.id, feed.summary);
                }
            }
        }
        Commands::Run { feed, settings, json } => {
            let mut overrides = PluginConfig::new();
            for raw in &settings {
                let (key, value) = parse_setting(raw)?;
                overrides.insert(key, value);
            }

            let events = run_feed(&ctx, &feed, overrides)
                .await
                .with_context(|| format!("feed `{feed}` failed"))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                print_events(&events);
            }
        }
    }

    Ok(())
}

fn print_events(events: &[CalendarEvent]) {
    if events.is_empty() {
        println!("(no events)");
        return;
    }

    for event in events {
        println!("{}  {}", event.start_date(), event.title());
        for line in event.notes().lines().filter(|line| !line.trim().is_empty()) {
            println!("    {line}");
        }
        if let Some(href) = event.href() {
            println!("    {href}");
        }
    }
}
