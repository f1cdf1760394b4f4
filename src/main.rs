// SPDX-License-Identifier: MIT

//! Sportdesk dashboard CLI.
//!
//! Loads the snapshot, prints each sport section, then follows the live
//! change stream until interrupted, reprinting on every applied change.

use std::sync::Arc;

use sportdesk::backend::{Backend, RestBackend};
use sportdesk::config::Config;
use sportdesk::models::{SportEvent, SportType};
use sportdesk::services::{section, sort_live_first, AuthManager, EventFeed};
use sportdesk::time_utils::format_utc_rfc3339;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(backend = %config.backend_url, "Starting sportdesk");

    let backend: Arc<dyn Backend> = Arc::new(
        RestBackend::new(config.backend_url.clone(), config.anon_key.clone())
            .with_poll_interval(std::time::Duration::from_secs(config.poll_interval_secs)),
    );

    let mut auth = AuthManager::new(backend.clone());
    if let (Some(email), Some(password)) = (&config.email, &config.password) {
        auth.sign_in(email, password).await?;
    } else {
        auth.init().await;
    }

    let mut feed = EventFeed::new(backend.clone())
        .with_fetch_timeout(std::time::Duration::from_secs(config.fetch_timeout_secs));
    feed.refetch().await;

    render(&feed, &auth);

    let mut subscription = feed.subscribe().await?;
    loop {
        tokio::select! {
            change = subscription.recv() => {
                match change {
                    Some(change) => {
                        if feed.apply(&change) {
                            render(&feed, &auth);
                        }
                    }
                    None => {
                        tracing::warn!("Change stream closed; last snapshot stays on screen");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Print the preference-filtered dashboard sections.
fn render(feed: &EventFeed, auth: &AuthManager) {
    if let Some(error) = feed.error() {
        println!("!! {error} (retry with a manual refresh)");
    }
    if let Some(at) = feed.last_updated() {
        println!("Last updated: {}", format_utc_rfc3339(at));
    }

    let events = feed.visible(auth.preferences());
    let now = chrono::Utc::now();

    for sport in SportType::ALL {
        let view = section(&events, sport, false, now);
        if view.visible.is_empty() && !view.has_hidden() {
            continue;
        }

        println!("== {} ==", sport);
        let mut ordered = view.visible.clone();
        sort_live_first(&mut ordered);
        for event in ordered {
            println!("  {}", describe(event));
        }
        if view.has_hidden() {
            println!("  ... {} more not shown", view.hidden);
        }
    }
}

fn describe(event: &SportEvent) -> String {
    let mut line = format!(
        "[{:?}] {} @ {}",
        event.status,
        event.title,
        format_utc_rfc3339(event.time)
    );
    if !event.channel.is_empty() {
        line.push_str(&format!(" ({})", event.channel));
    }
    let score = event.meta_str("score");
    if !score.is_empty() {
        line.push_str(&format!(" [{}]", score));
    }
    line
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sportdesk=debug".parse().expect("static directive"))
                .add_directive("info".parse().expect("static directive")),
        )
        .with(format)
        .init();
}
