use anyhow::{Context, Result};
use flipper_db::FlipperDb;
use notification_service::{Alert, AlertType, NotificationService};
use steam_market::{SteamMarketClient, SteamMarketConfig};
use tokio::signal::unix::SignalKind;
use tokio::time::{self, MissedTickBehavior};

mod config;
mod scanner;

use config::ScannerConfig;
use scanner::MarketScanner;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,sqlx=warn"));
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        tracing::error!("PANIC: {info}");
    }));

    tracing::info!("🚀 Starting SteamFlipper market scanner");

    let config = ScannerConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Scan interval: {}s", config.check_interval_seconds);
    tracing::info!("  Item pause: {}ms", config.item_pause_ms);
    tracing::info!("  Currency: {}", config.steam_currency);
    tracing::info!("  Steam fee: {:.0}%", config.flip.steam_fee * 100.0);
    tracing::info!(
        "  Min ROI: {:.1}% | Min profit: {:.2} | Min volume: {}",
        config.flip.min_roi * 100.0,
        config.flip.min_profit,
        config.flip.min_volume
    );
    tracing::info!("  Notify cooldown: {} min", config.notify_cooldown_minutes);

    if !FlipperDb::exists(&config.database_url) {
        tracing::info!("Creating new database at {}", config.database_url);
    }
    let db = FlipperDb::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;
    tracing::info!("✅ Database ready: {}", config.database_url);

    let steam = SteamMarketClient::with_config(SteamMarketConfig {
        currency: config.steam_currency,
        ..SteamMarketConfig::default()
    })?;
    let notifier = NotificationService::new(&config.notifications);
    let scanner = MarketScanner::new(&config, db, steam, notifier);

    let watchlist_size = scanner.watchlist_size().await?;
    tracing::info!("📋 Watchlist: {} items", watchlist_size);

    scanner.notifier().send_alert(Alert::new(
        AlertType::ScannerStarted {
            watchlist_size,
            interval_secs: config.check_interval_seconds,
        },
        "SteamFlipper scanner started",
        format!(
            "Currency {} | Min ROI {:.1}% | Cooldown {} min",
            config.steam_currency,
            config.flip.min_roi * 100.0,
            config.notify_cooldown_minutes
        ),
    ));

    let mut interval = time::interval(config.check_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut sigterm = tokio::signal::unix::signal(SignalKind::terminate())?;
    let shutdown = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received SIGINT");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM");
            }
        }
    };
    tokio::pin!(shutdown);

    let mut cycles: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                cycles += 1;
                if let Err(e) = scanner.run_cycle().await {
                    tracing::error!("Error in scan cycle #{}: {:#}", cycles, e);
                    scanner
                        .notifier()
                        .send_alert_async(&Alert::new(
                            AlertType::ScanFailed { reason: format!("{:#}", e) },
                            format!("Scan cycle #{} failed", cycles),
                            e.to_string(),
                        ))
                        .await;
                }
                tracing::info!(
                    "💤 Next scan in {}s",
                    config.check_interval().as_secs()
                );
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received, exiting gracefully...");
                break;
            }
        }
    }

    tracing::info!("Market scanner shut down after {} cycles", cycles);
    Ok(())
}
