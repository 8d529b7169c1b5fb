use flipper_core::steam_market_url;

use crate::{Alert, AlertType};

pub struct TelegramTemplate;

impl TelegramTemplate {
    /// Render an alert as Telegram HTML (`parse_mode=HTML`).
    pub fn render(alert: &Alert) -> String {
        match &alert.alert_type {
            AlertType::FlipFound {
                app_id,
                item_name,
                buy_price,
                sell_price,
                net_profit,
                profit_pct,
                volume,
                risk_level,
            } => {
                let url = steam_market_url(*app_id, item_name);
                format!(
                    "<b>{name}</b>\n\
                     {badge} Risk: <b>{risk}</b>\n\
                     💳 Buy: {buy_price:.2} ₽\n\
                     💸 Sell: {sell_price:.2} ₽\n\
                     🤑 <b>Profit: +{net_profit:.2} ₽ ({pct:.2}%)</b>\n\
                     📦 Volume: {volume}\n\
                     <a href=\"{url}\">Open on Steam Market</a>",
                    name = escape_html(item_name),
                    badge = risk_level.badge(),
                    risk = risk_level,
                    pct = profit_pct * 100.0,
                    url = escape_html(&url),
                )
            }
            AlertType::ScannerStarted {
                watchlist_size,
                interval_secs,
            } => format!(
                "<b>{}</b>{}\nWatchlist: {} items | Scan interval: {}s",
                escape_html(&alert.title),
                message_line(&alert.message),
                watchlist_size,
                interval_secs
            ),
            AlertType::ScanFailed { reason } => format!(
                "<b>{}</b>{}\n<code>{}</code>\n<i>Scanner is still running.</i>",
                escape_html(&alert.title),
                message_line(&alert.message),
                escape_html(reason)
            ),
        }
    }
}

/// Free-text message as its own line; empty messages add nothing.
fn message_line(message: &str) -> String {
    if message.trim().is_empty() {
        return String::new();
    }
    format!("\n{}", escape_html(message.trim()))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
