use std::sync::LazyLock;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use crate::FlipperError;

pub const STEAM_MARKET_LISTINGS_URL: &str = "https://steamcommunity.com/market/listings";

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("price pattern is valid"));

static STEAM_MARKET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/market/listings/(?P<appid>[0-9]+)/(?P<hash>.+)$")
        .expect("listing pattern is valid")
});

/// Unreserved characters stay literal; everything else (including `/`) is escaped.
const MARKET_NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Convert a Steam price string to a number.
///
/// Example: `"1 234,56 руб."` → `1234.56`. Unparsable input yields `0.0`.
pub fn parse_price(price_str: &str) -> f64 {
    let cleaned: String = price_str
        .chars()
        .filter(|c| *c != ' ' && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    PRICE_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// Listing page URL for an item.
pub fn steam_market_url(app_id: i64, market_hash_name: &str) -> String {
    format!(
        "{}/{}/{}",
        STEAM_MARKET_LISTINGS_URL,
        app_id,
        utf8_percent_encode(market_hash_name, MARKET_NAME_ENCODE_SET)
    )
}

/// Extract `(app_id, market_hash_name)` from a listing page URL.
pub fn parse_steam_market_url(url: &str) -> Result<(i64, String), FlipperError> {
    let caps = STEAM_MARKET_RE
        .captures(url)
        .ok_or(FlipperError::InvalidMarketUrl)?;

    let app_id: i64 = caps["appid"]
        .parse()
        .map_err(|_| FlipperError::InvalidMarketUrl)?;
    let name = percent_decode_str(&caps["hash"])
        .decode_utf8_lossy()
        .into_owned();

    Ok((app_id, name))
}
