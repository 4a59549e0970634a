//! Parsing of user-entered item rates

use regex::Regex;

use crate::error::{Result, TrackerError};
use crate::models::ItemRate;

/// Parse `ITEM=RATE` (or `ITEM:RATE`) into an item entry
pub fn parse_item_rate(text: &str) -> Result<ItemRate> {
    // Names may contain spaces, dots and even '=', the separator is the one
    // directly before the trailing number
    let item_rate_re = Regex::new(r"^\s*(.+?)\s*[=:]\s*(\d+(?:\.\d*)?|\.\d+)\s*$")?;
    let caps = item_rate_re
        .captures(text)
        .ok_or_else(|| TrackerError::MalformedItemRate(text.to_string()))?;

    let rate = caps[2]
        .parse::<f64>()
        .map_err(|_| TrackerError::MalformedItemRate(text.to_string()))?;
    Ok(ItemRate::new(caps[1].to_string(), rate))
}

/// Parse a comma separated list of `ITEM=RATE` entries. Blank input gives an empty list.
pub fn parse_item_list(text: &str) -> Result<Vec<ItemRate>> {
    text.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_item_rate)
        .collect()
}
