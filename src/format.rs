//! Formatting Helpers
//!
//! Pure functions turning raw message fields into display strings.

use chrono::{DateTime, TimeZone, Utc};

use crate::chains;
use crate::types::Message;

const ELLIPSIS: char = '…';

/// Absolute UTC time for a unix-seconds timestamp
pub fn format_timestamp(secs: i64) -> String {
    match Utc.timestamp_opt(secs, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => secs.to_string(),
    }
}

/// Age of a unix-seconds timestamp relative to `now`
///
/// Timestamps in the future (clock skew) read as "just now".
pub fn format_relative(secs: i64, now: DateTime<Utc>) -> String {
    let delta = now.timestamp() - secs;

    if delta < 10 {
        "just now".to_string()
    } else if delta < 60 {
        format!("{}s ago", delta)
    } else if delta < 3600 {
        format!("{}m ago", delta / 60)
    } else if delta < 86_400 {
        format!("{}h ago", delta / 3600)
    } else if delta < 30 * 86_400 {
        format!("{}d ago", delta / 86_400)
    } else {
        match Utc.timestamp_opt(secs, 0).single() {
            Some(dt) => dt.format("%Y-%m-%d").to_string(),
            None => secs.to_string(),
        }
    }
}

/// Keep `head` leading and `tail` trailing characters around an ellipsis
pub fn truncate_middle(s: &str, head: usize, tail: usize) -> String {
    let len = s.chars().count();
    if len <= head + tail + 1 {
        return s.to_string();
    }

    let start: String = s.chars().take(head).collect();
    let end: String = s.chars().skip(len - tail).collect();
    format!("{}{}{}", start, ELLIPSIS, end)
}

/// `0x1234…abcd`
pub fn shorten_address(address: &str) -> String {
    truncate_middle(address, 6, 4)
}

/// `0x12345678…9abcdef0`
pub fn shorten_hash(hash: &str) -> String {
    truncate_middle(hash, 10, 8)
}

/// Insert thousands separators into a run of ASCII digits
fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Block numbers with grouping, e.g. `19,000,001`
pub fn format_block_number(block: u64) -> String {
    group_digits(&block.to_string())
}

/// Numeric value with grouping and at most four decimals
pub fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.abs() < 0.0001 {
        return if value < 0.0 { "-<0.0001" } else { "<0.0001" }.to_string();
    }

    let fixed = format!("{:.4}", value.abs());
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}", sign, group_decimal(&fixed))
}

/// Group a numeric string without going through floating point
///
/// Strings that are not plain decimals come back unchanged.
pub fn format_numeric_str(raw: &str) -> String {
    let trimmed = raw.trim();
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed),
    };

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let digits_only = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(int_part) || frac_part.is_some_and(|f| !digits_only(f)) {
        return raw.to_string();
    }

    format!("{}{}", sign, group_decimal(unsigned))
}

/// Group the integer part and trim trailing fractional zeros
fn group_decimal(unsigned: &str) -> String {
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (unsigned, ""),
    };

    let int_part = int_part.trim_start_matches('0');
    let int_part = if int_part.is_empty() { "0" } else { int_part };

    if frac_part.is_empty() {
        group_digits(int_part)
    } else {
        format!("{}.{}", group_digits(int_part), frac_part)
    }
}

/// Chain display name for a message
pub fn chain_label(message: &Message) -> String {
    chains::name(message.chain_id).into_owned()
}

/// Explorer link for a message's transaction, if the chain is known
pub fn tx_link(message: &Message) -> Option<String> {
    chains::get(message.chain_id).map(|c| c.tx_url(&message.txn_hash))
}
