//! Query-string parameter handling for untrusted counts.

use crate::{Result, SocialGraphError};

/// Parse an optional count, falling back to `default` when it is absent,
/// non-numeric or negative.
///
/// A digit string too large to represent saturates to `usize::MAX` so the
/// caller's ceiling check rejects it.
pub fn parse_count(raw: Option<&str>, default: usize) -> usize {
    let Some(raw) = raw else {
        return default;
    };
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(v) if v >= 0 => usize::try_from(v).unwrap_or(usize::MAX),
        Err(_) if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) => usize::MAX,
        _ => {
            log::debug!("Ignoring invalid count {:?}, using default {}", raw, default);
            default
        }
    }
}

/// Reject counts above an operational ceiling.
pub fn bounded(value: usize, max: usize, name: &str) -> Result<usize> {
    if value > max {
        return Err(SocialGraphError::InvalidParameter(format!(
            "{} {} exceeds the maximum of {}",
            name, value, max
        )));
    }
    Ok(value)
}
