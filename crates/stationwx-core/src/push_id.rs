//! Timestamp decoding for push-style record keys
//!
//! Keys written by the station firmware start with eight characters that
//! encode the creation time in milliseconds, most significant digit first.
//! Anything after the prefix is random tie-breaking and carries no time.

use chrono::{DateTime, TimeZone, Utc};

/// Digit alphabet; a character's index is its value
pub const PUSH_CHARS: &str = "-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Number of leading key characters holding the timestamp
pub const TIMESTAMP_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("key too short: {len} characters, need {TIMESTAMP_LEN}")]
    TooShort { len: usize },

    #[error("invalid key character {ch:?} at position {position}")]
    InvalidChar { ch: char, position: usize },

    #[error("decoded timestamp {0} ms is out of range")]
    OutOfRange(i64),
}

fn digit_value(ch: char) -> Option<i64> {
    PUSH_CHARS.find(ch).map(|idx| idx as i64)
}

/// Decode the millisecond timestamp held in the first eight key characters
pub fn decode(key: &str) -> Result<i64, DecodeError> {
    let prefix: Vec<char> = key.chars().take(TIMESTAMP_LEN).collect();
    if prefix.len() < TIMESTAMP_LEN {
        return Err(DecodeError::TooShort { len: prefix.len() });
    }

    prefix
        .into_iter()
        .enumerate()
        .try_fold(0i64, |acc, (position, ch)| {
            let digit = digit_value(ch).ok_or(DecodeError::InvalidChar { ch, position })?;
            Ok(acc * 64 + digit)
        })
}

/// Decode a key into a UTC instant
pub fn decode_instant(key: &str) -> Result<DateTime<Utc>, DecodeError> {
    let millis = decode(key)?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(DecodeError::OutOfRange(millis))
}

/// Encode a millisecond timestamp as an eight character key prefix.
///
/// Negative values clamp to zero and values beyond `64^8 - 1` keep only
/// their low 48 bits, mirroring what fits in the prefix.
pub fn encode(millis: i64) -> String {
    let alphabet = PUSH_CHARS.as_bytes();
    let mut remaining = millis.max(0);
    let mut out = [b'-'; TIMESTAMP_LEN];
    for slot in out.iter_mut().rev() {
        *slot = alphabet[(remaining % 64) as usize];
        remaining /= 64;
    }
    out.iter().map(|&b| b as char).collect()
}
