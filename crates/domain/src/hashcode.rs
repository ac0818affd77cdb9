//! Stable string hash codes used as set-element keys

use crc32fast::Hasher;

/// Hash a string to a non-negative integer.
///
/// The CRC-32 checksum is reinterpreted as a signed 32-bit integer and negated
/// when negative. `i32::MIN` has no positive counterpart and maps to 0.
pub fn string(s: &str) -> i32 {
    let mut hasher = Hasher::new();
    hasher.update(s.as_bytes());
    let v = hasher.finalize() as i32;
    v.checked_abs().unwrap_or(0)
}

/// Hash an ordered list of strings, returning the decimal hash code.
/// Element order matters.
pub fn strings<S: AsRef<str>>(items: &[S]) -> String {
    let mut buf = String::new();
    for s in items {
        buf.push_str(s.as_ref());
        buf.push('-');
    }
    string(&buf).to_string()
}
