//! Deduplication fingerprinting
//!
//! Derives a stable key from a failure's type, the shape of its first few
//! stack frames, and a digit-normalized message. Two failures with the
//! same cause collapse to the same fingerprint across repeated invocations
//! and process restarts; the hash has no time- or instance-dependent
//! input.

use devrelay_core::domain::StackFrame;
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

/// Only the leading frames participate; bounds cost and tolerates deep
/// recursive stacks.
const MAX_FINGERPRINT_FRAMES: usize = 10;

/// Bytes of the digest carried into the fingerprint.
const FINGERPRINT_BYTES: usize = 6;

/// Computes the deduplication fingerprint for a failure.
///
/// Deterministic and cheap. Never fails: if the digest pipeline somehow
/// produces nothing usable, a random identifier is substituted so report
/// delivery is never blocked; deduplication then degrades to "none" for
/// that report.
pub fn fingerprint(
    exception_class: &str,
    frames: &[StackFrame],
    message: Option<&str>,
) -> String {
    match try_fingerprint(exception_class, frames, message) {
        Some(fp) => fp,
        None => {
            warn!("Fingerprint digest produced no output, using random fallback");
            random_fallback()
        }
    }
}

fn try_fingerprint(
    exception_class: &str,
    frames: &[StackFrame],
    message: Option<&str>,
) -> Option<String> {
    let mut normalized = String::with_capacity(256);
    normalized.push_str(exception_class);
    normalized.push(':');

    for frame in frames.iter().take(MAX_FINGERPRINT_FRAMES) {
        normalized.push_str(&frame.qualified_name());
        normalized.push('|');
    }

    if let Some(message) = message {
        normalized.push_str("MSG:");
        normalized.push_str(&normalize_digits(message));
    }

    let hash = Sha256::digest(normalized.as_bytes());
    let prefix = hash.get(..FINGERPRINT_BYTES)?;

    let mut hex = String::with_capacity(FINGERPRINT_BYTES * 2);
    for byte in prefix {
        use std::fmt::Write;
        write!(hex, "{byte:02X}").ok()?;
    }
    Some(format!("ERR-{hex}"))
}

/// Replaces every decimal digit with `#` so messages differing only in
/// embedded ids, counts or offsets collapse together.
fn normalize_digits(message: &str) -> String {
    message
        .chars()
        .map(|c| if c.is_ascii_digit() { '#' } else { c })
        .collect()
}

fn random_fallback() -> String {
    let id = Uuid::new_v4().to_string();
    format!("ERR-{}", &id[..8])
}
