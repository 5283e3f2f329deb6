//! Reversible encoding for API keys at rest.
//!
//! This only keeps keys from showing up as plain text when someone opens
//! the store file. Anyone with read access can decode them.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub fn obfuscate(secret: &str) -> String {
    STANDARD.encode(secret.as_bytes())
}

/// Decode a stored secret. Anything that isn't valid base64 UTF-8 reads
/// as no key at all.
pub fn reveal(stored: &str) -> Option<String> {
    if stored.is_empty() {
        return None;
    }
    let bytes = STANDARD.decode(stored).ok()?;
    String::from_utf8(bytes).ok().filter(|s| !s.is_empty())
}
