//! Host identity.
//!
//! The hostname selects the control profile and namespaces every file this
//! host writes (`shortly/<host>`, `triggers/<host>`).  It is reduced to its
//! first label and to characters that are safe as a path component:
//! - `raspberrypi-0.lan` → `raspberrypi-0`
//! - `Pi Zero` → `pi-zero`

use log::warn;

/// Used when the OS cannot tell us who we are.
pub const FALLBACK_HOSTNAME: &str = "localhost";

/// Read the system hostname and sanitize it.
pub fn read_hostname() -> String {
    match hostname::get() {
        Ok(raw) => sanitize(&raw.to_string_lossy()),
        Err(e) => {
            warn!("Cannot read hostname ({}), using {}", e, FALLBACK_HOSTNAME);
            FALLBACK_HOSTNAME.to_string()
        }
    }
}

/// First DNS label, lowercased, with anything outside `[a-z0-9_-]` turned
/// into `-`.  Never empty and at most 63 characters.
pub fn sanitize(raw: &str) -> String {
    let label = raw.trim().split('.').next().unwrap_or_default();
    let name: String = label
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .take(63)
        .collect();
    if name.is_empty() {
        FALLBACK_HOSTNAME.to_string()
    } else {
        name
    }
}
