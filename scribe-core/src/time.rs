//! Wall-clock timestamps stamped onto elements, paragraphs and tape lines.

use chrono::Local;

/// Format used for every persisted timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Current local time formatted with [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
