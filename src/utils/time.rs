use chrono::{DateTime, Utc};

/// Human-readable date used in exports, e.g. `Mar 5, 2026`.
pub fn display_date(dt: DateTime<Utc>) -> String {
    dt.format("%b %-d, %Y").to_string()
}
