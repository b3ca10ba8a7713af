pub mod bridge;
pub mod collections;
pub mod config;
pub mod photos;
pub mod purchases;

/// Render a unix timestamp for tables.
pub(crate) fn format_time(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
