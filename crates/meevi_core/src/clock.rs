//! Wall-clock timestamps stored on Meevi records.

/// Current time in epoch milliseconds, the unit of every `*_at` column.
pub fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
