use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};

/// The current wall-clock time, clamped so that successive calls never go
/// backwards even if the system clock does.
pub fn now() -> DateTime<Utc> {
    static LAST_MICROS: AtomicI64 = AtomicI64::new(i64::MIN);

    let micros = Utc::now().timestamp_micros();
    let previous = LAST_MICROS.fetch_max(micros, Ordering::Relaxed);
    let micros = micros.max(previous);
    Utc.timestamp_micros(micros)
        .single()
        .unwrap_or_else(Utc::now)
}
