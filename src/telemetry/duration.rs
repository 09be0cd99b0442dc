//! Human-readable rendering of the TNC's millisecond counters.

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;

/// Below this, minute-scale durations keep their seconds.
const SECONDS_PRECISION_LIMIT: u64 = 15 * MINUTE;

/// Render a millisecond counter as a compact duration.
///
/// Sub-second remainders are truncated. Precision drops as the value grows:
/// `42s`, `8m56s`, `18m`, `22h30m`.
pub fn humanize_millis(millis: u64) -> String {
    let secs = millis / 1000;

    if secs >= HOUR {
        format!("{}h{}m", secs / HOUR, (secs % HOUR) / MINUTE)
    } else if secs >= SECONDS_PRECISION_LIMIT {
        format!("{}m", secs / MINUTE)
    } else if secs >= MINUTE {
        format!("{}m{}s", secs / MINUTE, secs % MINUTE)
    } else {
        format!("{}s", secs)
    }
}
