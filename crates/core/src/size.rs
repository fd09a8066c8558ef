//! Human-readable byte counts.

const UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Formats a byte count with one decimal and a binary (1024) unit step.
///
/// Values below 1024 are printed as whole bytes.
///
/// # Examples
///
/// ```
/// use stowage_core::human_size;
///
/// assert_eq!(human_size(512), "512 B");
/// assert_eq!(human_size(2048), "2.0 kB");
/// assert_eq!(human_size(1_572_864), "1.5 MB");
/// ```
pub fn human_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{} {}", bytes, UNITS[0]);
    }

    let mut value = bytes;
    let mut unit = 1;
    while value >= 1024 * 1024 && unit < UNITS.len() - 1 {
        value /= 1024;
        unit += 1;
    }

    format!("{:.1} {}", value as f64 / 1024.0, UNITS[unit])
}
