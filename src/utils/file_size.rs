pub const KIB: u64 = 1024;
pub const MIB: u64 = 1024 * KIB;

/// Human readable size, e.g. `512 B`, `1.50 KB`, `100.00 MB`.
pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = size as f64;
    let mut unit_index = 0;

    while value >= 1024.0 && unit_index < UNITS.len() - 1 {
        value /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit_index])
    }
}

/// Whole kilobytes, the way the selection list shows sizes.
pub fn format_kib(size: u64) -> String {
    format!("{} KB", (size as f64 / KIB as f64).round() as u64)
}
