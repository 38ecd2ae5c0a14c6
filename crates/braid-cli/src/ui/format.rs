//! Size and duration formatting plus the build summary table.

use std::time::Duration;

use console::Term;
use owo_colors::OwoColorize;

/// Format a byte count with the most appropriate unit.
///
/// ```
/// use braid_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", size as u64, UNITS[unit])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}

/// Format a duration as milliseconds, seconds, or minutes.
///
/// ```
/// use std::time::Duration;
/// use braid_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print the written files with their sizes and a total line to stderr.
pub fn print_build_summary(files: &[(String, u64)], duration: Duration) {
    let width = (Term::stderr().size().1 as usize).min(80);

    eprintln!("\n{}", "Build Summary".bold().underline());
    eprintln!("{}", "─".repeat(width));

    for (name, size) in files {
        eprintln!(
            "  {} {} {}",
            "▸".blue(),
            name.bold(),
            format_size(*size).dimmed()
        );
    }

    eprintln!("{}", "─".repeat(width));

    let total: u64 = files.iter().map(|(_, size)| size).sum();
    eprintln!(
        "  {} {} in {}",
        "Total:".bold(),
        format_size(total).green(),
        format_duration(duration).green()
    );
}
