//! Terminal output helpers.
//!
//! Status lines go to stderr with a one-glyph prefix; sizes and durations
//! are formatted for the build summary. Color support degrades cleanly in
//! CI and when output is piped.

mod format;
mod messages;

pub use format::{format_duration, format_size, print_build_summary};
pub use messages::{error, info, success, warning};

/// Check whether the process runs under a CI service.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
}

/// Whether colored output should be used.
///
/// `NO_COLOR` disables colors, `FORCE_COLOR` forces them; otherwise CI
/// runs stay plain and interactive terminals get colors when the terminal
/// reports support.
pub fn should_use_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }
    if is_ci() {
        return false;
    }
    console::Term::stderr().features().colors_supported()
}

/// Initialize color handling for the process.
///
/// `owo-colors` consults `NO_COLOR` and terminal capabilities on its own;
/// this runs the detection once up front so the first status line does not
/// pay for it.
pub fn init_colors() {
    let _ = should_use_color();
}
