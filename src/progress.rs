//! Byte progress bars for uploads and downloads

use indicatif::{ProgressBar, ProgressStyle};

const SIZED_TEMPLATE: &str =
    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const UNSIZED_TEMPLATE: &str = "{msg} {spinner} {bytes} ({bytes_per_sec})";

/// Create a transfer bar. Without a known length it falls back to a spinner.
pub fn transfer_bar(label: &str, total: Option<u64>) -> ProgressBar {
    let (bar, template) = match total {
        Some(len) if len > 0 => (ProgressBar::new(len), SIZED_TEMPLATE),
        _ => (ProgressBar::no_length(), UNSIZED_TEMPLATE),
    };

    // Templates are constants, a parse failure would fall back to the default style.
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar.set_message(label.to_string());
    bar
}
