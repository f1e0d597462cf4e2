//! Progress bars for setup phases and batches.

use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {prefix} | {msg}";

/// Creates a progress bar of `len` steps, or a hidden one when disabled.
pub(crate) fn progress_bar(len: usize, prefix: impl Into<String>, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template(TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    let bar = ProgressBar::new(len as u64).with_style(style);
    bar.set_prefix(prefix.into());
    bar
}
