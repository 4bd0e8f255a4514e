use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};

use crate::downloader::ProgressFn;

const TEMPLATE: &str = "{msg} [{bar:30}] {bytes}/{total_bytes} ({bytes_per_sec})";

/// Returns the default progress function: one terminal progress bar per file.
///
/// Downloads run one after another, so a single bar slot is enough; a new
/// source URL replaces the previous bar.
pub fn default_progress_fn() -> ProgressFn {
    let current: Mutex<Option<(String, ProgressBar)>> = Mutex::new(None);

    Arc::new(move |src: &str, downloaded: u64, total: u64, _mib_per_sec: f64, complete: bool| {
        let Ok(mut slot) = current.lock() else {
            return;
        };

        let stale = slot.as_ref().is_none_or(|(active, _)| active != src);
        if stale {
            *slot = Some((src.to_owned(), new_bar(src, total)));
        }

        if let Some((_, bar)) = slot.as_ref() {
            bar.set_position(downloaded);
            if complete {
                bar.finish();
            }
        }
        if complete {
            *slot = None;
        }
    })
}

fn new_bar(src: &str, total: u64) -> ProgressBar {
    let bar = if total > 0 {
        ProgressBar::new(total)
    } else {
        ProgressBar::no_length()
    };
    if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
        bar.set_style(style.progress_chars("=> "));
    }
    let name = src.rsplit('/').next().unwrap_or(src);
    bar.set_message(name.to_owned());
    bar
}
