//! Progress bar plumbing for transfer operations
//!
//! Adapts the transfer engine's progress sink to an indicatif bar. Units
//! report byte increments concurrently; indicatif's counters are atomic, so
//! no extra locking is needed on the hot path. In quiet, JSON, or
//! --no-progress mode the sink discards updates.

use std::sync::Mutex;

use osc_core::TransferProgress;

use super::OutputConfig;

/// Byte-level progress bar for the transfer engine
#[derive(Debug)]
pub struct TransferBar {
    config: OutputConfig,
    bar: Mutex<Option<indicatif::ProgressBar>>,
}

impl TransferBar {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            bar: Mutex::new(None),
        }
    }

    /// Whether a bar is currently drawn
    pub fn is_visible(&self) -> bool {
        self.bar.lock().map(|b| b.is_some()).unwrap_or(false)
    }
}

impl TransferProgress for TransferBar {
    fn start(&self, total_bytes: u64) {
        if !self.config.progress_enabled() {
            return;
        }
        let bar = indicatif::ProgressBar::new(total_bytes);
        bar.set_style(
            indicatif::ProgressStyle::default_bar()
                .template("{spinner:.green} |{bar:40.cyan/blue}| {bytes}/{total_bytes} ({eta})")
                .expect("valid template")
                .progress_chars("=>."),
        );
        *self.bar.lock().expect("progress bar lock poisoned") = Some(bar);
    }

    fn add(&self, bytes: u64) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                bar.inc(bytes);
            }
        }
    }

    fn finish(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_suppressed_in_quiet_mode() {
        let bar = TransferBar::new(OutputConfig {
            quiet: true,
            ..Default::default()
        });
        bar.start(100);
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_bar_suppressed_in_json_mode() {
        let bar = TransferBar::new(OutputConfig {
            json: true,
            ..Default::default()
        });
        bar.start(100);
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_bar_suppressed_with_no_progress() {
        let bar = TransferBar::new(OutputConfig {
            no_progress: true,
            ..Default::default()
        });
        bar.start(100);
        assert!(!bar.is_visible());
    }

    #[test]
    fn test_bar_lifecycle() {
        let bar = TransferBar::new(OutputConfig::default());
        bar.start(100);
        assert!(bar.is_visible());
        bar.add(40);
        bar.add(60);
        bar.finish();
        assert!(!bar.is_visible());
    }
}
