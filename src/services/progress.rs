use crate::core::story::GenerationProgress;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc::UnboundedSender;

pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: GenerationProgress);
}

/// Forwards updates to a channel. A dropped receiver is not an error.
impl ProgressSink for UnboundedSender<GenerationProgress> {
    fn report(&self, progress: GenerationProgress) {
        let _ = self.send(progress);
    }
}

/// Terminal progress bar measured in percent.
pub struct ProgressBarSink {
    pb: ProgressBar,
    title_shown: AtomicBool,
}

impl ProgressBarSink {
    pub fn new() -> Result<Self> {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")?
                .progress_chars("#>-"),
        );
        Ok(Self {
            pb,
            title_shown: AtomicBool::new(false),
        })
    }

    pub fn finish(&self) {
        self.pb.finish_with_message("Story complete");
    }
}

impl ProgressSink for ProgressBarSink {
    fn report(&self, progress: GenerationProgress) {
        if let Some(title) = &progress.partial_title {
            if !self.title_shown.swap(true, Ordering::Relaxed) {
                self.pb.println(format!("Title: {}", title));
            }
        }
        self.pb.set_position(progress.percent_complete.round() as u64);
        self.pb.set_message(progress.status_message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards_updates() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.report(GenerationProgress::new("Dreaming up a title...", 10.0));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.status_message, "Dreaming up a title...");
        assert_eq!(received.percent_complete, 10.0);
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<GenerationProgress>();
        drop(rx);
        tx.report(GenerationProgress::new("Binding the book!", 100.0));
    }

    #[test]
    fn test_progress_bar_sink_tracks_percent() {
        let sink = ProgressBarSink::new().unwrap();
        sink.report(GenerationProgress::new("Writing page 1 of 3...", 40.0));
        assert_eq!(sink.pb.position(), 40);
        sink.report(GenerationProgress::new("Illustrating page 1 of 3...", 48.3));
        assert_eq!(sink.pb.position(), 48);
        sink.finish();
    }
}
