//! Where the controller's output goes.
//!
//! The controller never prints. It reports through a [`Presenter`]: blocking alerts, the download
//! affordance for a processed file, the debug output region, and busy indicator visibility.

use parking_lot::Mutex;
use url::Url;

use crate::download::ProcessedFile;

pub trait Presenter: Send + Sync {
    /// Show a message the user must acknowledge.
    fn alert(&self, message: &str);

    /// Offer a processed file for download.
    fn show_download(&self, file: &ProcessedFile);

    /// Replace the contents of the debug output region.
    fn show_debug(&self, text: &str);

    /// Informational status line, e.g. where a processed file was saved.
    fn notice(&self, _message: &str) {}

    /// Busy indicator visibility changed.
    fn set_busy(&self, _visible: bool) {}
}

/// Terminal presenter: alerts go to stderr, results to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn alert(&self, message: &str) {
        eprintln!("{message}");
    }

    fn show_download(&self, file: &ProcessedFile) {
        println!("Download {} ({} bytes): {}", file.filename(), file.len(), file.url());
    }

    fn show_debug(&self, text: &str) {
        println!("{text}");
    }

    fn notice(&self, message: &str) {
        println!("{message}");
    }

    fn set_busy(&self, visible: bool) {
        if visible {
            eprintln!("Processing...");
        }
    }
}

/// Something a [`Presenter`] was asked to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    Alert(String),
    Download { filename: String, url: Url },
    Debug(String),
    Notice(String),
    Busy(bool),
}

/// Presenter that records every call, for tests and embedding.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                PresenterEvent::Alert(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    /// Contents of the debug region, i.e. the last debug text shown.
    pub fn debug_region(&self) -> Option<String> {
        self.events.lock().iter().rev().find_map(|event| match event {
            PresenterEvent::Debug(text) => Some(text.clone()),
            _ => None,
        })
    }
}

impl Presenter for RecordingPresenter {
    fn alert(&self, message: &str) {
        self.events.lock().push(PresenterEvent::Alert(message.to_string()));
    }

    fn show_download(&self, file: &ProcessedFile) {
        self.events.lock().push(PresenterEvent::Download {
            filename: file.filename().to_string(),
            url: file.url().clone(),
        });
    }

    fn show_debug(&self, text: &str) {
        self.events.lock().push(PresenterEvent::Debug(text.to_string()));
    }

    fn notice(&self, message: &str) {
        self.events.lock().push(PresenterEvent::Notice(message.to_string()));
    }

    fn set_busy(&self, visible: bool) {
        self.events.lock().push(PresenterEvent::Busy(visible));
    }
}
