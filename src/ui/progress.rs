//! Progress indicators for registry lookups
//!
//! Uses `linya` for allocation-free, concurrency-friendly progress bars drawn on stderr.

use linya::{Bar, Progress};
use std::io::IsTerminal;
use std::sync::{Arc, Mutex};

/// Thread-safe progress bar for concurrent registry lookups
#[derive(Clone)]
pub struct LookupProgress {
  progress: Arc<Mutex<Progress>>,
  bar: Arc<Bar>,
}

impl LookupProgress {
  /// Create a new progress bar over `total` lookups
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self {
      progress: Arc::new(Mutex::new(progress)),
      bar: Arc::new(bar),
    }
  }

  /// Progress bar only when stderr is interactive and there is something to show
  pub fn interactive(total: usize, label: impl Into<String>) -> Option<Self> {
    (total > 0 && std::io::stderr().is_terminal()).then(|| Self::new(total, label))
  }

  /// Increment progress by 1 (thread-safe)
  pub fn inc(&self) {
    if let Ok(mut progress) = self.progress.lock() {
      progress.inc_and_draw(&self.bar, 1);
    }
  }
}
