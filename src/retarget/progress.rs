//! Stage progress for a retarget pass.
//!
//! The engine calls [`Progress::stage`] before each [`RetargetStage`] and
//! [`Progress::finish`] once the skeleton is complete, so a callback sees
//! `(0, 8, "prune")` through `(8, 8, "done")`.
//!
//! ```
//! use metarig::retarget::Progress;
//!
//! let progress = Progress::new(|done, total, stage| {
//!     eprintln!("[{}/{}] {}", done, total, stage);
//! });
//! progress.report(0, 8, "prune");
//! ```

use std::fmt;
use std::sync::Arc;

use super::engine::RetargetStage;

type Callback = dyn Fn(usize, usize, &str) + Send + Sync;

/// Receives `(stages_done, stage_count, stage_name)`.
///
/// Cloning shares the callback.
#[derive(Clone, Default)]
pub struct Progress {
    callback: Option<Arc<Callback>>,
}

impl Progress {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Arc::new(callback)),
        }
    }

    /// A reporter that discards updates.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether updates are discarded.
    pub fn is_silent(&self) -> bool {
        self.callback.is_none()
    }

    /// Forward a raw update to the callback.
    #[inline]
    pub fn report(&self, done: usize, total: usize, message: &str) {
        if let Some(callback) = &self.callback {
            callback(done, total, message);
        }
    }

    /// Announce that `stage` is about to run.
    pub(crate) fn stage(&self, stage: RetargetStage) {
        self.report(stage.index(), RetargetStage::ALL.len(), stage.name());
    }

    /// Announce that every stage has run.
    pub(crate) fn finish(&self) {
        let total = RetargetStage::ALL.len();
        self.report(total, total, "done");
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress").field("silent", &self.is_silent()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_stage_positions() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |done, total, name| {
            sink.lock().unwrap().push((done, total, name.to_string()));
        });
        let shared = progress.clone();

        progress.stage(RetargetStage::Correspondence);
        shared.stage(RetargetStage::Heuristics);
        progress.finish();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (2, 8, "correspondence".to_string()),
                (7, 8, "heuristics".to_string()),
                (8, 8, "done".to_string()),
            ]
        );
    }

    #[test]
    fn test_silent_reporter() {
        let progress = Progress::none();
        assert!(progress.is_silent());
        progress.stage(RetargetStage::Prune);
        progress.finish();
        assert!(!Progress::new(|_, _, _| {}).is_silent());
    }
}
