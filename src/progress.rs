//! Job progress shared between the background translation task and whoever
//! polls it.
//!
//! The tracker is a map from package id to the last reported [`Progress`].
//! Clones share the same map, so the workflow hands one clone to the job and
//! keeps another for readers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

pub const IDLE_MESSAGE: &str = "Idle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub message: String,
    pub percent: u8,
}

impl Progress {
    pub fn idle() -> Self {
        Self {
            message: IDLE_MESSAGE.to_string(),
            percent: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.message == IDLE_MESSAGE && self.percent == 0
    }

    pub fn is_error(&self) -> bool {
        self.message.starts_with("Error:")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<Mutex<HashMap<String, Progress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest status of a job. Percent is clamped to 100.
    pub fn set(&self, job_id: &str, message: impl Into<String>, percent: u32) {
        let progress = Progress {
            message: message.into(),
            percent: percent.min(100) as u8,
        };
        self.inner.lock().insert(job_id.to_string(), progress);
    }

    /// Latest status of a job, idle if nothing was reported
    pub fn get(&self, job_id: &str) -> Progress {
        self.inner
            .lock()
            .get(job_id)
            .cloned()
            .unwrap_or_else(Progress::idle)
    }

    pub fn reset(&self, job_id: &str) {
        self.set(job_id, IDLE_MESSAGE, 0);
    }

    pub fn snapshot(&self) -> HashMap<String, Progress> {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_job_is_idle() {
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.get("missing"), Progress::idle());
    }

    #[test]
    fn clones_share_state() {
        let tracker = ProgressTracker::new();
        let writer = tracker.clone();
        writer.set("course-1a2b3", "Translating text files...", 15);

        let progress = tracker.get("course-1a2b3");
        assert_eq!(progress.message, "Translating text files...");
        assert_eq!(progress.percent, 15);
    }

    #[test]
    fn percent_is_clamped() {
        let tracker = ProgressTracker::new();
        tracker.set("job", "done", 250);
        assert_eq!(tracker.get("job").percent, 100);
    }

    #[test]
    fn reset_returns_to_idle() {
        let tracker = ProgressTracker::new();
        tracker.set("job", "Error: boom", 0);
        assert!(tracker.get("job").is_error());
        tracker.reset("job");
        assert!(tracker.get("job").is_idle());
        assert_eq!(tracker.snapshot().len(), 1);
    }

    #[test]
    fn concurrent_writers() {
        let tracker = ProgressTracker::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let tracker = tracker.clone();
                std::thread::spawn(move || tracker.set(&format!("job-{}", i), "working", i * 10))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.snapshot().len(), 8);
        assert_eq!(tracker.get("job-7").percent, 70);
    }
}
