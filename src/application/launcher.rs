use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Something that runs the whole pipeline for one job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, video_id: &str);
}

/// Starts pipeline runs in the background. Runs are never joined by the
/// request path and cannot be cancelled; at most one run per job id is
/// in flight at a time.
#[derive(Clone)]
pub struct PipelineLauncher {
    runner: Arc<dyn JobRunner>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

/// Releases the job id when the run ends, even if it panicked.
struct InFlightGuard {
    video_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut in_flight = match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        in_flight.remove(&self.video_id);
    }
}

impl PipelineLauncher {
    pub fn new(runner: Arc<dyn JobRunner>) -> Self {
        Self {
            runner,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Spawn a run for `video_id`. Returns `None` if one is already running.
    pub fn launch(&self, video_id: &str) -> Option<JoinHandle<()>> {
        {
            let mut in_flight = match self.in_flight.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if !in_flight.insert(video_id.to_string()) {
                warn!(video_id, "Processing already in progress, not starting again");
                return None;
            }
        }

        let guard = InFlightGuard {
            video_id: video_id.to_string(),
            in_flight: self.in_flight.clone(),
        };
        let runner = self.runner.clone();
        debug!(video_id, "Launching processing");
        Some(tokio::spawn(async move {
            runner.run(&guard.video_id).await;
            drop(guard);
        }))
    }

    pub fn is_running(&self, video_id: &str) -> bool {
        match self.in_flight.lock() {
            Ok(in_flight) => in_flight.contains(video_id),
            Err(poisoned) => poisoned.into_inner().contains(video_id),
        }
    }
}
