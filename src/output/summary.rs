// Wed Jul 22 2026 - Alex

use crate::shm::SharedState;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub worker: usize,
    pub questions_marked: u32,
    pub corrections_made: u32,
    pub exams_advanced: u32,
    pub stalled: bool,
}

/// Aggregated run report assembled by the coordinator after every worker
/// has been reaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub workers: usize,
    pub exams_on_disk: usize,
    pub exams_loaded: usize,
    pub questions_marked: u32,
    pub corrections_made: u32,
    pub stalled_workers: usize,
    pub terminated_by_sentinel: bool,
    pub duration_secs: f64,
    pub per_worker: Vec<WorkerSummary>,
}

impl RunSummary {
    pub fn collect(state: &SharedState, workers: usize, duration: Duration) -> Self {
        let per_worker: Vec<WorkerSummary> = (0..workers)
            .map(|id| {
                let stats = state.worker_stats(id);
                WorkerSummary {
                    worker: id,
                    questions_marked: stats.questions_marked.load(Ordering::Acquire),
                    corrections_made: stats.corrections_made.load(Ordering::Acquire),
                    exams_advanced: stats.exams_advanced.load(Ordering::Acquire),
                    stalled: stats.stalled.load(Ordering::Acquire),
                }
            })
            .collect();

        let exams_on_disk = state.sequencer.path_count.load(Ordering::Acquire) as usize;
        let exams_loaded =
            (state.sequencer.current_index.load(Ordering::Acquire) as usize + 1).min(exams_on_disk);

        Self {
            workers,
            exams_on_disk,
            exams_loaded,
            questions_marked: per_worker.iter().map(|w| w.questions_marked).sum(),
            corrections_made: per_worker.iter().map(|w| w.corrections_made).sum(),
            stalled_workers: per_worker.iter().filter(|w| w.stalled).count(),
            terminated_by_sentinel: state.terminated(),
            duration_secs: duration.as_secs_f64(),
            per_worker,
        }
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
