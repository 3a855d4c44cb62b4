// Mon Jul 20 2026 - Alex

use crate::shm::MAX_WORKERS;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Bounded random interval in milliseconds for the simulated delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn sample(&self, rng: &mut impl Rng) -> Duration {
        Duration::from_millis(rng.random_range(self.min_ms..=self.max_ms))
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            min_ms: ((self.min_ms as f64) * factor).round() as u64,
            max_ms: ((self.max_ms as f64) * factor).round() as u64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub input_dir: PathBuf,
    pub rubric_path: PathBuf,
    pub num_workers: usize,
    pub review_delay: DelayRange,
    pub marking_delay: DelayRange,
    pub correction_chance_pct: u32,
    pub retry_sleep_ms: u64,
    pub stall_timeout_ms: u64,
    pub shm_name: Option<String>,
    pub summary_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("Input"),
            rubric_path: PathBuf::from("rubric.txt"),
            num_workers: num_cpus::get().clamp(2, MAX_WORKERS),
            review_delay: DelayRange::new(500, 1000),
            marking_delay: DelayRange::new(1000, 2000),
            correction_chance_pct: 30,
            retry_sleep_ms: 100,
            stall_timeout_ms: 2000,
            shm_name: None,
            summary_path: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_dir(mut self, dir: PathBuf) -> Self {
        self.input_dir = dir;
        self
    }

    pub fn with_rubric_path(mut self, path: PathBuf) -> Self {
        self.rubric_path = path;
        self
    }

    pub fn with_num_workers(mut self, workers: usize) -> Self {
        self.num_workers = workers;
        self
    }

    pub fn with_summary_path(mut self, path: PathBuf) -> Self {
        self.summary_path = Some(path);
        self
    }

    /// Shrink every simulated delay by the given factor. Used by the
    /// `--fast` profile and by tests.
    pub fn with_time_scale(mut self, factor: f64) -> Self {
        self.review_delay = self.review_delay.scaled(factor);
        self.marking_delay = self.marking_delay.scaled(factor);
        self.retry_sleep_ms = ((self.retry_sleep_ms as f64) * factor).round().max(1.0) as u64;
        self
    }

    pub fn retry_sleep(&self) -> Duration {
        Duration::from_millis(self.retry_sleep_ms)
    }

    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }

    /// Region name for this run; unique per coordinator process unless
    /// overridden.
    pub fn region_name(&self) -> String {
        self.shm_name
            .clone()
            .unwrap_or_else(|| format!("/ta-marking-{}", std::process::id()))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.num_workers < 2 {
            return Err("number of workers must be at least 2".to_string());
        }
        if self.num_workers > MAX_WORKERS {
            return Err(format!("number of workers must be at most {}", MAX_WORKERS));
        }
        if self.correction_chance_pct > 100 {
            return Err("correction chance must be between 0 and 100".to_string());
        }
        if self.review_delay.min_ms > self.review_delay.max_ms {
            return Err("review delay minimum exceeds maximum".to_string());
        }
        if self.marking_delay.min_ms > self.marking_delay.max_ms {
            return Err("marking delay minimum exceeds maximum".to_string());
        }
        if self.stall_timeout_ms == 0 {
            return Err("stall timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}
