//! Stage timing for the shear pipeline.
//!
//! Provides an RAII timing scope and the per-computation timing record.
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A timing scope for one pipeline stage.
///
/// Logs its duration at debug level when finished or dropped.
pub struct StageTimer {
    start: Instant,
    name: &'static str,
    reported: bool,
}

impl StageTimer {
    /// Starts timing a stage.
    pub fn new(name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            name,
            reported: false,
        }
    }

    /// Milliseconds since the stage started.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1e3
    }

    /// Stops the timer and returns the elapsed milliseconds.
    pub fn finish(mut self) -> f64 {
        let elapsed_ms = self.elapsed_ms();
        debug!(stage = self.name, elapsed_ms, "Stage finished");
        self.reported = true;
        elapsed_ms
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        if !self.reported {
            debug!(stage = self.name, elapsed_ms = self.elapsed_ms(), "Stage dropped");
        }
    }
}

/// Wall-clock time of each stage of the most recent computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputeTimings {
    /// Rotation and resampling onto the computational grid
    pub populate_ms: f64,
    /// Separation bubble detection
    pub separation_ms: f64,
    /// Spectral perturbation solve
    pub spectral_ms: f64,
    /// Combination with ambient shear and damping
    pub assemble_ms: f64,
    /// Resampling back onto the input grid
    pub resample_ms: f64,
}

impl ComputeTimings {
    /// Sum of all stages.
    pub fn total_ms(&self) -> f64 {
        self.populate_ms + self.separation_ms + self.spectral_ms + self.assemble_ms + self.resample_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_stage_timer_measures_time() {
        let timer = StageTimer::new("sleep");
        thread::sleep(Duration::from_millis(5));
        let elapsed = timer.finish();
        assert!(elapsed >= 5.0, "Stage took only {elapsed} ms");
    }

    #[test]
    fn test_timings_total() {
        let timings = ComputeTimings {
            populate_ms: 1.0,
            separation_ms: 2.0,
            spectral_ms: 3.0,
            assemble_ms: 0.5,
            resample_ms: 0.25,
        };
        assert_eq!(timings.total_ms(), 6.75);
        assert_eq!(ComputeTimings::default().total_ms(), 0.0);
    }
}
