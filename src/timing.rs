//! Run timing: named phase durations logged at the end of a run, and
//! the one-row-per-run performance CSV.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

use crate::animation::RunStats;
use crate::error::Error;

/// Collects named phase durations during a run and logs them all at
/// the end, in the order they were recorded.
#[derive(Debug, Default)]
pub struct RunTimer {
    entries: Vec<(String, Duration)>,
}

impl RunTimer {
    /// An empty timer.
    pub fn new() -> RunTimer {
        RunTimer::default()
    }

    /// Records the time elapsed since `start` under `name`.
    pub fn timeit(&mut self, name: &str, start: Instant) {
        self.entries.push((name.to_string(), start.elapsed()));
    }

    /// Logs every recorded phase and clears the entries.
    pub fn log(&mut self) {
        for (name, elapsed) in &self.entries {
            info!("'{}' executed in {} ms", name, elapsed.as_millis());
        }
        self.entries.clear();
    }
}

/// One performance record per run, appended as a CSV row: wall-clock
/// seconds, sink (render/encode) seconds, compute-only seconds, frame
/// count, resolution, and the mean per-frame compute time.
#[derive(Debug, Clone, Copy)]
pub struct PerfRecord {
    /// Total wall-clock time of the run.
    pub total: Duration,
    /// Timing totals from the frame loop.
    pub stats: RunStats,
    /// Pixel columns.
    pub x_resolution: usize,
    /// Pixel rows.
    pub y_resolution: usize,
}

impl PerfRecord {
    /// Appends this record to `path`, writing the header first if the
    /// file does not exist yet.
    pub fn append_csv(&self, path: &Path) -> Result<(), Error> {
        let header_needed = !path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if header_needed {
            writeln!(
                file,
                "total_s,sink_s,compute_s,frames,x_resolution,y_resolution,avg_frame_compute_s"
            )?;
        }
        writeln!(
            file,
            "{:.3},{:.3},{:.3},{},{},{},{:.4}",
            self.total.as_secs_f64(),
            self.stats.sink.as_secs_f64(),
            self.stats.compute.as_secs_f64(),
            self.stats.frames,
            self.x_resolution,
            self.y_resolution,
            self.stats.avg_compute_per_frame().as_secs_f64(),
        )?;
        Ok(())
    }
}
