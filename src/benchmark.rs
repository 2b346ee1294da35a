//! Fixed-duration benchmark loop.
//!
//! Warms up for a configured time, then samples per-iteration timings of a
//! caller-supplied render step until the sampling duration (or an optional
//! frame cap) is reached. The loop is single-threaded and synchronous; the
//! duration check runs between iterations, so a single overlong iteration can
//! overshoot the configured duration. That imprecision is accepted.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::device::DeviceIdentity;
use crate::error::Result;

/// Benchmark run configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkConfig {
    /// Warm-up time before sampling starts; no samples are recorded.
    pub warmup: Duration,
    /// Total sampling time.
    pub duration: Duration,
    /// Optional cap on recorded frames; `None` means duration-bound only.
    pub max_frames: Option<u32>,
    /// Include the per-frame `frame,ms` table in the report.
    pub record_frame_times: bool,
    /// Report destination; `None` means no file is written.
    pub output: Option<PathBuf>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            warmup: Duration::from_secs(1),
            duration: Duration::from_secs(10),
            max_frames: None,
            record_frame_times: false,
            output: None,
        }
    }
}

/// Phase of a benchmark run. `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BenchmarkPhase {
    /// Render steps run but nothing is recorded.
    #[default]
    Warming,
    /// Per-iteration timings are being recorded.
    Sampling,
    /// Statistics are final.
    Finished,
}

/// Frame time statistics, computed once when sampling finishes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Fastest frame in milliseconds.
    pub min_ms: f64,
    /// Slowest frame in milliseconds.
    pub max_ms: f64,
    /// Mean frame time in milliseconds.
    pub avg_ms: f64,
}

impl FrameStats {
    fn from_frame_times(frame_times: &[f64]) -> Option<Self> {
        if frame_times.is_empty() {
            return None;
        }
        let min_ms = frame_times.iter().copied().fold(f64::INFINITY, f64::min);
        let max_ms = frame_times.iter().copied().fold(0.0, f64::max);
        let avg_ms = frame_times.iter().sum::<f64>() / frame_times.len() as f64;
        Some(Self {
            min_ms,
            max_ms,
            avg_ms,
        })
    }

    /// Frame rate of the fastest frame.
    pub fn best_fps(&self) -> f64 {
        1000.0 / self.min_ms
    }

    /// Frame rate of the slowest frame.
    pub fn worst_fps(&self) -> f64 {
        1000.0 / self.max_ms
    }

    /// Mean frame rate.
    pub fn avg_fps(&self) -> f64 {
        1000.0 / self.avg_ms
    }
}

/// Fixed-duration benchmark over a caller-supplied render step.
///
/// Samples are appended only by [`run`](Self::run) on the calling thread and
/// are read-only once the run completes.
#[derive(Debug, Default)]
pub struct Benchmark {
    config: BenchmarkConfig,
    phase: BenchmarkPhase,
    device: DeviceIdentity,
    frame_times: Vec<f64>,
    runtime_ms: f64,
    frame_count: u32,
    stats: Option<FrameStats>,
}

impl Benchmark {
    /// Create a benchmark with the given configuration.
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Current phase of the run.
    pub fn phase(&self) -> BenchmarkPhase {
        self.phase
    }

    /// Recorded per-frame timings in milliseconds.
    pub fn frame_times(&self) -> &[f64] {
        &self.frame_times
    }

    /// Total recorded runtime in milliseconds.
    pub fn runtime_ms(&self) -> f64 {
        self.runtime_ms
    }

    /// Number of recorded frames.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Mean frame rate over the recorded runtime.
    pub fn fps(&self) -> f64 {
        if self.runtime_ms > 0.0 {
            self.frame_count as f64 / (self.runtime_ms / 1000.0)
        } else {
            0.0
        }
    }

    /// Frame statistics; `None` until the run finishes or if nothing was
    /// recorded.
    pub fn stats(&self) -> Option<FrameStats> {
        self.stats
    }

    /// Run the benchmark to completion, blocking the calling thread.
    ///
    /// Each iteration calls `render` once and times it. Warm-up iterations are
    /// not recorded. Sampling stops once the configured duration is reached or
    /// the frame cap is hit.
    pub fn run<F: FnMut()>(&mut self, device: DeviceIdentity, mut render: F) {
        self.device = device;
        self.phase = BenchmarkPhase::Warming;

        let warmup_ms = self.config.warmup.as_secs_f64() * 1000.0;
        let mut warmed_ms = 0.0;
        while warmed_ms < warmup_ms {
            warmed_ms += timed(&mut render);
        }

        self.phase = BenchmarkPhase::Sampling;
        let duration_ms = self.config.duration.as_secs_f64() * 1000.0;
        while self.runtime_ms < duration_ms {
            let elapsed = timed(&mut render);
            self.runtime_ms += elapsed;
            self.frame_times.push(elapsed);
            self.frame_count += 1;
            if self
                .config
                .max_frames
                .is_some_and(|cap| self.frame_count >= cap)
            {
                break;
            }
        }

        self.phase = BenchmarkPhase::Finished;
        self.stats = FrameStats::from_frame_times(&self.frame_times);

        log::info!("Benchmark finished");
        log::info!(
            "device : {} (driver version: {})",
            self.device.name,
            self.device.driver_version
        );
        log::info!("runtime: {:.3} s", self.runtime_ms / 1000.0);
        log::info!("frames : {}", self.frame_count);
        log::info!("fps    : {:.3}", self.fps());
        if let Some(stats) = self.stats {
            log::info!("best   : {:.3} fps ({:.3} ms)", stats.best_fps(), stats.min_ms);
            log::info!("worst  : {:.3} fps ({:.3} ms)", stats.worst_fps(), stats.max_ms);
            log::info!("avg    : {:.3} fps ({:.3} ms)", stats.avg_fps(), stats.avg_ms);
        }
    }

    /// Persist the report to the configured destination, if any.
    ///
    /// A write failure leaves the in-memory results untouched and is not
    /// retried; callers typically log the error and continue.
    pub fn save_result(&self) -> Result<()> {
        let Some(path) = &self.config.output else {
            return Ok(());
        };
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_report(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write the comma-delimited report to an arbitrary destination.
    pub fn write_report<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(writer, "device,driverversion,duration(ms),frames,fps")?;
        writeln!(
            writer,
            "{},{},{:.4},{},{:.4}",
            self.device.name,
            self.device.driver_version,
            self.runtime_ms,
            self.frame_count,
            self.fps()
        )?;

        if self.config.record_frame_times {
            writeln!(writer)?;
            writeln!(writer, "frame,ms")?;
            for (frame, ms) in self.frame_times.iter().enumerate() {
                writeln!(writer, "{frame},{ms:.4}")?;
            }
            if let Some(stats) = self.stats {
                writeln!(
                    writer,
                    "best   : {:.4} fps ({:.4} ms)",
                    stats.best_fps(),
                    stats.min_ms
                )?;
                writeln!(
                    writer,
                    "worst  : {:.4} fps ({:.4} ms)",
                    stats.worst_fps(),
                    stats.max_ms
                )?;
                writeln!(
                    writer,
                    "avg    : {:.4} fps ({:.4} ms)",
                    stats.avg_fps(),
                    stats.avg_ms
                )?;
            }
        }
        Ok(())
    }
}

fn timed<F: FnMut()>(render: &mut F) -> f64 {
    let start = Instant::now();
    render();
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> DeviceIdentity {
        DeviceIdentity::new("Test GPU", 7)
    }

    #[test]
    fn test_duration_bound_sampling() {
        let mut benchmark = Benchmark::new(BenchmarkConfig {
            warmup: Duration::ZERO,
            duration: Duration::from_millis(100),
            ..Default::default()
        });
        benchmark.run(identity(), || std::thread::sleep(Duration::from_millis(10)));

        assert_eq!(benchmark.phase(), BenchmarkPhase::Finished);
        // 10 ms steps over 100 ms, with tolerance for the overshoot iteration.
        let frames = benchmark.frame_count();
        assert!((9..=11).contains(&frames), "unexpected frame count {frames}");
        assert!(benchmark.runtime_ms() >= 100.0);
        assert_eq!(benchmark.frame_times().len(), frames as usize);
    }

    #[test]
    fn test_frame_cap_wins_over_duration() {
        let mut benchmark = Benchmark::new(BenchmarkConfig {
            warmup: Duration::ZERO,
            duration: Duration::from_secs(3600),
            max_frames: Some(5),
            ..Default::default()
        });
        benchmark.run(identity(), || std::thread::sleep(Duration::from_millis(1)));

        assert_eq!(benchmark.frame_count(), 5);
        assert_eq!(benchmark.frame_times().len(), 5);
        assert_eq!(benchmark.phase(), BenchmarkPhase::Finished);
    }

    #[test]
    fn test_warmup_records_nothing() {
        let mut warmup_calls = 0u32;
        let mut benchmark = Benchmark::new(BenchmarkConfig {
            warmup: Duration::from_millis(20),
            duration: Duration::from_millis(1),
            ..Default::default()
        });
        benchmark.run(identity(), || {
            warmup_calls += 1;
            std::thread::sleep(Duration::from_millis(5));
        });

        // More render calls happened than frames were recorded.
        assert!(warmup_calls > benchmark.frame_count());
    }

    #[test]
    fn test_stats_over_recorded_frames() {
        let mut benchmark = Benchmark::new(BenchmarkConfig {
            warmup: Duration::ZERO,
            duration: Duration::from_millis(30),
            ..Default::default()
        });
        benchmark.run(identity(), || std::thread::sleep(Duration::from_millis(5)));

        let stats = benchmark.stats().unwrap();
        assert!(stats.min_ms <= stats.avg_ms);
        assert!(stats.avg_ms <= stats.max_ms);
        assert!(stats.min_ms >= 5.0);
        assert!(stats.best_fps() >= stats.worst_fps());
    }

    #[test]
    fn test_report_header_and_data_row() {
        let mut benchmark = Benchmark::new(BenchmarkConfig::default());
        benchmark.device = DeviceIdentity::new("Test GPU", 7);
        benchmark.runtime_ms = 10000.0;
        benchmark.frame_count = 500;

        let mut out = Vec::new();
        benchmark.write_report(&mut out).unwrap();
        let report = String::from_utf8(out).unwrap();
        let mut lines = report.lines();

        assert_eq!(
            lines.next().unwrap(),
            "device,driverversion,duration(ms),frames,fps"
        );
        assert_eq!(lines.next().unwrap(), "Test GPU,7,10000.0000,500,50.0000");
        // Per-frame table is off by default.
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_report_with_frame_times() {
        let mut benchmark = Benchmark::new(BenchmarkConfig {
            record_frame_times: true,
            ..Default::default()
        });
        benchmark.device = identity();
        benchmark.frame_times = vec![10.0, 20.0];
        benchmark.runtime_ms = 30.0;
        benchmark.frame_count = 2;
        benchmark.stats = FrameStats::from_frame_times(&benchmark.frame_times);

        let mut out = Vec::new();
        benchmark.write_report(&mut out).unwrap();
        let report = String::from_utf8(out).unwrap();

        assert!(report.contains("frame,ms"));
        assert!(report.contains("0,10.0000"));
        assert!(report.contains("1,20.0000"));
        assert!(report.contains("best   : 100.0000 fps (10.0000 ms)"));
        assert!(report.contains("worst  : 50.0000 fps (20.0000 ms)"));
        assert!(report.contains("avg    : 66.6667 fps (15.0000 ms)"));
    }

    #[test]
    fn test_save_result_without_output_is_noop() {
        let benchmark = Benchmark::new(BenchmarkConfig::default());
        assert!(benchmark.save_result().is_ok());
    }

    #[test]
    fn test_save_result_reports_io_failure() {
        let mut benchmark = Benchmark::new(BenchmarkConfig {
            output: Some(PathBuf::from("/nonexistent-dir/report.csv")),
            ..Default::default()
        });
        benchmark.device = identity();

        let result = benchmark.save_result();
        assert!(matches!(result, Err(crate::error::SupportError::Io(_))));
        // In-memory results are unaffected by the failed write.
        assert_eq!(benchmark.frame_count(), 0);
    }
}
