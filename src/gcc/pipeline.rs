//! Buffered GCC-PHAT over a whole stereo recording.

use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;

use super::band::Band;
use super::context::{GccContext, Workspace};
use super::error::GccError;

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Window length in samples, a power of two.
    pub buffer_size: usize,
    pub band: Band,
    /// Apply PHAT weighting to the cross-power spectrum.
    pub normalize: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            band: Band::new(100.0, 8000.0),
            normalize: true,
        }
    }
}

/// Result for one successfully processed window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WindowEstimate {
    pub index: usize,
    /// Start of the window in seconds.
    pub time_s: f64,
    pub delay_ms: f64,
    pub rms: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedWindow {
    pub index: usize,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DelaySeries {
    pub sample_rate: u32,
    pub buffer_size: usize,
    /// Number of complete windows in the input.
    pub windows: usize,
    pub estimates: Vec<WindowEstimate>,
    pub skipped: Vec<SkippedWindow>,
}

/// Number of complete windows; a trailing remainder is ignored.
pub fn window_count(len: usize, buffer_size: usize) -> usize {
    if buffer_size == 0 {
        0
    } else {
        len / buffer_size
    }
}

/// Root mean square over both channels of one window.
pub fn window_rms(a: &[f64], b: &[f64]) -> f64 {
    let count = a.len() + b.len();
    if count == 0 {
        return 0.0;
    }
    let energy: f64 = a.iter().chain(b).map(|s| s * s).sum();
    (energy / count as f64).sqrt()
}

/// Estimate one delay per window of `config.buffer_size` samples.
///
/// `ctx` is re-prepared for `(buffer_size, sample_rate)` and then shared
/// read-only by the workers. Configuration errors abort before any window
/// runs. A window whose data cannot be processed is logged and recorded in
/// [`DelaySeries::skipped`]; engine misuse inside a window aborts the run.
pub fn process(
    ctx: &mut GccContext,
    left: &[f64],
    right: &[f64],
    sample_rate: u32,
    config: &PipelineConfig,
    progress: &ProgressBar,
) -> Result<DelaySeries, GccError> {
    let n = config.buffer_size;
    if n == 0 || !n.is_power_of_two() {
        return Err(GccError::NotPowerOfTwo(n));
    }
    if left.len() != right.len() {
        return Err(GccError::ChannelLengthMismatch {
            left: left.len(),
            right: right.len(),
        });
    }

    ctx.prepare(n, sample_rate)?;
    let ctx = &*ctx;
    let windows = window_count(left.len(), n);
    log::info!(
        "Processing {} windows of {} samples ({:.1} ms each)",
        windows,
        n,
        n as f64 / sample_rate as f64 * 1000.0
    );
    progress.set_length(windows as u64);

    let outcomes: Vec<Result<WindowEstimate, GccError>> = (0..windows)
        .into_par_iter()
        .map_init(
            || Workspace::new(n),
            |ws, index| {
                let range = index * n..(index + 1) * n;
                let outcome =
                    estimate_window(ctx, &left[range.clone()], &right[range], index, config, ws);
                progress.inc(1);
                outcome
            },
        )
        .collect();

    let mut series = DelaySeries {
        sample_rate,
        buffer_size: n,
        windows,
        estimates: Vec::with_capacity(windows),
        skipped: Vec::new(),
    };

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(estimate) => series.estimates.push(estimate),
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                log::warn!("Skipping window {}: {}", index, err);
                series.skipped.push(SkippedWindow {
                    index,
                    reason: err.to_string(),
                });
            }
        }
    }

    log::info!(
        "Estimated {} delays ({} windows skipped)",
        series.estimates.len(),
        series.skipped.len()
    );
    Ok(series)
}

fn estimate_window(
    ctx: &GccContext,
    a: &[f64],
    b: &[f64],
    index: usize,
    config: &PipelineConfig,
    ws: &mut Workspace,
) -> Result<WindowEstimate, GccError> {
    check_finite(a, 'A')?;
    check_finite(b, 'B')?;

    let delay_ms = ctx.estimate_delay(a, b, config.band, config.normalize, ws)?;
    Ok(WindowEstimate {
        index,
        time_s: (index * config.buffer_size) as f64 / ctx.sample_rate() as f64,
        delay_ms,
        rms: window_rms(a, b),
    })
}

fn check_finite(samples: &[f64], channel: char) -> Result<(), GccError> {
    match samples.iter().position(|s| !s.is_finite()) {
        Some(offset) => Err(GccError::NonFiniteSample { channel, offset }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcc::phase::DEFAULT_LOOKUP_POINTS;

    const FS: u32 = 16000;

    fn run(
        left: &[f64],
        right: &[f64],
        sample_rate: u32,
        config: &PipelineConfig,
    ) -> Result<DelaySeries, GccError> {
        let mut ctx = GccContext::new(64, 8000, DEFAULT_LOOKUP_POINTS)?;
        process(&mut ctx, left, right, sample_rate, config, &ProgressBar::hidden())
    }

    fn noise(len: usize, seed: u32) -> Vec<f64> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                (state >> 8) as f64 / (1u32 << 24) as f64 * 2.0 - 1.0
            })
            .collect()
    }

    /// `left` delayed by `d` samples inside every window.
    fn delayed_per_window(left: &[f64], n: usize, d: usize) -> Vec<f64> {
        left.chunks(n)
            .flat_map(|chunk| {
                let mut c = chunk.to_vec();
                let k = d.min(c.len());
                c.rotate_right(k);
                c
            })
            .collect()
    }

    fn config(buffer_size: usize) -> PipelineConfig {
        PipelineConfig {
            buffer_size,
            band: Band::new(100.0, 4000.0),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn counts_complete_windows_only() {
        let left = noise(10_000, 1);
        let right = noise(10_000, 2);
        let series = run(&left, &right, FS, &config(1024)).unwrap();
        assert_eq!(series.windows, 9);
        assert_eq!(series.estimates.len(), 9);
        assert!(series.skipped.is_empty());
        assert_eq!(window_count(10_000, 1024), 9);
        assert_eq!(window_count(100, 1024), 0);
    }

    #[test]
    fn preserves_window_order() {
        let n = 512;
        let left = noise(n * 12, 9);
        let right = delayed_per_window(&left, n, 7);
        let series = run(&left, &right, FS, &config(n)).unwrap();

        let indices: Vec<usize> = series.estimates.iter().map(|e| e.index).collect();
        assert_eq!(indices, (0..12).collect::<Vec<_>>());

        let ctx = GccContext::new(n, FS, DEFAULT_LOOKUP_POINTS).unwrap();
        let mut ws = Workspace::new(n);
        for est in &series.estimates {
            let range = est.index * n..(est.index + 1) * n;
            let band = Band::new(100.0, 4000.0);
            let expected = ctx
                .estimate_delay(&left[range.clone()], &right[range], band, true, &mut ws)
                .unwrap();
            assert_eq!(est.delay_ms, expected);
            assert!((est.time_s - (est.index * n) as f64 / FS as f64).abs() < 1e-12);
        }
    }

    #[test]
    fn recovers_known_delay_in_every_window() {
        let n = 1024;
        let left = noise(n * 4, 21);
        let right = delayed_per_window(&left, n, 16);
        let series = run(&left, &right, FS, &config(n)).unwrap();
        assert_eq!(series.estimates.len(), 4);
        for est in &series.estimates {
            assert!((est.delay_ms + 1.0).abs() < 1e-9, "expected -1 ms, got {}", est.delay_ms);
        }
    }

    #[test]
    fn skips_windows_with_bad_samples() {
        let n = 256;
        let mut left = noise(n * 5, 4);
        let right = noise(n * 5, 8);
        left[3 * n + 10] = f64::NAN;

        let series = run(&left, &right, FS, &config(n)).unwrap();
        assert_eq!(series.windows, 5);
        assert_eq!(series.estimates.len(), 4);
        assert_eq!(series.skipped.len(), 1);
        assert_eq!(series.skipped[0].index, 3);
        let indices: Vec<usize> = series.estimates.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 4]);
    }

    #[test]
    fn rejects_invalid_configuration() {
        let left = noise(4096, 1);
        let right = noise(4096, 2);
        assert_eq!(
            run(&left, &right, FS, &config(1000)).unwrap_err(),
            GccError::NotPowerOfTwo(1000)
        );
        assert_eq!(
            run(&left, &right, FS, &config(0)).unwrap_err(),
            GccError::NotPowerOfTwo(0)
        );
        assert_eq!(
            run(&left, &right[..4000], FS, &config(1024)).unwrap_err(),
            GccError::ChannelLengthMismatch { left: 4096, right: 4000 }
        );
        assert_eq!(
            run(&left, &right, 0, &config(1024)).unwrap_err(),
            GccError::InvalidSampleRate
        );
    }

    #[test]
    fn short_input_yields_empty_series() {
        let series = run(&[0.1; 100], &[0.1; 100], FS, &config(1024)).unwrap();
        assert_eq!(series.windows, 0);
        assert!(series.estimates.is_empty());
    }

    #[test]
    fn rms_covers_both_channels() {
        assert!((window_rms(&[1.0, -1.0], &[1.0, -1.0]) - 1.0).abs() < 1e-12);
        assert!((window_rms(&[2.0, 2.0], &[0.0, 0.0]) - 2.0f64.sqrt()).abs() < 1e-12);
        assert_eq!(window_rms(&[], &[]), 0.0);
    }
}
