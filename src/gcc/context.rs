//! Caller-owned caches and per-worker scratch for the estimator.
//!
//! [`GccContext`] is built once per `(len, sample_rate)` and only read while
//! windows are processed, so it can be shared across rayon workers. Every
//! worker owns its own [`Workspace`].

use rustfft::num_complex::Complex;

use super::band::{band_limit, Band, BinClass, FrequencyAxis, KeepMode};
use super::delay::find_delay_ms;
use super::error::GccError;
use super::fft::{Fft2, FftBuffers};
use super::phase::PhaseTable;
use super::phat::cross_correlation;

#[derive(Clone, Debug)]
pub struct GccContext {
    fft: Fft2,
    axis: FrequencyAxis,
    phases: PhaseTable,
}

impl GccContext {
    pub fn new(len: usize, sample_rate: u32, lookup_points: usize) -> Result<Self, GccError> {
        if sample_rate == 0 {
            return Err(GccError::InvalidSampleRate);
        }
        let ctx = Self {
            fft: Fft2::for_len(len)?,
            axis: FrequencyAxis::new(len, sample_rate),
            phases: PhaseTable::build(lookup_points)?,
        };
        log::debug!(
            "GCC context: {} points at {} Hz, {} phase steps",
            ctx.len(),
            sample_rate,
            ctx.phases.len()
        );
        Ok(ctx)
    }

    /// Rebuild the engine and frequency axis if `(len, sample_rate)` changed.
    /// The phase table is kept.
    pub fn prepare(&mut self, len: usize, sample_rate: u32) -> Result<(), GccError> {
        if self.axis.is_for(len, sample_rate) {
            return Ok(());
        }
        if sample_rate == 0 {
            return Err(GccError::InvalidSampleRate);
        }
        log::debug!("Rebuilding frequency axis for {} points at {} Hz", len, sample_rate);
        self.fft = Fft2::for_len(len)?;
        self.axis = FrequencyAxis::new(len, sample_rate);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fft.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.axis.sample_rate()
    }

    pub fn fft(&self) -> &Fft2 {
        &self.fft
    }

    pub fn axis(&self) -> &FrequencyAxis {
        &self.axis
    }

    pub fn phases(&self) -> &PhaseTable {
        &self.phases
    }

    /// GCC-PHAT delay between two equal-length buffers, in milliseconds.
    ///
    /// Both buffers are band-limited (keeping the band), cross-correlated and
    /// the correlation peak is converted to a delay. A positive result means
    /// `a` lags `b`.
    pub fn estimate_delay(
        &self,
        a: &[f64],
        b: &[f64],
        band: Band,
        normalize: bool,
        ws: &mut Workspace,
    ) -> Result<f64, GccError> {
        band_limit(
            self,
            a,
            band,
            KeepMode::InBand,
            &mut ws.buffers,
            &mut ws.mask,
            &mut ws.spectrum_a,
        )?;
        band_limit(
            self,
            b,
            band,
            KeepMode::InBand,
            &mut ws.buffers,
            &mut ws.mask,
            &mut ws.spectrum_b,
        )?;
        cross_correlation(
            &self.fft,
            &ws.spectrum_a,
            &ws.spectrum_b,
            normalize,
            &mut ws.buffers,
            &mut ws.correlation,
        )?;
        Ok(find_delay_ms(&ws.correlation, self.sample_rate()))
    }
}

/// Scratch reused across the windows one worker processes.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    buffers: FftBuffers,
    mask: Vec<BinClass>,
    spectrum_a: Vec<Complex<f64>>,
    spectrum_b: Vec<Complex<f64>>,
    correlation: Vec<f64>,
}

impl Workspace {
    pub fn new(len: usize) -> Self {
        Self {
            buffers: FftBuffers::new(len),
            mask: Vec::with_capacity(len),
            spectrum_a: Vec::with_capacity(len),
            spectrum_b: Vec::with_capacity(len),
            correlation: Vec::with_capacity(len),
        }
    }

    /// Correlation sequence left by the last estimate.
    #[cfg(test)]
    pub fn correlation(&self) -> &[f64] {
        &self.correlation
    }
}
