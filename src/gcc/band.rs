//! Frequency axis and band restriction of a single channel buffer.

use rayon::prelude::*;
use rustfft::num_complex::Complex;

use super::context::GccContext;
use super::error::GccError;
use super::fft::FftBuffers;

/// Transforms at least this long reconstruct bins on the rayon pool.
pub const PARALLEL_BIN_THRESHOLD: usize = 1 << 14;

/// Signed frequency (Hz) of every FFT bin for a fixed `(len, sample_rate)`.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyAxis {
    sample_rate: u32,
    freqs: Vec<f64>,
}

impl FrequencyAxis {
    pub fn new(len: usize, sample_rate: u32) -> Self {
        let half = len / 2;
        let fs = sample_rate as f64;
        let freqs = (0..len)
            .map(|i| {
                if i <= half {
                    i as f64 * fs / len as f64
                } else {
                    -((len - i) as f64) * fs / len as f64
                }
            })
            .collect();
        Self { sample_rate, freqs }
    }

    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_for(&self, len: usize, sample_rate: u32) -> bool {
        self.len() == len && self.sample_rate == sample_rate
    }

    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinClass {
    InBand,
    OutOfBand,
    /// Matches neither rule; left untouched by masking.
    Unassigned,
}

/// Which side of the band survives filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeepMode {
    InBand,
    /// Band-reject filtering: zero the band, keep everything outside it.
    #[allow(dead_code)]
    RejectInBand,
}

/// Frequency range of interest in Hz, applied symmetrically to negative bins.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    pub fmin: f64,
    pub fmax: f64,
}

impl Band {
    pub fn new(fmin: f64, fmax: f64) -> Self {
        Self { fmin, fmax }
    }

    pub fn classify(&self, freq: f64) -> BinClass {
        let Band { fmin, fmax } = *self;
        if (freq >= fmin && freq <= fmax) || (freq <= -fmin && freq >= -fmax) {
            BinClass::InBand
        } else if (freq < fmin && freq > -fmin) || freq < -fmax || freq > fmax {
            BinClass::OutOfBand
        } else {
            BinClass::Unassigned
        }
    }

    /// Rebuild `mask` from scratch for the given axis.
    pub fn fill_mask(&self, axis: &FrequencyAxis, mask: &mut Vec<BinClass>) {
        mask.clear();
        mask.extend(axis.freqs().iter().map(|&f| self.classify(f)));
    }
}

/// Band-limit one buffer and write its phase-reconstructed spectrum to `out`.
///
/// The surviving amplitude of each bin is `|Re X[i]|`, not `|X[i]|`; bins
/// on the rejected side of the band get zero amplitude. Every bin is then
/// rebuilt as `amplitude * exp(i * phase)` using the quantized phase table.
/// The result stays in the frequency domain.
pub fn band_limit(
    ctx: &GccContext,
    signal: &[f64],
    band: Band,
    keep: KeepMode,
    buffers: &mut FftBuffers,
    mask: &mut Vec<BinClass>,
    out: &mut Vec<Complex<f64>>,
) -> Result<(), GccError> {
    buffers.load_real(signal);
    ctx.fft().forward(&mut buffers.re, &mut buffers.im)?;

    band.fill_mask(ctx.axis(), mask);

    let n = signal.len();
    out.clear();
    out.resize(n, Complex::new(0.0, 0.0));

    let re = &buffers.re;
    let im = &buffers.im;
    let mask = &mask[..];
    let phases = ctx.phases();

    let bin = |i: usize| {
        let amplitude = match (keep, mask[i]) {
            (KeepMode::InBand, BinClass::OutOfBand)
            | (KeepMode::RejectInBand, BinClass::InBand) => 0.0,
            _ => re[i].abs(),
        };
        phases.lookup(im[i].atan2(re[i])) * amplitude
    };

    if n >= PARALLEL_BIN_THRESHOLD {
        out.par_iter_mut().enumerate().for_each(|(i, c)| *c = bin(i));
    } else {
        out.iter_mut().enumerate().for_each(|(i, c)| *c = bin(i));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_follows_hermitian_layout() {
        let axis = FrequencyAxis::new(8, 8000);
        assert_eq!(
            axis.freqs(),
            &[0.0, 1000.0, 2000.0, 3000.0, 4000.0, -3000.0, -2000.0, -1000.0]
        );
        assert!(axis.is_for(8, 8000));
        assert!(!axis.is_for(8, 16000));
        assert!(!axis.is_for(16, 8000));
    }

    #[test]
    fn mask_partitions_every_bin() {
        let axis = FrequencyAxis::new(64, 16000);
        for (fmin, fmax) in [(0.0, 8000.0), (250.0, 3000.0), (1000.0, 1000.0), (0.0, 0.0)] {
            let mut mask = Vec::new();
            Band::new(fmin, fmax).fill_mask(&axis, &mut mask);
            assert_eq!(mask.len(), 64);
            assert!(
                mask.iter().all(|&c| c != BinClass::Unassigned),
                "unassigned bin for band {}..{}",
                fmin,
                fmax
            );
        }
    }

    #[test]
    fn band_edges_are_inclusive() {
        let band = Band::new(1000.0, 3000.0);
        assert_eq!(band.classify(1000.0), BinClass::InBand);
        assert_eq!(band.classify(3000.0), BinClass::InBand);
        assert_eq!(band.classify(-1000.0), BinClass::InBand);
        assert_eq!(band.classify(-3000.0), BinClass::InBand);
        assert_eq!(band.classify(999.0), BinClass::OutOfBand);
        assert_eq!(band.classify(-3001.0), BinClass::OutOfBand);
        assert_eq!(band.classify(0.0), BinClass::OutOfBand);
    }

    #[test]
    fn inverted_band_rejects_everything() {
        let axis = FrequencyAxis::new(32, 8000);
        let mut mask = Vec::new();
        Band::new(3000.0, 1000.0).fill_mask(&axis, &mut mask);
        assert!(mask.iter().all(|&c| c == BinClass::OutOfBand));
    }

    fn tone(len: usize, bin: usize) -> Vec<f64> {
        (0..len)
            .map(|i| (2.0 * std::f64::consts::PI * (bin * i) as f64 / len as f64).cos())
            .collect()
    }

    #[test]
    fn keeps_in_band_energy_only() {
        let ctx = GccContext::new(64, 6400, 360).unwrap();
        // Bin 4 is 400 Hz, bin 20 is 2000 Hz.
        let signal: Vec<f64> = tone(64, 4)
            .iter()
            .zip(tone(64, 20))
            .map(|(a, b)| a + b)
            .collect();
        let mut buffers = FftBuffers::default();
        let mut mask = Vec::new();
        let mut out = Vec::new();

        band_limit(
            &ctx,
            &signal,
            Band::new(1000.0, 3000.0),
            KeepMode::InBand,
            &mut buffers,
            &mut mask,
            &mut out,
        )
        .unwrap();

        assert!(out[4].norm() < 1e-9);
        assert!(out[60].norm() < 1e-9);
        assert!((out[20].norm() - 32.0).abs() < 1e-6);
        assert!((out[44].norm() - 32.0).abs() < 1e-6);

        band_limit(
            &ctx,
            &signal,
            Band::new(1000.0, 3000.0),
            KeepMode::RejectInBand,
            &mut buffers,
            &mut mask,
            &mut out,
        )
        .unwrap();

        assert!(out[20].norm() < 1e-9);
        assert!((out[4].norm() - 32.0).abs() < 1e-6);
    }

    #[test]
    fn amplitude_uses_real_part_only() {
        let ctx = GccContext::new(16, 1600, 360).unwrap();
        // A sine puts its energy in the imaginary part of bins 2 and 14.
        let signal: Vec<f64> = (0..16)
            .map(|i| (2.0 * std::f64::consts::PI * 2.0 * i as f64 / 16.0).sin())
            .collect();
        let mut buffers = FftBuffers::default();
        let mut mask = Vec::new();
        let mut out = Vec::new();
        band_limit(
            &ctx,
            &signal,
            Band::new(0.0, 800.0),
            KeepMode::InBand,
            &mut buffers,
            &mut mask,
            &mut out,
        )
        .unwrap();
        assert!(out.iter().all(|c| c.norm() < 1e-9));
    }

    #[test]
    fn large_transform_matches_per_bin_reconstruction() {
        let n = PARALLEL_BIN_THRESHOLD;
        let ctx = GccContext::new(n, 48000, 360).unwrap();
        let band = Band::new(300.0, 5000.0);
        let mut state = 7u32;
        let signal: Vec<f64> = (0..n)
            .map(|_| {
                state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                (state >> 8) as f64 / (1u32 << 24) as f64 * 2.0 - 1.0
            })
            .collect();

        let mut buffers = FftBuffers::default();
        let mut mask = Vec::new();
        let mut out = Vec::new();
        band_limit(&ctx, &signal, band, KeepMode::InBand, &mut buffers, &mut mask, &mut out)
            .unwrap();
        assert_eq!(out.len(), n);

        let mut spectrum = FftBuffers::default();
        spectrum.load_real(&signal);
        ctx.fft().forward(&mut spectrum.re, &mut spectrum.im).unwrap();
        let mut expected_mask = Vec::new();
        band.fill_mask(ctx.axis(), &mut expected_mask);

        for i in 0..n {
            let (re, im) = (spectrum.re[i], spectrum.im[i]);
            let amplitude = match expected_mask[i] {
                BinClass::OutOfBand => 0.0,
                _ => re.abs(),
            };
            let expected = ctx.phases().lookup(im.atan2(re)) * amplitude;
            assert!(
                (out[i] - expected).norm() < 1e-12,
                "bin {}: {} vs {}",
                i,
                out[i],
                expected
            );
        }
        assert!(out.iter().any(|c| c.norm() > 0.0));
    }

    #[test]
    fn wrong_length_is_engine_misuse() {
        let ctx = GccContext::new(16, 1600, 360).unwrap();
        let mut out = Vec::new();
        let err = band_limit(
            &ctx,
            &[0.0; 8],
            Band::new(0.0, 800.0),
            KeepMode::InBand,
            &mut FftBuffers::default(),
            &mut Vec::new(),
            &mut out,
        )
        .unwrap_err();
        assert_eq!(err, GccError::LengthMismatch { expected: 16, actual: 8 });
    }
}
