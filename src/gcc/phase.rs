use std::f64::consts::PI;

use rustfft::num_complex::Complex;

use super::error::GccError;

/// Default table resolution: one entry per degree.
pub const DEFAULT_LOOKUP_POINTS: usize = 360;

/// Quantized `exp(i * phase)` table over `[-pi, pi)`.
///
/// Built once and only read afterwards; lookups snap to the nearest entry,
/// wrapping around at `+pi` so the error never exceeds half a step.
#[derive(Clone, Debug)]
pub struct PhaseTable {
    phases: Vec<f64>,
    exps: Vec<Complex<f64>>,
}

impl PhaseTable {
    pub fn build(points: usize) -> Result<Self, GccError> {
        if points == 0 {
            return Err(GccError::EmptyLookupTable);
        }
        let step = 2.0 * PI / points as f64;
        let phases: Vec<f64> = (0..points).map(|i| i as f64 * step - PI).collect();
        let exps = phases.iter().map(|&p| Complex::from_polar(1.0, p)).collect();
        Ok(Self { phases, exps })
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn lookup(&self, phase: f64) -> Complex<f64> {
        self.exps[self.nearest(phase)]
    }

    fn nearest(&self, phase: f64) -> usize {
        let last = self.phases.len() - 1;
        let idx = self.phases.partition_point(|&p| p < phase);

        if idx == 0 {
            return 0;
        }
        if idx > last {
            // Above the last sample the next candidate is -pi seen from +pi.
            let below = phase - self.phases[last];
            let above = self.phases[0] + 2.0 * PI - phase;
            return if above < below { 0 } else { last };
        }
        if (self.phases[idx - 1] - phase).abs() < (self.phases[idx] - phase).abs() {
            idx - 1
        } else {
            idx
        }
    }
}
