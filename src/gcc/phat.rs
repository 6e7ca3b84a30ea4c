use rustfft::num_complex::Complex;

use super::error::GccError;
use super::fft::{Fft2, FftBuffers};

/// Smallest cross-power magnitude used as a PHAT denominator.
pub const PHAT_FLOOR: f64 = 1e-6;

/// Cross-correlate two spectra and write the real correlation sequence to `out`.
///
/// With `normalize` set every bin of `A * conj(B)` is divided by its own
/// magnitude (floored at [`PHAT_FLOOR`]), leaving only the phase difference.
pub fn cross_correlation(
    fft: &Fft2,
    spectrum_a: &[Complex<f64>],
    spectrum_b: &[Complex<f64>],
    normalize: bool,
    buffers: &mut FftBuffers,
    out: &mut Vec<f64>,
) -> Result<(), GccError> {
    if spectrum_a.len() != spectrum_b.len() {
        return Err(GccError::LengthMismatch {
            expected: spectrum_a.len(),
            actual: spectrum_b.len(),
        });
    }

    buffers.re.clear();
    buffers.im.clear();
    for (a, b) in spectrum_a.iter().zip(spectrum_b) {
        let pxy = a * b.conj();
        let denom = if normalize { pxy.norm().max(PHAT_FLOOR) } else { 1.0 };
        buffers.re.push(pxy.re / denom);
        buffers.im.push(pxy.im / denom);
    }

    fft.inverse(&mut buffers.re, &mut buffers.im)?;

    // The imaginary residue of a conjugate-symmetric spectrum is dropped.
    out.clear();
    out.extend_from_slice(&buffers.re);
    Ok(())
}
