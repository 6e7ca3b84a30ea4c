//! In-place iterative radix-2 complex FFT over split real/imaginary buffers.
//!
//! The engine only stores the bit-reversal permutation for its length, so a
//! single instance can be shared read-only between worker threads.

use std::f64::consts::PI;

use super::error::GccError;

/// Largest supported transform, 2^MAX_LOG_LEN points.
pub const MAX_LOG_LEN: u32 = 28;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    Forward,
    Inverse,
}

#[derive(Clone, Debug, Default)]
pub struct Fft2 {
    log_len: u32,
    /// Bit-reversed target of every index; empty until initialized.
    rev: Vec<usize>,
}

impl Fft2 {
    /// Engine for transforms of `2^log_len` points.
    pub fn new(log_len: u32) -> Result<Self, GccError> {
        let mut fft = Self::default();
        fft.init(log_len)?;
        Ok(fft)
    }

    /// Engine for transforms of `len` points; `len` must be a power of two.
    pub fn for_len(len: usize) -> Result<Self, GccError> {
        if len == 0 || !len.is_power_of_two() {
            return Err(GccError::NotPowerOfTwo(len));
        }
        Self::new(len.trailing_zeros())
    }

    pub fn init(&mut self, log_len: u32) -> Result<(), GccError> {
        if log_len > MAX_LOG_LEN {
            return Err(GccError::TooLarge {
                log_len,
                max: MAX_LOG_LEN,
            });
        }
        let len = 1usize << log_len;
        self.log_len = log_len;
        self.rev = (0..len).map(|i| bit_reverse(i, log_len)).collect();
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        !self.rev.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rev.len()
    }

    #[cfg(test)]
    pub fn bit_reversal(&self) -> &[usize] {
        &self.rev
    }

    pub fn forward(&self, re: &mut [f64], im: &mut [f64]) -> Result<(), GccError> {
        self.run(re, im, Direction::Forward)
    }

    /// Inverse transform, scaled by `1/N`.
    pub fn inverse(&self, re: &mut [f64], im: &mut [f64]) -> Result<(), GccError> {
        self.run(re, im, Direction::Inverse)
    }

    fn check_len(&self, actual: usize) -> Result<usize, GccError> {
        if !self.is_initialized() {
            return Err(GccError::NotInitialized);
        }
        let expected = self.len();
        if actual != expected {
            return Err(GccError::LengthMismatch { expected, actual });
        }
        Ok(expected)
    }

    fn run(&self, re: &mut [f64], im: &mut [f64], direction: Direction) -> Result<(), GccError> {
        let n = self.check_len(re.len())?;
        self.check_len(im.len())?;

        if direction == Direction::Inverse {
            let scale = 1.0 / n as f64;
            re.iter_mut().chain(im.iter_mut()).for_each(|x| *x *= scale);
        }

        // Decimation in frequency: the butterfly span halves every stage while
        // the number of independent sub-transforms doubles.
        let mut span = n >> 1;
        let mut spacing = n;
        let mut w_index_step = 1usize;

        for _stage in 0..self.log_len {
            let mut w_angle_inc = w_index_step as f64 * 2.0 * PI / n as f64;
            if direction == Direction::Forward {
                w_angle_inc = -w_angle_inc;
            }
            let (w_mul_im, w_mul_re) = w_angle_inc.sin_cos();

            for start in (0..n).step_by(spacing) {
                let mut w_re = 1.0;
                let mut w_im = 0.0;

                for fly in 0..span {
                    let top = start + fly;
                    let bot = top + span;

                    let (top_re, top_im) = (re[top], im[top]);
                    let (bot_re, bot_im) = (re[bot], im[bot]);

                    re[top] = top_re + bot_re;
                    im[top] = top_im + bot_im;

                    let diff_re = top_re - bot_re;
                    let diff_im = top_im - bot_im;
                    re[bot] = diff_re * w_re - diff_im * w_im;
                    im[bot] = diff_re * w_im + diff_im * w_re;

                    let t_re = w_re;
                    w_re = w_re * w_mul_re - w_im * w_mul_im;
                    w_im = t_re * w_mul_im + w_im * w_mul_re;
                }
            }

            span >>= 1;
            spacing >>= 1;
            w_index_step <<= 1;
        }

        // The permutation is an involution, so swapping pairs once restores
        // natural order.
        for (i, &target) in self.rev.iter().enumerate() {
            if i < target {
                re.swap(i, target);
                im.swap(i, target);
            }
        }

        Ok(())
    }
}

/// Split real/imaginary staging buffers fed to [`Fft2`].
#[derive(Clone, Debug, Default)]
pub struct FftBuffers {
    pub re: Vec<f64>,
    pub im: Vec<f64>,
}

impl FftBuffers {
    pub fn new(len: usize) -> Self {
        Self {
            re: vec![0.0; len],
            im: vec![0.0; len],
        }
    }

    /// Overwrite with a real signal and a zero imaginary part.
    pub fn load_real(&mut self, signal: &[f64]) {
        self.re.clear();
        self.re.extend_from_slice(signal);
        self.im.clear();
        self.im.resize(signal.len(), 0.0);
    }
}

fn bit_reverse(mut x: usize, bits: u32) -> usize {
    let mut y = 0;
    for _ in 0..bits {
        y = (y << 1) | (x & 1);
        x >>= 1;
    }
    y
}
