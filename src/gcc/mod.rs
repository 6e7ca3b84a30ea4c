//! GCC-PHAT time-delay estimation between two channels.
//!
//! Per window: both buffers go through [`band::band_limit`] (FFT, band mask,
//! quantized phase reconstruction), [`phat::cross_correlation`] combines the
//! two spectra into a correlation sequence and [`delay::find_delay_ms`] picks
//! the centred peak. [`pipeline`] runs that over a whole recording.

pub mod band;
pub mod context;
pub mod delay;
pub mod error;
pub mod fft;
pub mod phase;
pub mod phat;
pub mod pipeline;

pub use band::Band;
pub use context::GccContext;
pub use pipeline::{process, DelaySeries, PipelineConfig};
