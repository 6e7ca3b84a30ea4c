use thiserror::Error;

/// Errors raised by the GCC-PHAT core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GccError {
    #[error("buffer size {0} is not a power of two")]
    NotPowerOfTwo(usize),

    #[error("transform size 2^{log_len} exceeds the supported maximum of 2^{max}")]
    TooLarge { log_len: u32, max: u32 },

    #[error("channel lengths differ: {left} vs {right} samples")]
    ChannelLengthMismatch { left: usize, right: usize },

    #[error("sample rate must be positive")]
    InvalidSampleRate,

    #[error("phase lookup table needs at least one point")]
    EmptyLookupTable,

    #[error("FFT engine used before initialization")]
    NotInitialized,

    #[error("engine prepared for {expected} points but received {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("non-finite sample at offset {offset} of channel {channel}")]
    NonFiniteSample { channel: char, offset: usize },
}

impl GccError {
    /// Whether the error must abort the whole run rather than skip one window.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GccError::NonFiniteSample { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_data_errors_are_recoverable() {
        assert!(!GccError::NonFiniteSample { channel: 'A', offset: 3 }.is_fatal());
        assert!(GccError::NotInitialized.is_fatal());
        assert!(GccError::LengthMismatch { expected: 8, actual: 4 }.is_fatal());
        assert!(GccError::NotPowerOfTwo(1000).is_fatal());
    }

    #[test]
    fn messages_name_the_offending_values() {
        let err = GccError::ChannelLengthMismatch { left: 10, right: 12 };
        assert_eq!(err.to_string(), "channel lengths differ: 10 vs 12 samples");
    }
}
