/// Lag (in samples) of the correlation peak, with zero lag at the centre.
///
/// Equivalent to shifting the sequence left by `N/2` and taking the first
/// arg-max. An all-equal sequence (e.g. an all-zero correlation) resolves to
/// scan index 0, i.e. a lag of `-N/2`.
pub fn peak_lag(correlation: &[f64]) -> isize {
    let n = correlation.len();
    let half = n / 2;
    let mut max_index = 0usize;
    let mut max_value = f64::MIN;

    for i in 0..n {
        let value = correlation[(i + half) % n];
        if value > max_value {
            max_value = value;
            max_index = i;
        }
    }

    max_index as isize - half as isize
}

pub fn lag_to_ms(lag: isize, sample_rate: u32) -> f64 {
    lag as f64 / sample_rate as f64 * 1000.0
}

/// Delay in milliseconds; positive when the first signal lags the second.
pub fn find_delay_ms(correlation: &[f64], sample_rate: u32) -> f64 {
    lag_to_ms(peak_lag(correlation), sample_rate)
}
