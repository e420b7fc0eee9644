//! Sliding-window construction
//!
//! Windows advance by one sample. A series of length `n` yields `n - size`
//! windows: window `i` covers `[i, i + size)` and the sample right after it
//! (index `i + size`) is the row the window's score is reported on, so the
//! final full window, which has no following sample, is not produced.

use crate::{Error, Result};

/// Number of windows of length `size` built from `len` samples
pub fn window_count(len: usize, size: usize) -> usize {
    len.saturating_sub(size)
}

/// Build every window of length `size` over `values`
///
/// Fails with `InsufficientData` when fewer than `size + 1` values are
/// available, so callers never see an empty window set.
pub fn sliding_windows(values: &[f64], size: usize) -> Result<Vec<&[f64]>> {
    if size == 0 {
        return Err(Error::InvalidParameter(
            "window size must be at least 1".to_string(),
        ));
    }
    if values.len() < size + 1 {
        return Err(Error::insufficient(size + 1, values.len()));
    }
    Ok(values
        .windows(size)
        .take(window_count(values.len(), size))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_count_and_contents() {
        let values: Vec<f64> = (0..6).map(f64::from).collect();
        let windows = sliding_windows(&values, 3).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0], &[0.0, 1.0, 2.0]);
        assert_eq!(windows[2], &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_exactly_window_size_is_insufficient() {
        let values = vec![1.0; 30];
        match sliding_windows(&values, 30) {
            Err(Error::InsufficientData { expected, actual }) => {
                assert_eq!(expected, 31);
                assert_eq!(actual, 30);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(matches!(
            sliding_windows(&[1.0, 2.0], 0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_window_count_saturates() {
        assert_eq!(window_count(5, 10), 0);
        assert_eq!(window_count(31, 30), 1);
    }
}
