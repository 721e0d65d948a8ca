//! Robust statistics shared by the estimators.

/// Median of `values`; the mean of the two middle elements for even lengths.
///
/// Reorders `values` in place. Returns `None` for an empty slice. NaNs sort
/// after every finite value.
pub fn median(values: &mut [f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        return Some(upper);
    }
    let lower_max = lower.iter().copied().max_by(f64::total_cmp)?;
    Some(0.5 * (lower_max + upper))
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn median_of_odd_length() {
        let mut v = vec![9.0, 1.0, 5.0, 3.0, 7.0];
        assert_relative_eq!(median(&mut v).unwrap(), 5.0);
    }

    #[test]
    fn median_of_even_length_averages_middle_pair() {
        let mut v = vec![4.0, 1.0, 3.0, 2.0];
        assert_relative_eq!(median(&mut v).unwrap(), 2.5);
    }

    #[test]
    fn median_resists_single_outlier() {
        let mut v = vec![10.0, 10.1, 9.9, 0.2];
        assert_relative_eq!(median(&mut v).unwrap(), 9.95, epsilon = 1e-12);
    }

    #[test]
    fn empty_inputs_have_no_statistics() {
        assert!(median(&mut []).is_none());
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn mean_is_arithmetic() {
        assert_relative_eq!(mean(&[1.0, 2.0, 6.0]).unwrap(), 3.0);
    }
}
