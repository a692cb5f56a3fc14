//! Evaluation metrics.

/// Fraction of predictions matching the true labels.
///
/// Returns 0.0 for empty input.
///
/// # Examples
///
/// ```
/// use lifeboat::metrics::accuracy;
///
/// let acc = accuracy(&[1, 0, 1, 1], &[1, 0, 0, 1]);
/// assert!((acc - 0.75).abs() < 1e-6);
/// ```
///
/// # Panics
///
/// Panics if the slices differ in length.
#[must_use]
pub fn accuracy(predicted: &[usize], actual: &[usize]) -> f32 {
    assert_eq!(
        predicted.len(),
        actual.len(),
        "predicted and actual must have the same length"
    );
    if predicted.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    correct as f32 / predicted.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_perfect() {
        assert_eq!(accuracy(&[0, 1, 1], &[0, 1, 1]), 1.0);
    }

    #[test]
    fn test_accuracy_none_correct() {
        assert_eq!(accuracy(&[0, 0], &[1, 1]), 0.0);
    }

    #[test]
    fn test_accuracy_empty() {
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_accuracy_length_mismatch() {
        accuracy(&[0], &[0, 1]);
    }
}
