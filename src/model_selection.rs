//! Train/test splitting.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::Frame;
use crate::error::{LifeboatError, Result};

/// Shuffled row indices, reproducible when a seed is given.
fn shuffle_indices(n_samples: usize, random_state: Option<u64>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n_samples).collect();
    if let Some(seed) = random_state {
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
    } else {
        let mut rng = rand::thread_rng();
        indices.shuffle(&mut rng);
    }
    indices
}

/// Splits a frame and its labels into train and test partitions.
///
/// # Errors
///
/// Returns an error if lengths mismatch, `test_size` is outside (0, 1),
/// or either partition would be empty.
///
/// # Examples
///
/// ```
/// use lifeboat::data::{Column, Frame};
/// use lifeboat::model_selection::train_test_split;
///
/// let frame = Frame::new(vec![(
///     "x".to_string(),
///     Column::Float((0..10).map(|i| i as f32).collect()),
/// )]).unwrap();
/// let y: Vec<usize> = (0..10).map(|i| i % 2).collect();
///
/// let (train, test, y_train, y_test) =
///     train_test_split(&frame, &y, 0.2, Some(42)).unwrap();
/// assert_eq!(train.n_rows(), 8);
/// assert_eq!(test.n_rows(), 2);
/// assert_eq!(y_train.len(), 8);
/// assert_eq!(y_test.len(), 2);
/// ```
#[allow(clippy::type_complexity)]
pub fn train_test_split(
    frame: &Frame,
    y: &[usize],
    test_size: f32,
    random_state: Option<u64>,
) -> Result<(Frame, Frame, Vec<usize>, Vec<usize>)> {
    let n_samples = frame.n_rows();
    if n_samples != y.len() {
        return Err("Frame rows and label count must match".into());
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(LifeboatError::Other(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let n_test = ((n_samples as f32) * test_size).round() as usize;
    let n_train = n_samples - n_test;
    if n_train == 0 || n_test == 0 {
        return Err("Both partitions must be non-empty".into());
    }

    let indices = shuffle_indices(n_samples, random_state);
    let train_idx = &indices[..n_train];
    let test_idx = &indices[n_train..];

    let x_train = frame.take_rows(train_idx)?;
    let x_test = frame.take_rows(test_idx)?;
    let y_train = train_idx.iter().map(|&i| y[i]).collect();
    let y_test = test_idx.iter().map(|&i| y[i]).collect();

    Ok((x_train, x_test, y_train, y_test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    fn frame_of(n: usize) -> Frame {
        Frame::new(vec![(
            "x".to_string(),
            Column::Float((0..n).map(|i| i as f32).collect()),
        )])
        .expect("frame")
    }

    #[test]
    fn test_split_shapes() {
        let y: Vec<usize> = (0..10).map(|i| i % 2).collect();
        let (train, test, y_train, y_test) =
            train_test_split(&frame_of(10), &y, 0.2, Some(42)).expect("split");
        assert_eq!(train.n_rows(), 8);
        assert_eq!(test.n_rows(), 2);
        assert_eq!(y_train.len(), 8);
        assert_eq!(y_test.len(), 2);
    }

    #[test]
    fn test_split_reproducible_with_seed() {
        let y: Vec<usize> = (0..10).map(|i| i % 2).collect();
        let (a_train, _, a_y, _) =
            train_test_split(&frame_of(10), &y, 0.3, Some(7)).expect("split");
        let (b_train, _, b_y, _) =
            train_test_split(&frame_of(10), &y, 0.3, Some(7)).expect("split");
        assert_eq!(a_train, b_train);
        assert_eq!(a_y, b_y);
    }

    #[test]
    fn test_split_partitions_cover_all_rows() {
        let y = vec![0usize; 10];
        let (train, test, _, _) =
            train_test_split(&frame_of(10), &y, 0.4, Some(1)).expect("split");
        let mut seen: Vec<f32> = train
            .float_column("x")
            .expect("x")
            .iter()
            .chain(test.float_column("x").expect("x"))
            .copied()
            .collect();
        seen.sort_by(|a, b| a.partial_cmp(b).expect("comparable"));
        let expected: Vec<f32> = (0..10).map(|i| i as f32).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_split_invalid_test_size() {
        let y = vec![0, 1];
        assert!(train_test_split(&frame_of(2), &y, 0.0, None).is_err());
        assert!(train_test_split(&frame_of(2), &y, 1.0, None).is_err());
    }

    #[test]
    fn test_split_length_mismatch() {
        assert!(train_test_split(&frame_of(3), &[0, 1], 0.5, None).is_err());
    }
}
