pub mod skin_weights;

pub use skin_weights::{aggregate, InfluenceWeights};

/// Scales a raw weight row so it sums to one.
///
/// A row with no positive weight is returned as all zeros rather than divided by zero.
pub fn normalize_weights(row: &[f32]) -> Vec<f32> {
    let total: f32 = row.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return vec![0.0; row.len()];
    }
    row.iter().map(|w| w.max(0.0) / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_weights() {
        assert_eq!(normalize_weights(&[2.0, 2.0]), vec![0.5, 0.5]);
        assert_eq!(normalize_weights(&[1.0, 0.0, 3.0]), vec![0.25, 0.0, 0.75]);
        assert_eq!(normalize_weights(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert!(normalize_weights(&[]).is_empty());
    }
}
