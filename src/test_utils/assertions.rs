pub fn assert_sums_to_one(scores: &[f64]) {
    let sum: f64 = scores.iter().sum();
    assert!((sum - 1.0).abs() <= 1e-9, "scores sum to {} instead of 1: {:?}", sum, scores);
}
