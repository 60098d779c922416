/// Standard weighted-random pick over `(index, weight)` pairs using
/// `fastrand`. Falls back to a uniform pick if every weight is zero.
pub fn weighted_pick(weights: &[u64]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: u64 = weights.iter().sum();
    if total == 0 {
        return Some(fastrand::usize(..weights.len()));
    }
    let mut roll = fastrand::u64(..total);
    for (idx, &w) in weights.iter().enumerate() {
        if roll < w {
            return Some(idx);
        }
        roll -= w;
    }
    Some(weights.len() - 1)
}

/// Weighted pick excluding one index (Random strategy: "pick a
/// *different* upstream, excluding the failed one").
pub fn weighted_pick_excluding(weights: &[u64], exclude: usize) -> Option<usize> {
    if weights.len() <= 1 {
        return None;
    }
    let candidates: Vec<usize> = (0..weights.len()).filter(|&i| i != exclude).collect();
    let sub_weights: Vec<u64> = candidates.iter().map(|&i| weights[i]).collect();
    weighted_pick(&sub_weights).map(|sub_idx| candidates[sub_idx])
}

/// Picks two distinct indices by weighted random (ParallelBest).
pub fn weighted_pick_two(weights: &[u64]) -> Option<(usize, usize)> {
    if weights.len() < 2 {
        return None;
    }
    let first = weighted_pick(weights)?;
    let second = weighted_pick_excluding(weights, first)?;
    Some((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_nonzero_weight_always_wins() {
        let weights = [0, 0, 7, 0];
        for _ in 0..20 {
            assert_eq!(weighted_pick(&weights), Some(2));
        }
    }

    #[test]
    fn two_distinct_picks_never_equal() {
        let weights = [10, 10, 10];
        for _ in 0..50 {
            let (a, b) = weighted_pick_two(&weights).unwrap();
            assert_ne!(a, b);
        }
    }

    #[test]
    fn all_zero_weights_falls_back_to_uniform() {
        let weights = [0, 0, 0];
        let pick = weighted_pick(&weights).unwrap();
        assert!(pick < 3);
    }
}
