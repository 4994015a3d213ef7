//! k-Disagreeing-Neighbours (kDN) instance hardness.
//!
//! The hardness of an instance is the fraction of its `k` nearest neighbours
//! (Euclidean distance, the instance itself excluded) whose label differs
//! from its own. Scores lie in `[0, 1]`: 0 means every neighbour agrees,
//! 1 means every neighbour disagrees.
//!
//! Neighbours are found by incremental masking: the nearest candidate not yet
//! taken is kept and marked, the instance itself never being a candidate.
//! Equal distances therefore resolve to the lowest index, and distances that
//! overflow to infinity still rank behind every finite one.

use thiserror::Error;

use crate::domain::InstanceSet;

/// Errors from hardness scoring.
#[derive(Debug, Error, PartialEq)]
pub enum HardnessError {
    #[error("k = {k} is invalid for {n} instances (need 0 < k < n)")]
    InvalidK { k: usize, n: usize },

    #[error("instance {row} has a non-finite feature")]
    NonFinite { row: usize },
}

/// Full pairwise Euclidean distance matrix (`n × n`, zero diagonal).
pub fn euclidean_distances(features: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = features.len();
    let mut distances = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(&features[i], &features[j]);
            distances[i][j] = d;
            distances[j][i] = d;
        }
    }
    distances
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Select the `k` nearest neighbours of every row, excluding the row itself.
///
/// Every row gets exactly `k` neighbours, nearest first.
pub fn find_k_neighbours(
    distances: &[Vec<f64>],
    k: usize,
) -> Result<Vec<Vec<usize>>, HardnessError> {
    let n = distances.len();
    check_k(k, n)?;

    let mut neighbours = Vec::with_capacity(n);
    for (i, row) in distances.iter().enumerate() {
        let mut taken = vec![false; row.len()];
        taken[i] = true;
        let mut current = Vec::with_capacity(k);
        while current.len() < k {
            let Some(min_ix) = argmin_untaken(row, &taken) else {
                break;
            };
            taken[min_ix] = true;
            current.push(min_ix);
        }
        neighbours.push(current);
    }
    Ok(neighbours)
}

/// Index of the smallest value not yet taken; the first one wins on ties.
fn argmin_untaken(row: &[f64], taken: &[bool]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (j, &value) in row.iter().enumerate() {
        if taken[j] {
            continue;
        }
        match best {
            Some(b) if row[b] <= value => {}
            _ => best = Some(j),
        }
    }
    best
}

/// Compute the kDN hardness of every instance in the set.
pub fn kdn_hardness(instances: &InstanceSet, k: usize) -> Result<Vec<f64>, HardnessError> {
    check_k(k, instances.len())?;
    if let Some(row) = instances
        .features()
        .iter()
        .position(|x| x.iter().any(|v| !v.is_finite()))
    {
        return Err(HardnessError::NonFinite { row });
    }

    let distances = euclidean_distances(instances.features());
    let neighbours = find_k_neighbours(&distances, k)?;
    let labels = instances.labels();

    Ok(neighbours
        .iter()
        .enumerate()
        .map(|(i, nn)| {
            let disagreeing = nn.iter().filter(|&&j| labels[j] != labels[i]).count();
            disagreeing as f64 / k as f64
        })
        .collect())
}

fn check_k(k: usize, n: usize) -> Result<(), HardnessError> {
    if k == 0 || k >= n {
        return Err(HardnessError::InvalidK { k, n });
    }
    Ok(())
}

/// Bucket counts of a hardness vector into `bins` equal-width bins over [0, 1].
///
/// A score of exactly 1.0 lands in the last bin.
pub fn histogram(hardness: &[f64], bins: usize) -> Vec<usize> {
    let mut counts = vec![0; bins];
    if bins == 0 {
        return counts;
    }
    for &h in hardness {
        let idx = ((h * bins as f64) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_set(labels: Vec<u8>) -> InstanceSet {
        let features = (0..labels.len()).map(|i| vec![i as f64]).collect();
        InstanceSet::new(features, labels).unwrap()
    }

    #[test]
    fn distances_symmetric_with_zero_diagonal() {
        let d = euclidean_distances(&[vec![0.0, 0.0], vec![3.0, 4.0], vec![6.0, 8.0]]);
        assert_eq!(d[0][0], 0.0);
        assert!((d[0][1] - 5.0).abs() < 1e-12);
        assert!((d[0][2] - 10.0).abs() < 1e-12);
        assert_eq!(d[1][2], d[2][1]);
    }

    #[test]
    fn neighbours_exclude_self() {
        let d = euclidean_distances(&[vec![0.0], vec![1.0], vec![2.0], vec![3.0]]);
        let nn = find_k_neighbours(&d, 2).unwrap();
        for (i, row) in nn.iter().enumerate() {
            assert_eq!(row.len(), 2);
            assert!(!row.contains(&i));
        }
        assert_eq!(nn[0], vec![1, 2]);
    }

    #[test]
    fn duplicate_points_never_select_self() {
        // Identical points: distance 0 to the other copy and to itself.
        let d = euclidean_distances(&[vec![1.0], vec![1.0], vec![5.0]]);
        let nn = find_k_neighbours(&d, 1).unwrap();
        assert_eq!(nn[0], vec![1]);
        assert_eq!(nn[1], vec![0]);
    }

    #[test]
    fn ties_resolve_to_lowest_index() {
        // Instance 1 is equidistant from 0 and 2.
        let d = euclidean_distances(&[vec![0.0], vec![1.0], vec![2.0]]);
        let nn = find_k_neighbours(&d, 1).unwrap();
        assert_eq!(nn[1], vec![0]);
    }

    #[test]
    fn kdn_known_values() {
        // 0 0 1 1 on a line, k = 1:
        // 0 -> 1 (same), 1 -> 0 (same, tie with 2 resolved low),
        // 2 -> 1 (diff, tie with 3 resolved low), 3 -> 2 (same)
        let set = line_set(vec![0, 0, 1, 1]);
        let h = kdn_hardness(&set, 1).unwrap();
        assert_eq!(h, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn kdn_all_same_label_is_zero() {
        let set = line_set(vec![1; 6]);
        let h = kdn_hardness(&set, 3).unwrap();
        assert!(h.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn kdn_alternating_labels_is_hard() {
        let set = line_set(vec![0, 1, 0, 1, 0, 1]);
        let h = kdn_hardness(&set, 2).unwrap();
        // Interior points have both neighbours of the opposite label.
        assert_eq!(h[2], 1.0);
        assert_eq!(h[3], 1.0);
    }

    #[test]
    fn k_must_be_below_instance_count() {
        let set = line_set(vec![0, 1, 0]);
        assert_eq!(
            kdn_hardness(&set, 3),
            Err(HardnessError::InvalidK { k: 3, n: 3 })
        );
        assert_eq!(
            kdn_hardness(&set, 0),
            Err(HardnessError::InvalidK { k: 0, n: 3 })
        );
        assert!(kdn_hardness(&set, 2).is_ok());
    }

    #[test]
    fn non_finite_features_rejected() {
        let set = InstanceSet::new(vec![vec![0.0], vec![f64::NAN], vec![1.0]], vec![0, 1, 0]).unwrap();
        assert_eq!(kdn_hardness(&set, 1), Err(HardnessError::NonFinite { row: 1 }));
    }

    #[test]
    fn overflowing_distances_still_yield_k_neighbours() {
        // 1e200 - (-1e200) squared overflows to +inf.
        let features = vec![vec![1e200], vec![-1e200], vec![-1e200]];
        let d = euclidean_distances(&features);
        assert_eq!(d[0][1], f64::INFINITY);
        let nn = find_k_neighbours(&d, 1).unwrap();
        assert_eq!(nn, vec![vec![1], vec![2], vec![1]]);

        let set = InstanceSet::new(features, vec![0, 1, 1]).unwrap();
        assert_eq!(kdn_hardness(&set, 1).unwrap(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn histogram_puts_one_in_last_bin() {
        let counts = histogram(&[0.0, 0.2, 0.5, 1.0, 1.0], 5);
        assert_eq!(counts, vec![1, 1, 1, 0, 2]);
    }
}
