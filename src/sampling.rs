//! Seeded random sampling: subsampling, train/test splits and oversampling

use crate::core::{Result, StackSampleError};
use crate::data::CombinedRecord;
use rand::seq::{index, SliceRandom};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

/// A reproducible RNG for a seed, or an OS-seeded one without
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// `k` distinct indices drawn uniformly from `0..n`, in ascending order
pub fn sample_indices(n: usize, k: usize, rng: &mut ChaCha8Rng) -> Vec<usize> {
    let mut picked = index::sample(rng, n, k.min(n)).into_vec();
    picked.sort_unstable();
    picked
}

/// Row indices grouped by tag, in tag order
fn indices_by_tag(records: &[CombinedRecord]) -> BTreeMap<&str, Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        groups.entry(record.tag.as_str()).or_default().push(i);
    }
    groups
}

/// Rows of the train and test partitions
#[derive(Debug, Clone, Default)]
pub struct TrainTestSplit {
    pub train: Vec<CombinedRecord>,
    pub test: Vec<CombinedRecord>,
}

/// Split rows into train and test partitions
///
/// The random split puts `ceil(test_size * n)` shuffled rows in the test
/// partition. The stratified split does the same per tag with
/// `round(test_size * n_tag)` rows, so each tag keeps its share.
pub fn train_test_split(
    records: &[CombinedRecord],
    test_size: f64,
    stratify: bool,
    rng: &mut ChaCha8Rng,
) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(StackSampleError::InvalidParameter(format!(
            "test size must be between 0 and 1, got: {test_size}"
        )));
    }

    let (train_idx, test_idx) = if stratify {
        let mut train_idx = Vec::new();
        let mut test_idx = Vec::new();
        for (_, mut group) in indices_by_tag(records) {
            group.shuffle(rng);
            let n_test = (test_size * group.len() as f64).round() as usize;
            test_idx.extend_from_slice(&group[..n_test]);
            train_idx.extend_from_slice(&group[n_test..]);
        }
        train_idx.shuffle(rng);
        test_idx.shuffle(rng);
        (train_idx, test_idx)
    } else {
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.shuffle(rng);
        // Guard against 0.7 * 10 = 7.000000000000001 rounding up
        let n_test = ((test_size * records.len() as f64) - 1e-9).ceil().max(0.0) as usize;
        let train_idx = order.split_off(n_test.min(order.len()));
        (train_idx, order)
    };

    if train_idx.is_empty() || test_idx.is_empty() {
        return Err(StackSampleError::InvalidDataset(format!(
            "test size {test_size} on {} rows leaves an empty partition ({} train, {} test)",
            records.len(),
            train_idx.len(),
            test_idx.len()
        )));
    }

    let take = |idx: &[usize]| -> Vec<CombinedRecord> {
        idx.iter().map(|&i| records[i].clone()).collect()
    };
    Ok(TrainTestSplit {
        train: take(&train_idx),
        test: take(&test_idx),
    })
}

/// Strategy for evening out tag frequencies in the train partition
pub trait OverSampler {
    /// Return the balanced rows; the input rows are kept
    fn resample(&self, records: Vec<CombinedRecord>, rng: &mut ChaCha8Rng) -> Vec<CombinedRecord>;
}

/// Duplicates random rows of each minority tag up to the majority count
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOverSampler;

impl OverSampler for RandomOverSampler {
    fn resample(
        &self,
        mut records: Vec<CombinedRecord>,
        rng: &mut ChaCha8Rng,
    ) -> Vec<CombinedRecord> {
        let groups: Vec<Vec<usize>> = indices_by_tag(&records).into_values().collect();
        let Some(majority) = groups.iter().map(Vec::len).max() else {
            return records;
        };

        let mut extra = Vec::new();
        for group in &groups {
            for _ in group.len()..majority {
                let pick = group[rng.gen_range(0..group.len())];
                extra.push(records[pick].clone());
            }
        }
        records.extend(extra);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(tags: &[&str]) -> Vec<CombinedRecord> {
        tags.iter()
            .enumerate()
            .map(|(i, tag)| CombinedRecord {
                question_id: i as u64,
                text: format!("text {i}"),
                tag: tag.to_string(),
            })
            .collect()
    }

    fn tag_counts(records: &[CombinedRecord]) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for r in records {
            *counts.entry(r.tag.clone()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_random_split_sizes() {
        let rows = records(&["a"; 10]);
        let split = train_test_split(&rows, 0.5, false, &mut seeded_rng(Some(1))).unwrap();
        assert_eq!(split.train.len(), 5);
        assert_eq!(split.test.len(), 5);

        let split = train_test_split(&rows, 0.2, false, &mut seeded_rng(Some(1))).unwrap();
        assert_eq!((split.train.len(), split.test.len()), (8, 2));

        let split = train_test_split(&rows, 0.7, false, &mut seeded_rng(Some(1))).unwrap();
        assert_eq!((split.train.len(), split.test.len()), (3, 7));

        let split = train_test_split(&rows, 0.25, false, &mut seeded_rng(Some(1))).unwrap();
        assert_eq!((split.train.len(), split.test.len()), (7, 3));
    }

    #[test]
    fn test_split_is_a_partition() {
        let rows = records(&["a", "b", "a", "b", "c", "c", "a"]);
        let split = train_test_split(&rows, 0.3, false, &mut seeded_rng(Some(9))).unwrap();
        let mut ids: Vec<u64> = split
            .train
            .iter()
            .chain(&split.test)
            .map(|r| r.question_id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..7).collect::<Vec<u64>>());
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let rows = records(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let first = train_test_split(&rows, 0.5, false, &mut seeded_rng(Some(5))).unwrap();
        let second = train_test_split(&rows, 0.5, false, &mut seeded_rng(Some(5))).unwrap();
        assert_eq!(first.train, second.train);
        assert_eq!(first.test, second.test);
    }

    #[test]
    fn test_stratified_split_keeps_proportions() {
        let mut tags = vec!["java"; 10];
        tags.extend(vec!["python"; 20]);
        let rows = records(&tags);
        let split = train_test_split(&rows, 0.2, true, &mut seeded_rng(Some(2))).unwrap();

        let test = tag_counts(&split.test);
        assert_eq!(test["java"], 2);
        assert_eq!(test["python"], 4);
        let train = tag_counts(&split.train);
        assert_eq!(train["java"], 8);
        assert_eq!(train["python"], 16);
    }

    #[test]
    fn test_invalid_test_size() {
        let rows = records(&["a", "b"]);
        for size in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let result = train_test_split(&rows, size, false, &mut seeded_rng(Some(0)));
            assert!(matches!(result, Err(StackSampleError::InvalidParameter(_))));
        }
    }

    #[test]
    fn test_empty_partition_is_error() {
        let rows = records(&["a"]);
        let result = train_test_split(&rows, 0.5, false, &mut seeded_rng(Some(0)));
        assert!(matches!(result, Err(StackSampleError::InvalidDataset(_))));
    }

    #[test]
    fn test_random_oversampler_balances() {
        let rows = records(&["a", "a", "a", "a", "b", "c", "c"]);
        let balanced = RandomOverSampler.resample(rows.clone(), &mut seeded_rng(Some(4)));

        let counts = tag_counts(&balanced);
        assert_eq!(counts["a"], 4);
        assert_eq!(counts["b"], 4);
        assert_eq!(counts["c"], 4);
        // Originals come first, duplicates only copy rows of their own tag
        assert_eq!(&balanced[..rows.len()], &rows[..]);
        for extra in &balanced[rows.len()..] {
            assert!(rows.contains(extra));
        }
    }

    #[test]
    fn test_random_oversampler_empty_input() {
        let balanced = RandomOverSampler.resample(Vec::new(), &mut seeded_rng(Some(4)));
        assert!(balanced.is_empty());
    }

    #[test]
    fn test_sample_indices() {
        let mut rng = seeded_rng(Some(11));
        let picked = sample_indices(100, 10, &mut rng);
        assert_eq!(picked.len(), 10);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
        assert!(picked.iter().all(|&i| i < 100));

        assert_eq!(sample_indices(3, 10, &mut rng), vec![0, 1, 2]);
    }
}
