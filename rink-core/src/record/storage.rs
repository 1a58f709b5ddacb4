//! Record storage and aggregation.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// A storage of records with aggregation.
///
/// Scalar values stored under the same key more than once are aggregated into
/// `<key>_min`, `<key>_max`, `<key>_mean` and `<key>_median`. A scalar stored only
/// once is passed through under its own key. For other types of values, the most
/// recent one is kept.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::INFINITY, f32::min)
}

fn max(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

fn mean(vs: &[f32]) -> f32 {
    vs.iter().sum::<f32>() / vs.len() as f32
}

/// Upper median, i.e., `vs[n / 2]` after sorting.
fn median(mut vs: Vec<f32>) -> f32 {
    vs.sort_by(|x, y| x.total_cmp(y));
    vs[vs.len() / 2]
}

impl RecordStorage {
    /// Creates a new empty storage.
    pub fn new() -> Self {
        Self { data: vec![] }
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// The number of stored records.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// If the storage has no records.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn get_keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            for k in record.keys() {
                keys.insert(k.clone());
            }
        }
        keys
    }

    fn aggregate_key(&self, key: &str) -> Record {
        let values: Vec<&RecordValue> = self.data.iter().filter_map(|r| r.get(key)).collect();
        let scalars: Vec<f32> = values
            .iter()
            .filter_map(|v| match v {
                RecordValue::Scalar(v) => Some(*v),
                _ => None,
            })
            .collect();

        if scalars.len() == values.len() {
            if scalars.len() == 1 {
                return Record::from_scalar(key, scalars[0]);
            }
            Record::from_slice(&[
                (format!("{}_min", key), RecordValue::Scalar(min(&scalars))),
                (format!("{}_max", key), RecordValue::Scalar(max(&scalars))),
                (format!("{}_mean", key), RecordValue::Scalar(mean(&scalars))),
                (format!("{}_median", key), RecordValue::Scalar(median(scalars))),
            ])
        } else {
            match values.last() {
                Some(v) => Record::from_slice(&[(key, (*v).clone())]),
                None => Record::empty(),
            }
        }
    }

    /// Aggregates all stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();
        for key in self.get_keys().iter() {
            record.merge_inplace(self.aggregate_key(key));
        }
        self.data.clear();
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_scalars() {
        let mut storage = RecordStorage::new();
        for v in [3.0f32, 1.0, 4.0, 2.0] {
            storage.store(Record::from_scalar("loss", v));
        }
        storage.store(Record::from_scalar("once", 7.0));

        let record = storage.aggregate();
        assert_eq!(record.get_scalar("loss_min").unwrap(), 1.0);
        assert_eq!(record.get_scalar("loss_max").unwrap(), 4.0);
        assert_eq!(record.get_scalar("loss_mean").unwrap(), 2.5);
        assert_eq!(record.get_scalar("loss_median").unwrap(), 3.0);
        assert_eq!(record.get_scalar("once").unwrap(), 7.0);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_aggregate_keeps_latest_non_scalar() {
        let mut storage = RecordStorage::new();
        storage.store(Record::from_slice(&[(
            "mode",
            RecordValue::String("normal".to_string()),
        )]));
        storage.store(Record::from_slice(&[(
            "mode",
            RecordValue::String("defense".to_string()),
        )]));

        let record = storage.aggregate();
        assert_eq!(record.get_string("mode").unwrap(), "defense");
    }
}
