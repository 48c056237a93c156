//! Property tests over randomly generated key sets

use mmap_index::{BoxError, Capacity, IndexBuilder, IndexError, IndexReader, Item, KeyKind, inspect};
use proptest::collection::{btree_map, btree_set};
use proptest::prelude::*;
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Blob {
    key: Vec<u8>,
    value: Vec<u8>,
}

impl Item for Blob {
    type Key = Vec<u8>;

    fn key(&self) -> Vec<u8> {
        self.key.clone()
    }

    fn encode(&self) -> Result<Vec<u8>, BoxError> {
        Ok(self.value.clone())
    }

    fn decode(bytes: &[u8]) -> Result<Self, BoxError> {
        Ok(Self {
            key: Vec::new(),
            value: bytes.to_vec(),
        })
    }
}

#[derive(Debug)]
struct Signed(i64);

impl Item for Signed {
    type Key = i64;

    fn key(&self) -> i64 {
        self.0
    }

    fn encode(&self) -> Result<Vec<u8>, BoxError> {
        Ok(self.0.to_le_bytes().to_vec())
    }

    fn decode(bytes: &[u8]) -> Result<Self, BoxError> {
        let raw: [u8; 8] = bytes.try_into()?;
        Ok(Self(i64::from_le_bytes(raw)))
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_stored_byte_key_is_found(
        entries in btree_map(prop::collection::vec(any::<u8>(), 0..24), prop::collection::vec(any::<u8>(), 0..32), 0..300),
        absent in prop::collection::vec(any::<u8>(), 0..24),
    ) {
        let dir = tempdir().unwrap();
        let index_path = dir.path().join("index");
        let data_path = dir.path().join("data");

        let mut builder = IndexBuilder::new(Capacity::for_items(entries.len() as u64).unwrap())
            .with_sync(false);
        builder
            .insert_all(entries.iter().map(|(k, v)| Blob { key: k.clone(), value: v.clone() }))
            .unwrap();
        let stats = builder.finish(&index_path, &data_path).unwrap();
        prop_assert_eq!(stats.items, entries.len() as u64);

        let reader = IndexReader::<Blob>::open(&index_path, &data_path).unwrap();
        for (key, value) in &entries {
            prop_assert_eq!(reader.get_raw(key.as_slice()).unwrap(), value.as_slice());
        }
        if !entries.contains_key(&absent) {
            prop_assert!(matches!(reader.get(absent.as_slice()), Err(IndexError::NotFound)));
        }

        let report = inspect(reader.table(), KeyKind::Bytes);
        prop_assert!(report.is_ok(), "{:?}", report.problems);
    }

    #[test]
    fn every_stored_int_key_is_found(keys in btree_set(any::<i64>(), 0..300)) {
        let dir = tempdir().unwrap();
        let index_path = dir.path().join("index");
        let data_path = dir.path().join("data");

        let mut builder = IndexBuilder::new(Capacity::for_items(keys.len() as u64).unwrap())
            .with_sync(false);
        builder.insert_all(keys.iter().copied().map(Signed)).unwrap();
        builder.finish(&index_path, &data_path).unwrap();

        let reader = IndexReader::<Signed>::open(&index_path, &data_path).unwrap();
        for &key in &keys {
            prop_assert_eq!(reader.get(&key).unwrap().0, key);
        }
    }

    #[test]
    fn duplicate_keys_always_rejected(keys in prop::collection::vec(any::<i32>(), 1..100)) {
        let mut builder = IndexBuilder::<Signed>::new(Capacity::for_items(keys.len() as u64 * 2).unwrap());
        for &key in &keys {
            match builder.insert(&Signed(i64::from(key))) {
                Ok(()) => {}
                Err(IndexError::DuplicateKey(_)) => {}
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }
        }
        let distinct: std::collections::BTreeSet<_> = keys.iter().collect();
        prop_assert_eq!(builder.len(), distinct.len() as u64);
    }
}
