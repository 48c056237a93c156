//! Build an index from a paged source and read every item back

mod common;

use common::{Account, User, pages, users};
use mmap_index::{
    Capacity, IndexBuilder, IndexConfig, IndexError, IndexReader, KeyKind, MmapIndex, inspect,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn test_hundred_users_in_pages_of_ten() {
    let dir = tempdir().unwrap();
    let all = users(100);

    let mut index = MmapIndex::<User>::new(IndexConfig::new(dir.path(), 100)).unwrap();
    assert_eq!(index.modulus(), 163);

    let stats = index.save(100, 10, pages(&all, 10)).unwrap();
    assert_eq!(stats.items, 100);
    assert_eq!(stats.modulus, 163);

    index.load().unwrap();
    let user = index.get("name:42").unwrap();
    assert_eq!(user, User::numbered(42));
    assert_eq!(user.email, "user42@example.com");

    for expected in &all {
        assert_eq!(&index.get(expected.name.as_str()).unwrap(), expected);
    }

    assert!(matches!(index.get("name:100"), Err(IndexError::NotFound)));
    assert!(index.get("").unwrap_err().is_not_found());
}

#[test]
fn test_owned_and_borrowed_keys_agree() {
    let dir = tempdir().unwrap();
    let all = users(20);
    let mut index = MmapIndex::<User>::new(IndexConfig::new(dir.path(), 20)).unwrap();
    index.save(20, 7, pages(&all, 7)).unwrap();
    index.load().unwrap();

    let owned = String::from("name:7");
    assert_eq!(index.get(&owned).unwrap(), index.get("name:7").unwrap());
}

#[test]
fn test_file_sizes() {
    let dir = tempdir().unwrap();
    let config = IndexConfig::new(dir.path(), 1000);
    let all = users(500);

    let mut index = MmapIndex::<User>::new(config.clone()).unwrap();
    let stats = index.save(500, 64, pages(&all, 64)).unwrap();

    // 1000 * 5 / 4 = 1250, next prime in the table is 1361
    assert_eq!(
        std::fs::metadata(config.index_path()).unwrap().len(),
        1361 * 16
    );
    assert_eq!(
        std::fs::metadata(config.data_path()).unwrap().len(),
        stats.data_bytes
    );
}

#[test]
fn test_built_table_verifies_clean() {
    let dir = tempdir().unwrap();
    let config = IndexConfig::new(dir.path(), 300);
    let all = users(300);
    let mut index = MmapIndex::<User>::new(config).unwrap();
    let stats = index.save(300, 50, pages(&all, 50)).unwrap();
    index.load().unwrap();

    let report = inspect(index.reader().unwrap().table(), KeyKind::Bytes);
    assert!(report.is_ok(), "{:?}", report.problems);
    assert_eq!(report.occupied, 300);
    assert_eq!(report.data_bytes, stats.data_bytes);
    assert_eq!(report.probe_lengths.keys().last().copied(), Some(stats.longest_probe));
}

#[test]
fn test_integer_keys_including_negative() {
    let dir = tempdir().unwrap();
    let index_path = dir.path().join("accounts.idx");
    let data_path = dir.path().join("accounts.dat");

    let ids = [i64::MIN, -1_000_000, -1, 0, 1, 163, 326, i64::MAX];
    let mut builder = IndexBuilder::new(Capacity::for_items(ids.len() as u64).unwrap());
    builder
        .insert_all(ids.iter().map(|&id| Account {
            id,
            balance: id.to_be_bytes().to_vec(),
        }))
        .unwrap();
    builder.finish(&index_path, &data_path).unwrap();

    let reader = IndexReader::<Account>::open(&index_path, &data_path).unwrap();
    for id in ids {
        assert_eq!(reader.get(&id).unwrap().balance, id.to_be_bytes());
    }
    assert!(!reader.contains(&2i64).unwrap());
    assert!(matches!(reader.get(&-2i64), Err(IndexError::NotFound)));

    let report = inspect(reader.table(), KeyKind::Int);
    assert!(report.is_ok(), "{:?}", report.problems);
}

#[test]
fn test_get_raw_borrows_value_bytes() {
    let dir = tempdir().unwrap();
    let index_path = dir.path().join("index");
    let data_path = dir.path().join("data");

    let mut builder = IndexBuilder::new(Capacity::for_items(1).unwrap());
    builder
        .insert(&Account {
            id: 5,
            balance: b"hello".to_vec(),
        })
        .unwrap();
    builder.finish(&index_path, &data_path).unwrap();

    let reader = IndexReader::<Account>::open(&index_path, &data_path).unwrap();
    assert_eq!(reader.get_raw(&5i64).unwrap(), b"hello");
    // Zigzag 5 = 10, one byte prefix
    assert_eq!(std::fs::read(&data_path).unwrap(), b"\x0ahello");
}

#[test]
fn test_empty_build() {
    let dir = tempdir().unwrap();
    let mut index = MmapIndex::<User>::new(IndexConfig::new(dir.path(), 10)).unwrap();
    let stats = index.save(0, 10, |_| Ok(Vec::new())).unwrap();
    assert_eq!(stats.items, 0);
    assert_eq!(stats.data_bytes, 0);

    index.load().unwrap();
    assert!(index.get("name:0").unwrap_err().is_not_found());
}

#[test]
fn test_rebuild_replaces_previous_files() {
    let dir = tempdir().unwrap();
    let mut index = MmapIndex::<User>::new(IndexConfig::new(dir.path(), 50)).unwrap();

    let first = users(10);
    index.save(10, 10, pages(&first, 10)).unwrap();
    index.load().unwrap();
    assert!(index.get("name:5").is_ok());

    let second: Vec<_> = (100..110).map(User::numbered).collect();
    index.save(10, 10, pages(&second, 10)).unwrap();
    assert!(matches!(index.get("name:105"), Err(IndexError::NotLoaded)));

    index.load().unwrap();
    assert!(index.get("name:5").unwrap_err().is_not_found());
    assert_eq!(index.get("name:105").unwrap(), User::numbered(105));
}

#[test]
fn test_duplicate_key_produces_no_files() {
    let dir = tempdir().unwrap();
    let config = IndexConfig::new(dir.path(), 20);
    let mut all = users(10);
    all.push(User::numbered(3));

    let mut index = MmapIndex::<User>::new(config.clone()).unwrap();
    let err = index.save(11, 4, pages(&all, 4)).unwrap_err();
    assert!(matches!(err, IndexError::DuplicateKey(ref key) if key == "\"name:3\""));

    assert!(!config.index_path().exists());
    assert!(!config.data_path().exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert!(matches!(index.load(), Err(IndexError::Io(_))));
}

#[test]
fn test_colliding_keys_both_retrievable() {
    let dir = tempdir().unwrap();
    let index_path = dir.path().join("index");
    let data_path = dir.path().join("data");

    // 1 and 164 share the first probe in a 163 slot table
    let accounts = [1i64, 164].map(|id| Account {
        id,
        balance: vec![id as u8],
    });
    let stats = IndexBuilder::new(Capacity::for_items(100).unwrap())
        .build_from_iter(&index_path, &data_path, accounts)
        .unwrap();
    assert_eq!(stats.modulus, 163);
    assert_eq!(stats.displaced, 1);

    let reader = IndexReader::<Account>::open(&index_path, &data_path).unwrap();
    assert_eq!(reader.get(&1i64).unwrap().balance, [1]);
    assert_eq!(reader.get(&164i64).unwrap().balance, [164]);
}
