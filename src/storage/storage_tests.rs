use super::*;

fn scope() -> Scope { Scope::new(7, 3) }

fn exercise_store(store: &dyn EntryStore) {
    let s = scope();
    assert!(store.list(&s).unwrap().is_empty());
    assert!(store.scopes().unwrap().is_empty());

    store.put(&s, Entry::dir("src")).unwrap();
    store.put(&s, Entry::file("src/main.go", "package main")).unwrap();
    let listed: Vec<String> = store.list(&s).unwrap().into_iter().map(|e| e.path).collect();
    assert_eq!(listed, vec!["src".to_string(), "src/main.go".to_string()]);
    assert_eq!(store.get(&s, "src/main.go").unwrap().map(|e| e.content), Some(b"package main".to_vec()));
    assert_eq!(store.scopes().unwrap(), vec![s]);

    // other scopes are independent namespaces
    let other = Scope::new(7, 4);
    assert!(store.get(&other, "src").unwrap().is_none());

    assert!(store.delete(&s, "src/main.go").unwrap());
    assert!(!store.delete(&s, "src/main.go").unwrap());

    let rejected = store
        .commit(&s, &WriteBatch::new().require(Precondition::Absent("src".into())).put(Entry::file("src", "x")))
        .unwrap();
    assert_eq!(rejected, CommitOutcome::Rejected(Precondition::Absent("src".into())));
    assert!(store.get(&s, "src").unwrap().unwrap().is_dir());

    assert!(store.delete(&s, "src").unwrap());
    assert!(store.scopes().unwrap().is_empty());
}

#[test]
fn memory_store_contract() {
    exercise_store(&MemoryEntryStore::new());
}

#[test]
fn snapshot_store_contract() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SnapshotEntryStore::new(tmp.path()).unwrap();
    exercise_store(&store);
}

#[test]
fn snapshot_store_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let s = scope();
    {
        let store = SnapshotEntryStore::new(tmp.path()).unwrap();
        store.put(&s, Entry::file("values.yaml", "replicas: 2")).unwrap();
    }
    let reopened = SnapshotEntryStore::new(tmp.path()).unwrap();
    let e = reopened.get(&s, "values.yaml").unwrap().unwrap();
    assert_eq!(e.content, b"replicas: 2".to_vec());
    assert!(tmp.path().join("7").join("3").join("entries.bin").is_file());
}

#[test]
fn snapshot_commit_replaces_file_without_leftovers() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SnapshotEntryStore::new(tmp.path()).unwrap();
    store.put(&scope(), Entry::file("a.txt", "one")).unwrap();
    store.put(&scope(), Entry::file("b.txt", "two")).unwrap();
    let dir = tmp.path().join("7").join("3");
    let names: Vec<String> = std::fs::read_dir(&dir).unwrap().map(|e| e.unwrap().file_name().to_string_lossy().to_string()).collect();
    assert_eq!(names, vec!["entries.bin".to_string()]);
    assert_eq!(store.list(&scope()).unwrap().len(), 2);
}

#[test]
fn snapshot_store_reports_corrupt_file() {
    let tmp = tempfile::tempdir().unwrap();
    let store = SnapshotEntryStore::new(tmp.path()).unwrap();
    let dir = tmp.path().join("7").join("3");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("entries.bin"), b"\x01").unwrap();
    assert!(store.list(&scope()).is_err());
}

#[test]
fn arc_wrapped_store_delegates() {
    let store = std::sync::Arc::new(MemoryEntryStore::with_entries(scope(), vec![Entry::dir("a")]));
    assert!(store.get(&scope(), "a").unwrap().is_some());
    assert_eq!(store.list(&scope()).unwrap().len(), 1);
}
