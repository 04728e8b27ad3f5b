//! Integration tests for TaskStorage over the memory and file media.
//!
//! Covers the stored layout, corruption recovery and quota behaviour, with
//! the same expectations checked against both media where they apply.

use tasklist::store::{FileStorage, FileTab, MemoryStorage, MemoryTab, StorageBackend, TaskStorage};
use tasklist::{StorageOperation, Task, TaskService, TaskListConfig, DEFAULT_STORAGE_KEY};

fn sample(id: &str, completed: bool) -> Task {
    Task {
        id: id.to_string(),
        description: format!("task {id}"),
        completed,
        created_at: "2025-01-15T10:30:00.000Z".to_string(),
        updated_at: "2025-01-15T10:30:00.000Z".to_string(),
    }
}

fn memory() -> TaskStorage<MemoryTab> {
    TaskStorage::new(MemoryStorage::new().open_tab())
}

// ─── Stored Layout ──────────────────────────────────────────────────────────

mod layout {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    #[test]
    fn collection_is_a_bare_json_array() {
        let storage = memory();
        storage.save(&[sample("a", true)]).unwrap();

        let raw = storage
            .backend()
            .get_item(DEFAULT_STORAGE_KEY)
            .unwrap()
            .unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            json!([{
                "id": "a",
                "description": "task a",
                "completed": true,
                "createdAt": "2025-01-15T10:30:00.000Z",
                "updatedAt": "2025-01-15T10:30:00.000Z"
            }])
        );
    }

    #[test]
    fn browser_dumps_load_unchanged() {
        let storage = memory();
        let dump = r#"[{"id":"6f9619ff-8b86-4d01-b42d-00cf4fc964ff","description":"Buy milk","completed":false,"createdAt":"2025-01-15T10:30:00.000Z","updatedAt":"2025-01-15T10:31:12.345Z"}]"#;
        storage
            .backend()
            .set_item(DEFAULT_STORAGE_KEY, dump)
            .unwrap();

        let tasks = storage.load().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].updated_at, "2025-01-15T10:31:12.345Z");

        storage.save(&tasks).unwrap();
        assert_eq!(
            storage.backend().get_item(DEFAULT_STORAGE_KEY).unwrap().as_deref(),
            Some(dump)
        );
    }

    #[test]
    fn save_replaces_rather_than_merges() {
        let storage = memory();
        storage.save(&[sample("a", false), sample("b", false)]).unwrap();
        storage.save(&[sample("c", false)]).unwrap();
        assert_eq!(storage.load().unwrap(), vec![sample("c", false)]);
    }
}

// ─── Corruption Recovery ────────────────────────────────────────────────────

mod corruption {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case::truncated(r#"[{"id":"a","descr"#)]
    #[case::plain_text("hello")]
    #[case::object(r#"{"tasks": []}"#)]
    #[case::number("7")]
    #[case::string(r#""[]""#)]
    #[case::empty("")]
    fn unreadable_content_loads_empty(#[case] raw: &str) {
        let storage = memory();
        storage.backend().set_item(DEFAULT_STORAGE_KEY, raw).unwrap();
        assert_eq!(storage.load().unwrap(), Vec::<Task>::new());
    }

    #[test]
    fn only_well_shaped_records_survive() {
        let storage = memory();
        let raw = r#"[
            {"id":"a","description":"ok","completed":false,"createdAt":"t1","updatedAt":"t1"},
            {"id":"b","description":"ok","completed":null,"createdAt":"t1","updatedAt":"t1"},
            {"id":"c","description":["no"],"completed":false,"createdAt":"t1","updatedAt":"t1"},
            {"id":"d","description":"ok","completed":true,"createdAt":"t1"},
            null,
            42,
            {"id":"e","description":"ok","completed":true,"createdAt":"t2","updatedAt":"t2"}
        ]"#;
        storage.backend().set_item(DEFAULT_STORAGE_KEY, raw).unwrap();

        let ids: Vec<String> = storage.load().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["a", "e"]);
    }

    #[test]
    fn service_lists_empty_over_corruption() {
        let tab = MemoryStorage::new().open_tab();
        tab.set_item(DEFAULT_STORAGE_KEY, "<html>").unwrap();
        assert!(TaskService::new(tab).list().unwrap().is_empty());
    }
}

// ─── File Medium ────────────────────────────────────────────────────────────

mod file_medium {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file_storage(dir: &std::path::Path) -> TaskStorage<FileTab> {
        TaskStorage::new(FileStorage::open(dir).unwrap().open_tab())
    }

    #[test]
    fn collection_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = vec![sample("a", false), sample("b", true)];
        file_storage(dir.path()).save(&tasks).unwrap();

        assert_eq!(file_storage(dir.path()).load().unwrap(), tasks);
    }

    #[test]
    fn clear_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = file_storage(dir.path());
        storage.save(&[sample("a", false)]).unwrap();
        let path = storage.backend().storage().path_for(DEFAULT_STORAGE_KEY);
        assert!(path.exists());

        storage.clear().unwrap();
        assert!(!path.exists());
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = file_storage(dir.path());
        let path = storage.backend().storage().path_for(DEFAULT_STORAGE_KEY);
        std::fs::write(path, b"\x00\x01 garbage").unwrap();
        assert!(storage.load().unwrap().is_empty());
    }

    #[test]
    fn non_utf8_file_loads_empty_and_can_be_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let medium = FileStorage::open(dir.path()).unwrap();
        let path = medium.path_for(DEFAULT_STORAGE_KEY);
        std::fs::write(&path, b"\xff\xfe garbage").unwrap();

        let service = TaskService::new(medium.open_tab());
        assert!(service.list().unwrap().is_empty());

        let task = service.create("after corruption").unwrap();
        assert_eq!(service.list().unwrap(), vec![task]);

        std::fs::write(&path, b"\xff\xfe garbage").unwrap();
        service.storage().clear().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn service_over_configured_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let config = TaskListConfig::default()
            .with_storage_key("work")
            .with_data_dir(dir.path());
        let medium = config.open_file_storage().unwrap();

        let service = TaskService::with_config(medium.open_tab(), &config);
        let task = service.create("persisted").unwrap();
        drop(service);

        let reopened = TaskService::with_config(
            config.open_file_storage().unwrap().open_tab(),
            &config,
        );
        assert_eq!(reopened.get(&task.id).unwrap(), Some(task));
        assert!(dir.path().join("work.json").exists());
    }

    #[test]
    fn file_quota_maps_to_quota_error() {
        let dir = tempfile::tempdir().unwrap();
        let tab = FileStorage::open_with_quota(dir.path(), 64).unwrap().open_tab();
        let storage = TaskStorage::new(tab);

        let err = storage.save(&[sample("a", false)]).unwrap_err();
        assert_eq!(err.operation(), Some(StorageOperation::Write));
        assert!(err.is_quota_exceeded());
        assert!(storage.load().unwrap().is_empty());
    }
}
