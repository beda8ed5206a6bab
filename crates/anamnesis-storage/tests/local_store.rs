use anamnesis_core::models::anamnesis::AnamnesisData;
use anamnesis_core::models::diagnosis::Diagnosis;
use anamnesis_core::models::saved_case::SavedCase;
use anamnesis_core::reconcile::reconcile_diagnoses;
use anamnesis_storage::api_key::ApiKeyStore;
use anamnesis_storage::cases::{CASES_KEY, CaseStore};
use anamnesis_storage::error::StorageError;
use anamnesis_storage::store::LocalStore;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Sample {
    name: String,
    count: u32,
}

async fn store() -> (tempfile::TempDir, LocalStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path().join("data")).await.unwrap();
    (dir, store)
}

fn case(complaint: &str) -> SavedCase {
    let anamnesis = AnamnesisData {
        chief_complaint: complaint.to_string(),
        hpi: "Dor há dois dias".to_string(),
        ..AnamnesisData::default()
    };
    let diagnoses = reconcile_diagnoses(vec![Diagnosis::new("Gastrite", 40, "")], Vec::new());
    SavedCase::new(anamnesis, &diagnoses, Vec::new())
}

#[tokio::test]
async fn state_round_trip_and_missing_key() {
    let (_dir, store) = store().await;

    let missing: Option<Sample> = store.load_state("sample").await.unwrap();
    assert!(missing.is_none());

    let value = Sample {
        name: "x".to_string(),
        count: 3,
    };
    store.save_state("sample", &value).await.unwrap();
    let loaded: Option<Sample> = store.load_state("sample").await.unwrap();
    assert_eq!(loaded, Some(value));

    assert!(store.delete_state("sample").await.unwrap());
    assert!(!store.delete_state("sample").await.unwrap());
    assert!(!store.root().join("sample.json.tmp").exists());
}

#[tokio::test]
async fn keys_cannot_escape_the_store() {
    let (_dir, store) = store().await;
    for key in ["", "../etc", "a/b", "with space", "dot.json"] {
        assert!(matches!(store.path_for(key), Err(StorageError::InvalidKey(_))), "{key}");
    }
    assert!(store.path_for("saved_cases").is_ok());
}

#[cfg(unix)]
#[tokio::test]
async fn state_files_are_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, store) = store().await;
    store.save_state("sample", &1u32).await.unwrap();
    let mode = std::fs::metadata(store.path_for("sample").unwrap())
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test]
async fn api_key_is_trimmed_and_blank_rejected() {
    let (_dir, store) = store().await;
    let keys = ApiKeyStore::new(store);

    assert_eq!(keys.load_api_key().await.unwrap(), None);
    assert!(matches!(keys.save_api_key("   ").await, Err(StorageError::EmptyApiKey)));

    keys.save_api_key("  AIzaSyTestKey1234 \n").await.unwrap();
    assert_eq!(keys.load_api_key().await.unwrap().as_deref(), Some("AIzaSyTestKey1234"));

    assert!(keys.clear_api_key().await.unwrap());
    assert_eq!(keys.load_api_key().await.unwrap(), None);
}

#[tokio::test]
async fn cases_are_saved_newest_first() {
    let (_dir, store) = store().await;
    let cases = CaseStore::new(store);
    assert!(cases.load_cases().await.is_empty());

    let first = case("Dor abdominal");
    let second = case("Cefaleia");
    cases.save_case(first.clone()).await.unwrap();
    let list = cases.save_case(second.clone()).await.unwrap();

    assert_eq!(list.len(), 2);
    assert_eq!(list[0].id, second.id);
    assert_eq!(list[1].id, first.id);
    assert_eq!(cases.load_cases().await, list);
    assert!(list[0].name.starts_with("Paciente - "));
}

#[tokio::test]
async fn resaving_a_case_moves_it_to_the_front() {
    let (_dir, store) = store().await;
    let cases = CaseStore::new(store);

    let mut first = case("Dor abdominal");
    cases.save_case(first.clone()).await.unwrap();
    cases.save_case(case("Cefaleia")).await.unwrap();

    first.anamnesis_data.hpi = "Atualizada".to_string();
    let list = cases.save_case(first.clone()).await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].anamnesis_data.hpi, "Atualizada");
}

#[tokio::test]
async fn case_without_chief_complaint_is_refused() {
    let (_dir, store) = store().await;
    let cases = CaseStore::new(store);

    let err = cases.save_case(case("  ")).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidCase(_)));
    assert!(cases.load_cases().await.is_empty());
}

#[tokio::test]
async fn delete_and_find() {
    let (_dir, store) = store().await;
    let cases = CaseStore::new(store);
    let saved = case("Tosse");
    cases.save_case(saved.clone()).await.unwrap();

    assert_eq!(cases.find_case(&saved.id).await, Some(saved.clone()));
    assert!(cases.delete_case(&saved.id).await.unwrap().is_empty());
    assert!(cases.find_case(&saved.id).await.is_none());
    assert!(matches!(
        cases.delete_case(&saved.id).await,
        Err(StorageError::NotFound { .. })
    ));
}

#[tokio::test]
async fn corrupt_history_loads_as_empty() {
    let (_dir, store) = store().await;
    std::fs::write(store.path_for(CASES_KEY).unwrap(), b"{not json").unwrap();

    let cases = CaseStore::new(store);
    assert!(cases.load_cases().await.is_empty());

    // The next save replaces the corrupt file.
    cases.save_case(case("Febre")).await.unwrap();
    assert_eq!(cases.load_cases().await.len(), 1);
}

#[tokio::test]
async fn unreadable_history_is_never_overwritten() {
    let (_dir, store) = store().await;
    let cases = CaseStore::new(store.clone());
    let kept = cases.save_case(case("Tosse")).await.unwrap();

    // A directory in place of the history file makes every read fail with
    // an I/O error rather than a parse error.
    let path = store.path_for(CASES_KEY).unwrap();
    let backup = path.with_extension("bak");
    std::fs::rename(&path, &backup).unwrap();
    std::fs::create_dir(&path).unwrap();

    assert!(matches!(
        cases.save_case(case("Febre")).await,
        Err(StorageError::Read(_))
    ));
    assert!(matches!(
        cases.delete_case(&kept[0].id).await,
        Err(StorageError::Read(_))
    ));
    assert!(path.is_dir());

    std::fs::remove_dir(&path).unwrap();
    std::fs::rename(&backup, &path).unwrap();
    let history = cases.load_cases().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, kept[0].id);
}
