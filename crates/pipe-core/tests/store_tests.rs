mod common;

use common::{model, Model, ModelGlobal, Settings, SettingsGlobal};
use pipe_core::{CoreError, Global, GlobalsStore, StoreConfig, TupleTreeGlobal};

fn store() -> GlobalsStore {
    let mut store = GlobalsStore::new();
    store.emplace("model.json", ModelGlobal::new(model(&[("0x1000", "main")])));
    store.emplace("settings.json", SettingsGlobal::new(Settings { flags: vec!["fast".into()] }));
    store
}

fn serialized(store: &GlobalsStore, name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    store.serialize(name, &mut out).unwrap();
    out
}

#[test]
fn typed_lookup_distinguishes_missing_from_wrong_type() {
    let store = store();
    assert_eq!(store.get::<ModelGlobal>("model.json").unwrap().get(), &model(&[("0x1000", "main")]));

    let err = store.get::<SettingsGlobal>("model.json").unwrap_err();
    assert!(matches!(err, CoreError::WrongType { ref name, .. } if name == "model.json"));

    let err = store.get::<ModelGlobal>("missing").unwrap_err();
    assert!(matches!(err, CoreError::NotFound { ref name } if name == "missing"));
    assert!(matches!(store.get::<SettingsGlobal>("missing"), Err(CoreError::NotFound { .. })));
}

#[test]
fn copies_are_independent() {
    let mut original = store();
    let copy = original.clone();
    let before = serialized(&copy, "model.json");

    original.get_mut::<ModelGlobal>("model.json")
            .unwrap()
            .get_mut()
            .functions
            .insert("0x2000".into(), "helper".into());
    assert_eq!(serialized(&copy, "model.json"), before);

    let mut copy = copy;
    copy.get_mut::<SettingsGlobal>("settings.json").unwrap().clear();
    assert_eq!(original.get::<SettingsGlobal>("settings.json").unwrap().get().flags, vec!["fast".to_string()]);
}

#[test]
fn diff_reports_one_entry_per_global() {
    let before = store();
    let mut after = before.clone();
    after.get_mut::<ModelGlobal>("model.json")
         .unwrap()
         .get_mut()
         .functions
         .insert("0x2000".into(), "helper".into());

    let diffs = before.diff(&after);
    assert_eq!(diffs.len(), 2);
    assert!(diffs["settings.json"].is_empty());
    let model_diff = diffs["model.json"].get_as::<Model>().unwrap();
    assert_eq!(model_diff.len(), 1);
    assert_eq!(model_diff.changes()[0].path.to_string(), "/Functions/0x2000");

    // el diff serializado lleva `before` a `after`
    let mut patched = before.clone();
    patched.apply_diff("model.json", &diffs["model.json"].to_bytes().unwrap()).unwrap();
    assert!(patched.diff(&after).values().all(|d| d.is_empty()));
}

#[test]
fn single_global_passthrough_requires_the_name() {
    let mut store = store();
    let mut sink = Vec::new();
    assert!(matches!(store.serialize("nope", &mut sink), Err(CoreError::NotFound { .. })));
    assert!(matches!(store.deserialize("nope", b"{}"), Err(CoreError::NotFound { .. })));

    store.deserialize("settings.json", br#"{"Flags": ["a", "b"]}"#).unwrap();
    assert_eq!(store.get::<SettingsGlobal>("settings.json").unwrap().get().flags.len(), 2);
    assert!(matches!(store.deserialize("settings.json", b"{"), Err(CoreError::Parse { .. })));
}

#[test]
fn disk_round_trip_uses_the_context_directory() {
    let dir = tempfile::tempdir().unwrap();
    let original = store();
    original.store_to_disk(dir.path()).unwrap();
    assert!(dir.path().join("context").join("model.json").is_file());
    assert!(dir.path().join("context").join("settings.json").is_file());

    let mut restored = GlobalsStore::new();
    restored.emplace_default::<ModelGlobal>("model.json");
    restored.emplace_default::<SettingsGlobal>("settings.json");
    restored.load_from_disk(dir.path()).unwrap();
    assert!(original.diff(&restored).values().all(|d| d.is_empty()));
    assert_eq!(original.fingerprints().unwrap(), restored.fingerprints().unwrap());
}

#[test]
fn loading_missing_files_resets_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = store();
    store.load_from_disk(dir.path()).unwrap();
    assert_eq!(store.get::<ModelGlobal>("model.json").unwrap().get(), &Model::default());
    assert_eq!(store.get::<SettingsGlobal>("settings.json").unwrap().get(), &Settings::default());
}

#[test]
fn custom_context_dir_is_honored() {
    let dir = tempfile::tempdir().unwrap();
    let config = StoreConfig { context_dir: "globals".into() };
    let mut store = GlobalsStore::with_config(config);
    store.emplace("model.json", ModelGlobal::new(model(&[("0x1", "f")])));
    store.store_to_disk(dir.path()).unwrap();
    assert!(dir.path().join("globals").join("model.json").is_file());
}

#[test]
fn store_fails_fast_when_the_root_is_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("state");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let err = store().store_to_disk(&blocker).unwrap_err();
    match err {
        CoreError::Io { path, .. } => assert!(path.starts_with(&blocker)),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn load_reports_parse_failures() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("context")).unwrap();
    std::fs::write(dir.path().join("context").join("model.json"), b"{ broken").unwrap();

    let mut store = store();
    assert!(matches!(store.load_from_disk(dir.path()), Err(CoreError::Parse { .. })));
}

#[test]
fn removed_globals_are_no_longer_reachable() {
    let mut store = store();
    let removed = store.remove("settings.json").expect("was registered");
    assert!(removed.is::<SettingsGlobal>());
    assert!(!store.contains("settings.json"));
    assert_eq!(store.names().collect::<Vec<_>>(), vec!["model.json"]);
}

#[test]
#[should_panic(expected = "registered twice")]
fn duplicate_names_are_a_contract_violation() {
    let mut store = store();
    store.emplace("model.json", ModelGlobal::default());
}

#[test]
#[should_panic(expected = "missing from the other store")]
fn diffing_mismatched_stores_is_a_contract_violation() {
    let left = store();
    let mut right = GlobalsStore::new();
    right.emplace("model.json", ModelGlobal::default());
    right.emplace("other.json", TupleTreeGlobal::<Settings>::default());
    let _ = left.diff(&right);
}

#[test]
fn names_that_escape_the_context_dir_are_rejected() {
    for name in ["../x", "a/b", "a\\b", "..", ".", ""] {
        let result = std::panic::catch_unwind(|| {
            let mut store = GlobalsStore::new();
            store.emplace(name, ModelGlobal::default());
        });
        assert!(result.is_err(), "{name:?} was accepted");
    }

    let mut store = GlobalsStore::new();
    store.emplace("..model.json", ModelGlobal::default());
    assert!(store.contains("..model.json"));
}
