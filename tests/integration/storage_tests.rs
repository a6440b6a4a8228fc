//! Integration tests for the on-disk layout under `<base>/data`.

use std::fs;

use sensorctl::adapters::fs_storage::FsStorage;
use sensorctl::adapters::state_store::StateStore;
use sensorctl::adapters::trigger_store::{TRIGGER_SCHEMA, TriggerStore};
use sensorctl::app::ports::{StatePort, TriggerStorePort};
use sensorctl::control::schema::{state_fingerprint, state_key};
use sensorctl::control::{ControlProfile, ControlVariable, HostProfile};
use sensorctl::trigger::ControlTrigger;

use super::mock_hw::at;

fn trigger(name: &str) -> ControlTrigger {
    ControlTrigger {
        name: name.into(),
        variable: ControlVariable::Dehumidifier,
        to: false,
        time: at("2024-03-01T22:30:00Z"),
        daily: true,
        hold_time: None,
    }
}

#[test]
fn state_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    let profile = HostProfile::RaspberryPi1.build().unwrap();
    let fp = profile.schema_fingerprint();
    assert_eq!(fp, state_fingerprint("raspberrypi-1"));

    let mut store = StateStore::new(FsStorage::new(dir.path()), "raspberrypi-1", fp);
    store.save(&profile.params().default_state()).unwrap();

    let path = dir
        .path()
        .join("shortly/raspberrypi-1")
        .join(state_key(fp));
    assert!(path.is_file(), "{} missing", path.display());
    assert!(
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(".control_state-"))
    );

    assert_eq!(store.load(), Some(profile.params().default_state()));
    assert!(!path.exists());
}

#[test]
fn truncated_state_file_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let fp = state_fingerprint("raspberrypi-0");
    let mut store = StateStore::new(FsStorage::new(dir.path()), "pi", fp);
    let profile = HostProfile::RaspberryPi0.build().unwrap();
    store.save(&profile.params().default_state()).unwrap();

    let path = dir.path().join("shortly/pi").join(state_key(fp));
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    assert_eq!(store.load(), None);
    assert!(!path.exists());
}

#[test]
fn trigger_files_are_tagged_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = TriggerStore::new(FsStorage::new(dir.path()), "pi");
    store.put(&trigger("night")).unwrap();

    let path = dir.path().join("triggers/pi/night.json");
    let json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(json["schema"], TRIGGER_SCHEMA);
    assert_eq!(json["trigger"]["variable"], "dehumidifier");
    assert_eq!(json["trigger"]["daily"], true);
}

#[test]
fn hand_edited_trigger_files_load() {
    let dir = tempfile::tempdir().unwrap();
    let ns = dir.path().join("triggers/pi");
    fs::create_dir_all(&ns).unwrap();
    fs::write(
        ns.join("manual.json"),
        format!(
            r#"{{"schema":"{TRIGGER_SCHEMA}","trigger":{{"name":"manual","variable":"ventilation","to":true,"time":"2024-03-01T08:00:00Z"}}}}"#
        ),
    )
    .unwrap();
    fs::write(ns.join("broken.json"), "{").unwrap();

    let store = TriggerStore::new(FsStorage::new(dir.path()), "pi");
    let all = store.load_all();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "manual");
    assert!(!all[0].daily);
    assert_eq!(all[0].hold_time, None);
}

#[test]
fn hosts_do_not_share_triggers() {
    let dir = tempfile::tempdir().unwrap();
    let mut a = TriggerStore::new(FsStorage::new(dir.path()), "raspberrypi-0");
    a.put(&trigger("night")).unwrap();
    let b = TriggerStore::new(FsStorage::new(dir.path()), "raspberrypi-1");
    assert!(b.load_all().is_empty());
    assert_eq!(a.load_all().len(), 1);
}
