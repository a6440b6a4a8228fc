//! Fuzz target: trigger records
//!
//! Stores arbitrary bytes as a trigger record next to a valid one and
//! verifies that loading never panics and never loses the valid record.
//!
//! cargo fuzz run fuzz_trigger_store

#![no_main]

use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use sensorctl::adapters::mem_storage::MemStorage;
use sensorctl::adapters::trigger_store::TriggerStore;
use sensorctl::app::ports::{StoragePort, TriggerStorePort};
use sensorctl::control::ControlVariable;
use sensorctl::trigger::ControlTrigger;

fuzz_target!(|data: &[u8]| {
    let mut storage = MemStorage::new();
    storage
        .write("triggers/fuzz", "fuzzed.json", data)
        .expect("in-memory write");

    let mut store = TriggerStore::new(storage, "fuzz");
    let good = ControlTrigger {
        name: "good".into(),
        variable: ControlVariable::Ventilation,
        to: true,
        time: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        daily: true,
        hold_time: None,
    };
    store.put(&good).expect("valid trigger");

    let all = store.load_all();
    assert!(all.len() <= 2);
    assert!(all.contains(&good));
});
