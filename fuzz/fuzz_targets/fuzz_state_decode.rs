//! Fuzz target: persisted control state
//!
//! Feeds arbitrary bytes through the state slot and verifies:
//! - No panics under arbitrary byte inputs
//! - A record is consumed by the first load, whatever its content
//! - Whatever decodes also re-encodes into a decodable record
//!
//! cargo fuzz run fuzz_state_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use sensorctl::adapters::mem_storage::MemStorage;
use sensorctl::adapters::state_store::StateStore;
use sensorctl::app::ports::{StatePort, StoragePort};
use sensorctl::control::schema::{self, state_fingerprint, state_key};

fuzz_target!(|data: &[u8]| {
    let fp = state_fingerprint("raspberrypi-0");

    if let Ok(state) = schema::decode(data, fp) {
        let bytes = schema::encode(&state, fp).expect("decoded state must encode");
        assert!(schema::decode(&bytes, fp).is_ok());
    }

    let mut storage = MemStorage::new();
    storage
        .write("shortly/fuzz", &state_key(fp), data)
        .expect("in-memory write");
    let mut store = StateStore::new(storage, "fuzz", fp);
    let _ = store.load();
    assert!(
        !store.storage().exists(store.namespace(), store.key()),
        "record must be consumed by load"
    );
    assert!(store.load().is_none());
});
