//! Integration tests for the ControlService → engine → actuator pipeline.
//!
//! These drive the service tick by tick with mock adapters and verify the
//! observable behaviour: actuations, events and the persisted state.

use chrono::TimeDelta;
use sensorctl::adapters::fs_storage::FsStorage;
use sensorctl::adapters::mem_storage::MemStorage;
use sensorctl::adapters::state_store::StateStore;
use sensorctl::adapters::trigger_store::TriggerStore;
use sensorctl::app::events::AppEvent;
use sensorctl::app::ports::{StatePort, StoragePort, TriggerStorePort};
use sensorctl::app::service::{ControlService, TickPorts};
use sensorctl::config::SystemConfig;
use sensorctl::control::{ControlProfile, ControlVariable, HostProfile, OverrideSource, SensorInput};
use sensorctl::trigger::ControlTrigger;

use super::mock_hw::{
    ActuationCall, MockActuator, RecordingSink, ScriptedCommands, ScriptedSensors, at,
    co2_profile,
};

struct Rig {
    sensors: ScriptedSensors,
    commands: ScriptedCommands,
    actuator: MockActuator,
    events: RecordingSink,
}

impl Rig {
    fn new(co2: &[f32]) -> Self {
        Self {
            sensors: ScriptedSensors::co2(co2),
            commands: ScriptedCommands::default(),
            actuator: MockActuator::default(),
            events: RecordingSink::default(),
        }
    }

    /// Tick `n` times, 3 s apart, starting 3 s after `start`.
    fn drive(&mut self, svc: &mut ControlService, start: &str, n: i32) {
        let start = at(start);
        let mut ports = TickPorts {
            sensors: &mut self.sensors,
            commands: &mut self.commands,
            actuator: &mut self.actuator,
            events: &mut self.events,
        };
        for i in 1..=n {
            svc.tick(start + TimeDelta::seconds(3) * i, &mut ports);
        }
    }
}

// ── Threshold control end to end ──────────────────────────────

#[test]
fn co2_sequence_switches_ventilation_on_then_off() {
    let mut store = StateStore::new(MemStorage::new(), "pi", 1);
    let mut svc = ControlService::new(Box::new(co2_profile()), SystemConfig::default(), &mut store);
    let mut rig = Rig::new(&[650.0, 705.0, 705.0, 640.0]);

    svc.start(at("2024-03-01T10:00:00Z"), &[], &mut rig.events);
    rig.drive(&mut svc, "2024-03-01T10:00:00Z", 4);

    assert_eq!(
        rig.actuator.calls,
        vec![
            ActuationCall {
                variable: ControlVariable::Ventilation,
                to: true,
                hold_time: None,
            },
            ActuationCall {
                variable: ControlVariable::Ventilation,
                to: false,
                hold_time: None,
            },
        ]
    );
    assert_eq!(
        rig.events.changes(),
        vec![
            (ControlVariable::Ventilation, true, OverrideSource::Threshold),
            (ControlVariable::Ventilation, false, OverrideSource::Threshold),
        ]
    );
    assert_eq!(svc.tick_count(), 4);
    assert_eq!(svc.overrides_applied(), 2);
}

#[test]
fn actuation_failure_keeps_intended_value() {
    let mut store = StateStore::new(MemStorage::new(), "pi", 1);
    let mut svc = ControlService::new(Box::new(co2_profile()), SystemConfig::default(), &mut store);
    let mut rig = Rig::new(&[900.0]);
    rig.actuator = MockActuator::failing();

    svc.start(at("2024-03-01T10:00:00Z"), &[], &mut rig.events);
    rig.drive(&mut svc, "2024-03-01T10:00:00Z", 1);

    assert_eq!(svc.state().value(ControlVariable::Ventilation), Some(true));
    assert_eq!(rig.actuator.calls.len(), 1, "failed actuation is not retried");
    assert_eq!(
        rig.events
            .count(|e| matches!(e, AppEvent::ActuationFailed { .. })),
        1
    );
}

#[test]
fn manual_command_holds_against_threshold() {
    let mut store = StateStore::new(MemStorage::new(), "pi", 1);
    let mut svc = ControlService::new(Box::new(co2_profile()), SystemConfig::default(), &mut store);
    let mut rig = Rig::new(&[500.0, 500.0]);
    rig.commands = ScriptedCommands::new(vec![vec!["ventilation on"]]);

    svc.start(at("2024-03-01T10:00:00Z"), &[], &mut rig.events);
    rig.drive(&mut svc, "2024-03-01T10:00:00Z", 1);
    assert_eq!(svc.state().value(ControlVariable::Ventilation), Some(true));

    // Next tick without an override: low CO2 switches it back off.
    rig.drive(&mut svc, "2024-03-01T10:00:03Z", 1);
    assert_eq!(svc.state().value(ControlVariable::Ventilation), Some(false));
    assert_eq!(
        rig.events.changes(),
        vec![
            (ControlVariable::Ventilation, true, OverrideSource::Manual),
            (ControlVariable::Ventilation, false, OverrideSource::Threshold),
        ]
    );
}

// ── Triggers ──────────────────────────────────────────────────

#[test]
fn daily_trigger_fires_exactly_once_in_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut triggers = TriggerStore::new(FsStorage::new(dir.path()), "pi");
    triggers
        .put(&ControlTrigger {
            name: "morning".into(),
            variable: ControlVariable::Ventilation,
            to: true,
            time: at("2020-01-01T08:00:00Z"),
            daily: true,
            hold_time: Some(120.0),
        })
        .unwrap();

    let mut store = StateStore::new(MemStorage::new(), "pi", 1);
    let mut svc = ControlService::new(Box::new(co2_profile()), SystemConfig::default(), &mut store);
    let mut rig = Rig::new(&[]);

    svc.start(at("2024-03-01T07:59:50Z"), &triggers.load_all(), &mut rig.events);
    assert_eq!(svc.pending_triggers(), 1);
    rig.drive(&mut svc, "2024-03-01T07:59:50Z", 10);

    let fired: Vec<_> = rig
        .events
        .events
        .iter()
        .filter(|e| {
            matches!(
                e,
                AppEvent::OverrideApplied {
                    source: OverrideSource::Trigger,
                    ..
                }
            )
        })
        .collect();
    assert_eq!(fired.len(), 1);
    assert_eq!(
        rig.actuator.calls,
        vec![ActuationCall {
            variable: ControlVariable::Ventilation,
            to: true,
            hold_time: Some(120.0),
        }]
    );
    assert_eq!(svc.pending_triggers(), 0);
    // No CO2 reading yet, so nothing switches it back.
    assert_eq!(svc.state().value(ControlVariable::Ventilation), Some(true));
}

#[test]
fn daily_dehumidifier_trigger_is_not_undone_by_stale_dwell() {
    let profile = HostProfile::RaspberryPi0.build().unwrap();
    let mut state = profile.params().default_state();
    if let Some(v) = state.variable_mut(ControlVariable::Dehumidifier) {
        // Off for a long time already.
        v.hold_time_counter = 5000.0;
    }
    let mut store = StateStore::new(MemStorage::new(), "pi", profile.schema_fingerprint());
    store.save(&state).unwrap();

    let mut svc = ControlService::new(profile, SystemConfig::default(), &mut store);
    let trigger = ControlTrigger {
        name: "dry".into(),
        variable: ControlVariable::Dehumidifier,
        to: true,
        time: at("2020-01-01T08:00:00Z"),
        daily: true,
        hold_time: None,
    };
    let mut rig = Rig::new(&[]);
    rig.sensors = ScriptedSensors::readings(SensorInput::RelativeHumidity, &[50.0; 8]);
    svc.start(at("2024-03-01T07:59:50Z"), &[trigger], &mut rig.events);
    rig.drive(&mut svc, "2024-03-01T07:59:50Z", 4);
    assert_eq!(svc.state().value(ControlVariable::Dehumidifier), Some(true));

    // Dry air, but the active minimum of 900 s has not passed.
    rig.drive(&mut svc, "2024-03-01T08:00:02Z", 4);
    assert_eq!(svc.state().value(ControlVariable::Dehumidifier), Some(true));
    assert_eq!(
        rig.events.changes(),
        vec![(ControlVariable::Dehumidifier, true, OverrideSource::Trigger)]
    );
}

#[test]
fn trigger_outside_run_is_not_pending() {
    let mut store = StateStore::new(MemStorage::new(), "pi", 1);
    let mut svc = ControlService::new(Box::new(co2_profile()), SystemConfig::default(), &mut store);
    let trigger = ControlTrigger {
        name: "evening".into(),
        variable: ControlVariable::Ventilation,
        to: false,
        time: at("2024-03-01T20:00:00Z"),
        daily: false,
        hold_time: None,
    };
    svc.start(at("2024-03-01T10:00:00Z"), &[trigger], &mut RecordingSink::default());
    assert_eq!(svc.pending_triggers(), 0);
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn state_survives_restart_once() {
    let dir = tempfile::tempdir().unwrap();
    let profile = co2_profile();
    let fp = profile.schema_fingerprint();

    {
        let mut store = StateStore::new(FsStorage::new(dir.path()), "pi", fp);
        let mut svc = ControlService::new(Box::new(profile), SystemConfig::default(), &mut store);
        let mut rig = Rig::new(&[900.0]);
        svc.start(at("2024-03-01T10:00:00Z"), &[], &mut rig.events);
        rig.drive(&mut svc, "2024-03-01T10:00:00Z", 1);
        svc.finish(&mut store, false, &mut rig.events);
        assert!(store.storage().exists(store.namespace(), store.key()));
    }

    let mut store = StateStore::new(FsStorage::new(dir.path()), "pi", fp);
    let svc = ControlService::new(Box::new(co2_profile()), SystemConfig::default(), &mut store);
    assert_eq!(svc.state().value(ControlVariable::Ventilation), Some(true));
    assert_eq!(svc.state().input(SensorInput::Co2Ppm), Some(900.0));
    // Loading consumed the record.
    assert!(!store.storage().exists(store.namespace(), store.key()));
}

#[test]
fn other_profile_state_is_not_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let pi0 = HostProfile::RaspberryPi0.build().unwrap();
    let pi1 = HostProfile::RaspberryPi1.build().unwrap();

    let mut state = pi1.params().default_state();
    if let Some(v) = state.variable_mut(ControlVariable::Dehumidifier) {
        v.value = true;
    }
    StateStore::new(FsStorage::new(dir.path()), "pi", pi0.schema_fingerprint())
        .save(&state)
        .unwrap();

    let mut store = StateStore::new(FsStorage::new(dir.path()), "pi", pi1.schema_fingerprint());
    let svc = ControlService::new(pi1, SystemConfig::default(), &mut store);
    assert_eq!(svc.state().value(ControlVariable::Dehumidifier), Some(false));
}

#[test]
fn noop_profile_leaves_no_state_file() {
    let dir = tempfile::tempdir().unwrap();
    let noop = HostProfile::NoOp.build().unwrap();
    let fp = noop.schema_fingerprint();

    let mut store = StateStore::new(FsStorage::new(dir.path()), "pi", fp);
    store.save(&Default::default()).unwrap();

    let mut svc = ControlService::new(noop, SystemConfig::default(), &mut store);
    let mut rig = Rig::new(&[900.0]);
    svc.start(at("2024-03-01T10:00:00Z"), &[], &mut rig.events);
    rig.drive(&mut svc, "2024-03-01T10:00:00Z", 2);
    let stats = svc.finish(&mut store, false, &mut rig.events);

    assert_eq!(stats.ticks, 2);
    assert!(rig.actuator.calls.is_empty());
    assert!(!store.storage().exists(store.namespace(), store.key()));
    assert!(store.storage().keys(store.namespace()).unwrap().is_empty());
}
