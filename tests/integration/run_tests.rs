//! Integration tests for the sampling loop and cooperative shutdown.

use std::time::{Duration, Instant};

use chrono::TimeDelta;
use sensorctl::adapters::state_store::NoPersistence;
use sensorctl::app::runner::{self, RunOutcome, RunPlan};
use sensorctl::app::service::{ControlService, TickPorts};
use sensorctl::config::SystemConfig;
use sensorctl::control::ControlVariable;
use sensorctl::shutdown::{ShutdownToken, WaitOutcome};

use super::mock_hw::{
    MockActuator, RecordingSink, ScriptedCommands, ScriptedSensors, SteppingClock, at,
    co2_profile,
};

fn plan(samples: u32) -> RunPlan {
    RunPlan {
        run_start: at("2024-03-01T10:00:00Z"),
        sampling_interval: Duration::from_millis(5),
        samples,
        wait_slice: Duration::from_millis(1),
    }
}

fn service() -> ControlService {
    ControlService::new(Box::new(co2_profile()), SystemConfig::default(), &mut NoPersistence)
}

#[test]
fn run_completes_every_sample() {
    let mut svc = service();
    let mut sensors = ScriptedSensors::co2(&[650.0, 705.0, 705.0, 640.0]);
    let mut commands = ScriptedCommands::default();
    let mut actuator = MockActuator::default();
    let mut events = RecordingSink::default();
    let clock = SteppingClock::new(at("2024-03-01T10:00:03Z"), TimeDelta::seconds(3));
    let token = ShutdownToken::new();
    let plan = plan(4);

    svc.start(plan.run_start, &[], &mut events);
    let started = Instant::now();
    let outcome = runner::run(
        &mut svc,
        &plan,
        &clock,
        &token,
        &mut TickPorts {
            sensors: &mut sensors,
            commands: &mut commands,
            actuator: &mut actuator,
            events: &mut events,
        },
    );

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(svc.tick_count(), 4);
    assert_eq!(sensors.reads, 4);
    assert!(started.elapsed() >= plan.sampling_interval * 4);
    assert_eq!(svc.state().value(ControlVariable::Ventilation), Some(false));
    assert_eq!(actuator.calls.len(), 2);
    assert_eq!(svc.last_tick(), Some(at("2024-03-01T10:00:12Z")));
}

#[test]
fn shutdown_mid_run_never_starts_another_tick() {
    let token = ShutdownToken::new();
    let mut svc = service();
    let mut sensors = ScriptedSensors::co2(&[800.0; 10]).shutdown_after(2, &token);
    let mut commands = ScriptedCommands::default();
    let mut actuator = MockActuator::default();
    let mut events = RecordingSink::default();
    let clock = SteppingClock::new(at("2024-03-01T10:00:03Z"), TimeDelta::seconds(3));
    let plan = plan(10);

    svc.start(plan.run_start, &[], &mut events);
    let outcome = runner::run(
        &mut svc,
        &plan,
        &clock,
        &token,
        &mut TickPorts {
            sensors: &mut sensors,
            commands: &mut commands,
            actuator: &mut actuator,
            events: &mut events,
        },
    );

    assert_eq!(outcome, RunOutcome::Interrupted);
    // The tick during which shutdown was requested still finished.
    assert_eq!(svc.tick_count(), 2);
    assert_eq!(sensors.reads, 2);

    let stats = svc.finish(&mut NoPersistence, true, &mut events);
    assert_eq!(stats.ticks, 2);
}

#[test]
fn shutdown_before_run_does_nothing() {
    let token = ShutdownToken::new();
    token.request();
    let mut svc = service();
    let mut sensors = ScriptedSensors::co2(&[800.0]);
    let clock = SteppingClock::new(at("2024-03-01T10:00:03Z"), TimeDelta::seconds(3));

    let outcome = runner::run(
        &mut svc,
        &plan(3),
        &clock,
        &token,
        &mut TickPorts {
            sensors: &mut sensors,
            commands: &mut ScriptedCommands::default(),
            actuator: &mut MockActuator::default(),
            events: &mut RecordingSink::default(),
        },
    );
    assert_eq!(outcome, RunOutcome::Interrupted);
    assert_eq!(svc.tick_count(), 0);
    assert_eq!(sensors.reads, 0);
}

#[test]
fn wait_for_start_in_the_past_is_immediate() {
    let token = ShutdownToken::new();
    let clock = SteppingClock::new(at("2024-03-01T10:00:05Z"), TimeDelta::zero());
    let started = Instant::now();
    assert_eq!(runner::wait_for_start(&plan(1), &clock, &token), WaitOutcome::Elapsed);
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn wait_for_start_is_cancellable() {
    let token = ShutdownToken::new();
    // Start is an hour away.
    let clock = SteppingClock::new(at("2024-03-01T09:00:00Z"), TimeDelta::zero());
    let remote = token.clone();
    let requester = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        remote.request();
    });
    let started = Instant::now();
    assert_eq!(runner::wait_for_start(&plan(1), &clock, &token), WaitOutcome::Cancelled);
    assert!(started.elapsed() < Duration::from_secs(5));
    requester.join().unwrap();
}
