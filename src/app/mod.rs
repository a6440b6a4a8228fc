//! Application core: domain orchestration, zero direct I/O.
//!
//! This module contains the run lifecycle of the control engine: the
//! service owning state and pending triggers, and the sampling loop.
//! All interaction with hardware and storage happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod runner;
pub mod service;
