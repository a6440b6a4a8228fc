//! sensorctl library.
//!
//! Threshold and trigger control of LPD433 switched actuators (ventilation,
//! dehumidifier) from periodically sampled sensor values.  The pure control
//! logic lives in [`control`], [`trigger`] and [`scheduler`]; the run
//! lifecycle in [`app`]; everything touching the OS in [`adapters`],
//! [`sensors`] and [`shutdown`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod scheduler;
pub mod sensors;
pub mod shutdown;
pub mod trigger;
