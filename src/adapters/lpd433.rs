//! LPD433 RF actuation adapter.
//!
//! Implements [`ActuationSink`] by sending the variable's on/off code
//! through a [`CodeTransmitter`].  Each transmission runs on a scoped
//! worker thread which is joined before `actuate` returns, so the control
//! tick never overlaps with an RF burst.
//!
//! - [`CommandTransmitter`]: hands the code to an external sender program.
//! - [`DryRunTransmitter`]: only logs what would have been sent.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use log::{debug, info, warn};

use crate::app::ports::ActuationSink;
use crate::control::params::Lpd433Codes;
use crate::control::{ControlParams, ControlVariable};
use crate::error::ActuationError;

/// Something that can put one code on the air.
pub trait CodeTransmitter: Sync {
    fn transmit(&self, codes: &Lpd433Codes, code: u32) -> Result<(), ActuationError>;
}

pub struct Lpd433Sink<T: CodeTransmitter> {
    codes: BTreeMap<ControlVariable, Lpd433Codes>,
    transmitter: T,
}

impl<T: CodeTransmitter> Lpd433Sink<T> {
    /// Sink for every variable of `params` that has codes configured.
    pub fn new(params: &ControlParams, transmitter: T) -> Self {
        let codes = params
            .variables()
            .filter_map(|v| v.codes.map(|c| (v.variable, c)))
            .collect();
        Self { codes, transmitter }
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }
}

impl<T: CodeTransmitter> ActuationSink for Lpd433Sink<T> {
    fn actuate(
        &mut self,
        variable: ControlVariable,
        to: bool,
        _hold_time: Option<f32>,
    ) -> Result<(), ActuationError> {
        let codes = self
            .codes
            .get(&variable)
            .ok_or(ActuationError::NotConfigured)?;
        let code = codes.code_for(to);
        debug!("LPD433: {} -> {} (code {:#08x})", variable, to, code);

        let transmitter = &self.transmitter;
        std::thread::scope(|s| {
            let worker = std::thread::Builder::new()
                .name("lpd433-tx".into())
                .spawn_scoped(s, move || transmitter.transmit(codes, code))
                .map_err(|e| {
                    warn!("LPD433: could not spawn transmit worker: {}", e);
                    ActuationError::TransmitterUnavailable
                })?;
            worker
                .join()
                .map_err(|_| ActuationError::WorkerPanicked)?
        })
    }
}

// ---------------------------------------------------------------------------
// External sender program
// ---------------------------------------------------------------------------

/// Runs `<program> <code> <bits> <repeats> <gap_us> <short_us> <long_us>`.
#[derive(Debug, Clone)]
pub struct CommandTransmitter {
    program: PathBuf,
}

impl CommandTransmitter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn args(codes: &Lpd433Codes, code: u32) -> [String; 6] {
        [
            code.to_string(),
            codes.n_bits.to_string(),
            codes.n_repeats.to_string(),
            codes.intercode_gap_us.to_string(),
            codes.pulse_length_short_us.to_string(),
            codes.pulse_length_long_us.to_string(),
        ]
    }
}

impl CodeTransmitter for CommandTransmitter {
    fn transmit(&self, codes: &Lpd433Codes, code: u32) -> Result<(), ActuationError> {
        let status = Command::new(&self.program)
            .args(Self::args(codes, code))
            .stdin(Stdio::null())
            .status()
            .map_err(|e| {
                warn!("LPD433: cannot run {}: {}", self.program.display(), e);
                ActuationError::TransmitterUnavailable
            })?;
        if status.success() {
            Ok(())
        } else {
            warn!("LPD433: {} exited with {}", self.program.display(), status);
            Err(ActuationError::TransmitFailed)
        }
    }
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct DryRunTransmitter;

impl CodeTransmitter for DryRunTransmitter {
    fn transmit(&self, codes: &Lpd433Codes, code: u32) -> Result<(), ActuationError> {
        info!(
            "LPD433 (dry run): code {:#08x}, {} bits x{}",
            code, codes.n_bits, codes.n_repeats
        );
        Ok(())
    }
}
