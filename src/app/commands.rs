//! Inbound commands to the control engine.
//!
//! Manual overrides requested by the outside world (operator stdin, a
//! received remote code) that the
//! [`ControlTickEngine`](crate::control::ControlTickEngine) merges into the
//! next tick.

use core::fmt;
use core::str::FromStr;

use crate::control::{ControlVariable, Override, OverrideSource};

/// Where a manual command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommandOrigin {
    /// Typed by an operator (stdin, CLI).
    #[default]
    Operator,
    /// Decoded by an RF receiver.  May be the echo of our own transmission,
    /// so it is subject to the variable's ignore window.
    Radio,
}

/// Set `variable` to `to` right away.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualCommand {
    pub variable: ControlVariable,
    pub to: bool,
    /// Dwell time after the override, replacing the configured one.
    pub hold_time: Option<f32>,
    pub origin: CommandOrigin,
}

impl ManualCommand {
    pub fn with_origin(mut self, origin: CommandOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn to_override(&self) -> Override {
        Override::new(self.variable, self.to, self.hold_time, OverrideSource::Manual)
    }
}

/// Parse `on`/`off` (also `true`/`false`, `1`/`0`).
pub fn parse_switch(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(format!("expected on/off, got \"{other}\"")),
    }
}

/// Parses `<variable> <on|off> [hold_seconds]`.
impl FromStr for ManualCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let variable = parts
            .next()
            .ok_or_else(|| "empty command".to_string())?
            .parse::<ControlVariable>()?;
        let to = parse_switch(parts.next().ok_or_else(|| "missing on/off".to_string())?)?;
        let hold_time = parts
            .next()
            .map(|h| match h.parse::<f32>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
                _ => Err(format!("invalid hold time \"{h}\"")),
            })
            .transpose()?;
        if parts.next().is_some() {
            return Err("trailing arguments".into());
        }
        Ok(Self {
            variable,
            to,
            hold_time,
            origin: CommandOrigin::Operator,
        })
    }
}

impl fmt::Display for ManualCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.variable, if self.to { "on" } else { "off" })?;
        if let Some(h) = self.hold_time {
            write!(f, " {h}")?;
        }
        Ok(())
    }
}
