//! Versioned on-disk encoding of [`ControlState`].
//!
//! The record is a postcard envelope `{version, fingerprint, state}`.  The
//! fingerprint hashes the state layout together with the profile name and is
//! also part of the storage key, so states written by another profile or an
//! older layout are never read back as this one.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::ControlState;

/// Bumped whenever the envelope or [`ControlState`] layout changes.
pub const STATE_SCHEMA_VERSION: u16 = 1;

/// Textual description of the persisted layout, hashed into every fingerprint.
const STATE_LAYOUT: &str = "ControlState{variables:map<ControlVariable,\
    VariableState{value:bool,hold_time_counter:f32,ignore_time_counter:f32}>,\
    inputs:map<SensorInput,f32>}";

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// 64-bit FNV-1a of `s`.
pub const fn fingerprint(s: &str) -> u64 {
    fnv1a(FNV_OFFSET, s.as_bytes())
}

/// Fingerprint of the state layout as used by the named profile.
pub const fn state_fingerprint(profile: &str) -> u64 {
    let h = fnv1a(FNV_OFFSET, STATE_LAYOUT.as_bytes());
    fnv1a(h, profile.as_bytes())
}

/// Storage key of the state slot for a fingerprint.
pub fn state_key(fingerprint: u64) -> String {
    format!(".control_state-{fingerprint:016x}")
}

#[derive(Serialize, Deserialize)]
struct PersistedState {
    version: u16,
    fingerprint: u64,
    state: ControlState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaError {
    /// The bytes are not a valid envelope.
    Malformed,
    /// Written with another schema version.
    VersionMismatch { found: u16 },
    /// Written for another layout or profile.
    FingerprintMismatch { found: u64 },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed state record"),
            Self::VersionMismatch { found } => write!(
                f,
                "schema version {} (expected {})",
                found, STATE_SCHEMA_VERSION
            ),
            Self::FingerprintMismatch { found } => {
                write!(f, "schema fingerprint {:016x} does not match", found)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

pub fn encode(state: &ControlState, fingerprint: u64) -> Result<Vec<u8>, postcard::Error> {
    postcard::to_allocvec(&PersistedState {
        version: STATE_SCHEMA_VERSION,
        fingerprint,
        state: state.clone(),
    })
}

/// Decode a record, rejecting anything not written by this exact schema.
pub fn decode(bytes: &[u8], fingerprint: u64) -> Result<ControlState, SchemaError> {
    // The version leads the envelope; check it before trusting the rest.
    let (version, _) =
        postcard::take_from_bytes::<u16>(bytes).map_err(|_| SchemaError::Malformed)?;
    if version != STATE_SCHEMA_VERSION {
        return Err(SchemaError::VersionMismatch { found: version });
    }

    let record: PersistedState = postcard::from_bytes(bytes).map_err(|_| SchemaError::Malformed)?;
    if record.fingerprint != fingerprint {
        return Err(SchemaError::FingerprintMismatch {
            found: record.fingerprint,
        });
    }
    Ok(record.state)
}
