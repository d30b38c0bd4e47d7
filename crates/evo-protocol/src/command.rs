//! Command construction for the SAM command language
//!
//! # Format
//! - Reads: `S<system>[Z<zone>]<VERB>?`, e.g. `S1Z1RT?`
//! - Writes: `S<system>[Z<zone>]<VERB>!<value>`, e.g. `S1Z1CLSP!72`
//!
//! Write commands are distinguished from reads solely by the presence of
//! `!`. `MODE` commands carry no zone segment.

use std::fmt;

/// Parameter verbs understood by the SAM module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verb {
    /// Current room temperature (read-only): RT
    CurrentTemp,
    /// Cooling setpoint: CLSP
    CoolSetpoint,
    /// Heating setpoint: HTSP
    HeatSetpoint,
    /// System operating mode, system-wide: MODE
    Mode,
    /// Fan mode: FAN
    Fan,
    /// Zone display name (read-only): NAME
    Name,
}

impl Verb {
    /// Returns the wire token for this verb
    pub fn token(&self) -> &'static str {
        match self {
            Verb::CurrentTemp => "RT",
            Verb::CoolSetpoint => "CLSP",
            Verb::HeatSetpoint => "HTSP",
            Verb::Mode => "MODE",
            Verb::Fan => "FAN",
            Verb::Name => "NAME",
        }
    }
}

/// A single command addressed to the device
///
/// Immutable once built. The multiplexer classifies commands with
/// [`Command::is_write`] and validates replies with
/// [`Command::accepts_reply`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command(String);

impl Command {
    /// Build a read command, e.g. `S1Z1RT?`
    pub fn query(system_id: u8, zone_id: Option<u8>, verb: Verb) -> Self {
        Self(format!(
            "{}{}?",
            Self::address(system_id, zone_id),
            verb.token()
        ))
    }

    /// Build a write command, e.g. `S1Z1CLSP!72`
    pub fn set(system_id: u8, zone_id: Option<u8>, verb: Verb, value: impl fmt::Display) -> Self {
        Self(format!(
            "{}{}!{}",
            Self::address(system_id, zone_id),
            verb.token(),
            value
        ))
    }

    /// Wrap an already-formed command string verbatim
    pub fn raw(command: impl Into<String>) -> Self {
        Self(command.into())
    }

    fn address(system_id: u8, zone_id: Option<u8>) -> String {
        match zone_id {
            Some(zone_id) => format!("S{}Z{}", system_id, zone_id),
            None => format!("S{}", system_id),
        }
    }

    /// Whether this command changes device state
    pub fn is_write(&self) -> bool {
        self.0.contains('!')
    }

    /// The text before the read/write marker
    ///
    /// A well-formed reply to this command echoes exactly this prefix.
    pub fn prefix(&self) -> &str {
        match self.0.find(|c| c == '?' || c == '!') {
            Some(marker) => &self.0[..marker],
            None => &self.0,
        }
    }

    /// Whether `line` is an acceptable reply to this command
    ///
    /// A reply is accepted when it echoes the command prefix and the device
    /// did not reject the command with `NAK`.
    pub fn accepts_reply(&self, line: &str) -> bool {
        line.starts_with(self.prefix()) && !line.contains(crate::NAK)
    }

    /// The command text as sent on the wire (without line terminator)
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
