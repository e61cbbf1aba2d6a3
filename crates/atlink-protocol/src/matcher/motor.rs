//! Application command matchers carried inside framed-data payloads.
//!
//! The motor controller receives two structured commands:
//!
//! ```text
//! $DUTYCYCLE=<motor>,<dir>,<duty>$       motor 0-9, dir 0|1, duty 0..=100
//! $CHARACTERIZE=<motor>,<period_ms>$     period 1..=65535
//! ```

use super::{LiteralCursor, MatcherKind, Pattern, Scan, Step, push_digit};
use serde::{Deserialize, Serialize};
use std::fmt;

const DUTY_CYCLE_PREFIX: &[u8] = b"$DUTYCYCLE=";
const CHARACTERIZE_PREFIX: &[u8] = b"$CHARACTERIZE=";
const FIELD_SEPARATOR: u8 = b',';
const COMMAND_TERMINATOR: u8 = b'$';

/// Literal that aborts a running characterization.
pub const CANCEL_CHARACTERIZE: &[u8] = b"$CANCEL_CHARACTERIZE$";

/// Highest duty cycle, in percent.
pub const MAX_DUTY_CYCLE: u8 = 100;

/// Rotation direction of a motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorDirection {
    #[default]
    Forward,
    Backward,
}

impl MotorDirection {
    fn from_digit(byte: u8) -> Option<Self> {
        match byte {
            b'0' => Some(MotorDirection::Forward),
            b'1' => Some(MotorDirection::Backward),
            _ => None,
        }
    }
}

impl fmt::Display for MotorDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorDirection::Forward => write!(f, "forward"),
            MotorDirection::Backward => write!(f, "backward"),
        }
    }
}

/// A complete `$DUTYCYCLE=...$` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotorCommand {
    pub motor: u8,
    pub direction: MotorDirection,
    /// Percent, `0..=100`.
    pub duty_cycle: u8,
}

/// A complete `$CHARACTERIZE=...$` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacterizeRequest {
    pub motor: u8,
    pub period_ms: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DutyState {
    Prefix,
    Motor,
    MotorSeparator,
    Direction,
    DirectionSeparator,
    /// Duty digits; the flag records whether at least one was seen.
    Duty(bool),
}

#[derive(Debug, Clone)]
pub struct DutyCyclePattern {
    state: DutyState,
    prefix: LiteralCursor,
    duty: u32,
    pending: MotorCommand,
    results: MotorCommand,
}

impl DutyCyclePattern {
    pub fn new() -> Self {
        Self {
            state: DutyState::Prefix,
            prefix: LiteralCursor::new(DUTY_CYCLE_PREFIX),
            duty: 0,
            pending: MotorCommand::default(),
            results: MotorCommand::default(),
        }
    }
}

impl Default for DutyCyclePattern {
    fn default() -> Self {
        Self::new()
    }
}

impl Pattern for DutyCyclePattern {
    type Results = MotorCommand;

    fn kind(&self) -> MatcherKind {
        MatcherKind::DutyCycle
    }

    fn reset(&mut self) {
        self.state = DutyState::Prefix;
        self.prefix.reset();
        self.duty = 0;
    }

    fn step(&mut self, byte: u8) -> Step {
        match self.state {
            DutyState::Prefix => match self.prefix.advance(byte) {
                Scan::Partial => Step::Incomplete,
                Scan::Done => {
                    self.state = DutyState::Motor;
                    Step::Incomplete
                }
                Scan::Mismatch => Step::NotMatching,
            },
            DutyState::Motor if byte.is_ascii_digit() => {
                self.pending.motor = byte - b'0';
                self.state = DutyState::MotorSeparator;
                Step::Incomplete
            }
            DutyState::MotorSeparator if byte == FIELD_SEPARATOR => {
                self.state = DutyState::Direction;
                Step::Incomplete
            }
            DutyState::Direction => match MotorDirection::from_digit(byte) {
                Some(direction) => {
                    self.pending.direction = direction;
                    self.state = DutyState::DirectionSeparator;
                    Step::Incomplete
                }
                None => Step::NotMatching,
            },
            DutyState::DirectionSeparator if byte == FIELD_SEPARATOR => {
                self.duty = 0;
                self.state = DutyState::Duty(false);
                Step::Incomplete
            }
            DutyState::Duty(true) if byte == COMMAND_TERMINATOR => {
                self.pending.duty_cycle = self.duty as u8;
                self.results = self.pending;
                Step::Complete
            }
            DutyState::Duty(_) => match push_digit(self.duty, byte, u32::from(MAX_DUTY_CYCLE)) {
                Some(duty) => {
                    self.duty = duty;
                    self.state = DutyState::Duty(true);
                    Step::Incomplete
                }
                None => Step::NotMatching,
            },
            _ => Step::NotMatching,
        }
    }

    fn results(&self) -> MotorCommand {
        self.results
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharacterizeState {
    Prefix,
    Motor,
    Separator,
    Period(bool),
}

#[derive(Debug, Clone)]
pub struct CharacterizePattern {
    state: CharacterizeState,
    prefix: LiteralCursor,
    motor: u8,
    period: u32,
    results: CharacterizeRequest,
}

impl CharacterizePattern {
    pub fn new() -> Self {
        Self {
            state: CharacterizeState::Prefix,
            prefix: LiteralCursor::new(CHARACTERIZE_PREFIX),
            motor: 0,
            period: 0,
            results: CharacterizeRequest::default(),
        }
    }
}

impl Default for CharacterizePattern {
    fn default() -> Self {
        Self::new()
    }
}

impl Pattern for CharacterizePattern {
    type Results = CharacterizeRequest;

    fn kind(&self) -> MatcherKind {
        MatcherKind::Characterize
    }

    fn reset(&mut self) {
        self.state = CharacterizeState::Prefix;
        self.prefix.reset();
        self.period = 0;
    }

    fn step(&mut self, byte: u8) -> Step {
        match self.state {
            CharacterizeState::Prefix => match self.prefix.advance(byte) {
                Scan::Partial => Step::Incomplete,
                Scan::Done => {
                    self.state = CharacterizeState::Motor;
                    Step::Incomplete
                }
                Scan::Mismatch => Step::NotMatching,
            },
            CharacterizeState::Motor if byte.is_ascii_digit() => {
                self.motor = byte - b'0';
                self.state = CharacterizeState::Separator;
                Step::Incomplete
            }
            CharacterizeState::Separator if byte == FIELD_SEPARATOR => {
                self.period = 0;
                self.state = CharacterizeState::Period(false);
                Step::Incomplete
            }
            CharacterizeState::Period(true) if byte == COMMAND_TERMINATOR => {
                if self.period == 0 {
                    return Step::NotMatching;
                }
                self.results = CharacterizeRequest {
                    motor: self.motor,
                    period_ms: self.period as u16,
                };
                Step::Complete
            }
            CharacterizeState::Period(_) => {
                match push_digit(self.period, byte, u32::from(u16::MAX)) {
                    Some(period) => {
                        self.period = period;
                        self.state = CharacterizeState::Period(true);
                        Step::Incomplete
                    }
                    None => Step::NotMatching,
                }
            }
            _ => Step::NotMatching,
        }
    }

    fn results(&self) -> CharacterizeRequest {
        self.results
    }
}
