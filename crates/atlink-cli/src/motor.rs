//! Motor controller requests carried in client payloads.

use atlink_protocol::matcher::motor::CANCEL_CHARACTERIZE;
use atlink_protocol::matcher::{
    CharacterizePattern, CharacterizeRequest, DutyCyclePattern, LiteralPattern, MotorCommand,
};
use atlink_protocol::{MatchStatus, Matcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorRequest {
    DutyCycle(MotorCommand),
    Characterize(CharacterizeRequest),
    CancelCharacterize,
}

/// Scans payload bytes for motor requests. State carries across payloads,
/// so a request split over two messages is still recognised.
#[derive(Debug)]
pub struct MotorDecoder {
    duty_cycle: Matcher<DutyCyclePattern>,
    characterize: Matcher<CharacterizePattern>,
    cancel: Matcher<LiteralPattern>,
}

impl MotorDecoder {
    pub fn new() -> Self {
        let mut decoder = Self {
            duty_cycle: Matcher::new(DutyCyclePattern::new()),
            characterize: Matcher::new(CharacterizePattern::new()),
            cancel: Matcher::new(LiteralPattern::new(CANCEL_CHARACTERIZE)),
        };
        decoder.duty_cycle.init();
        decoder.characterize.init();
        decoder.cancel.init();
        decoder
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<MotorRequest> {
        let mut requests = Vec::new();
        for &byte in bytes {
            if self.duty_cycle.feed(byte) == MatchStatus::Complete {
                requests.extend(self.duty_cycle.results().map(MotorRequest::DutyCycle));
            }
            if self.characterize.feed(byte) == MatchStatus::Complete {
                requests.extend(self.characterize.results().map(MotorRequest::Characterize));
            }
            if self.cancel.feed(byte) == MatchStatus::Complete {
                requests.push(MotorRequest::CancelCharacterize);
            }
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlink_protocol::matcher::MotorDirection;

    #[test]
    fn test_decodes_each_request() {
        let mut decoder = MotorDecoder::new();
        let requests =
            decoder.feed(b"$DUTYCYCLE=2,1,40$\n$CHARACTERIZE=0,250$\n$CANCEL_CHARACTERIZE$");

        assert_eq!(
            requests,
            vec![
                MotorRequest::DutyCycle(MotorCommand {
                    motor: 2,
                    direction: MotorDirection::Backward,
                    duty_cycle: 40,
                }),
                MotorRequest::Characterize(CharacterizeRequest {
                    motor: 0,
                    period_ms: 250,
                }),
                MotorRequest::CancelCharacterize,
            ]
        );
    }

    #[test]
    fn test_request_split_across_payloads() {
        let mut decoder = MotorDecoder::new();
        assert!(decoder.feed(b"$DUTYCY").is_empty());
        assert_eq!(decoder.feed(b"CLE=0,0,100$").len(), 1);
    }

    #[test]
    fn test_out_of_range_duty_ignored() {
        let mut decoder = MotorDecoder::new();
        assert!(decoder.feed(b"$DUTYCYCLE=1,0,101$").is_empty());
    }
}
