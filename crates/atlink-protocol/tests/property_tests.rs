//! Property-based tests for the matchers and the command queue.

mod common;

use atlink_core::{ConnectionId, Error};
use atlink_protocol::matcher::{ConnectionEventPattern, FramedDataPattern, LiteralPattern};
use atlink_protocol::{
    AtCommand, CommandParams, CommandQueue, MatchStatus, Matcher, MuxMode, Operation, Pattern,
    SendData, ServerConfig,
};
use common::{feed_all, ipd_header, ready};
use proptest::prelude::*;

/// Bytes drawn from the alphabet of the inbound framing, so matches actually happen.
fn stream_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop::sample::select(b"+IPD,0123459:xyCONECTLSFAI \r\n".to_vec()),
        0..300,
    )
}

/// After every terminal status, the rest of the stream must behave exactly as
/// it would on a freshly initialized matcher.
fn assert_reset_on_terminal<P, F>(make: F, input: &[u8])
where
    P: Pattern,
    F: Fn() -> P,
{
    let mut matcher = ready(make());
    let statuses = feed_all(&mut matcher, input);

    for (i, status) in statuses.iter().enumerate() {
        if status.is_terminal() {
            let mut fresh = ready(make());
            let rest = feed_all(&mut fresh, &input[i + 1..]);
            assert_eq!(&statuses[i + 1..], rest.as_slice(), "diverged after byte {i}");
        }
    }
}

/// Strategy for a valid enqueue that stages parameter bytes.
fn staged_command() -> impl Strategy<Value = (AtCommand, CommandParams)> {
    prop_oneof![
        Just((AtCommand::Multiplex, CommandParams::Mux(MuxMode::Multiple))),
        any::<u16>().prop_map(|port| (AtCommand::Server, CommandParams::Server(ServerConfig::create(port)))),
        (0u8..5, 1usize..64).prop_map(|(id, len)| {
            let data = SendData::new(ConnectionId::new(id).unwrap(), vec![b'x'; len]);
            (AtCommand::Send, CommandParams::Send(data))
        }),
    ]
}

proptest! {
    /// Property: terminal statuses restart the literal matcher.
    #[test]
    fn prop_literal_reset_on_terminal(input in stream_bytes()) {
        assert_reset_on_terminal(|| LiteralPattern::new(b"0,CONNECT".to_vec()), &input);
    }

    /// Property: terminal statuses restart the framed-data matcher.
    #[test]
    fn prop_framed_reset_on_terminal(input in stream_bytes(), capacity in 0usize..16) {
        assert_reset_on_terminal(|| FramedDataPattern::new(capacity), &input);
    }

    /// Property: terminal statuses restart the lifecycle matchers.
    #[test]
    fn prop_connection_reset_on_terminal(input in stream_bytes()) {
        assert_reset_on_terminal(ConnectionEventPattern::open, &input);
        assert_reset_on_terminal(ConnectionEventPattern::failed, &input);
    }

    /// Property: the framed-data matcher completes after exactly the declared
    /// number of payload bytes, whatever the capture capacity.
    #[test]
    fn prop_framed_length_fidelity(
        id in 0u8..5,
        payload in prop::collection::vec(any::<u8>(), 1..=9999),
        capacity in prop_oneof![0usize..32, 0usize..12000],
    ) {
        let mut matcher = ready(FramedDataPattern::new(capacity));
        let header = ipd_header(id, payload.len());

        for status in feed_all(&mut matcher, &header) {
            prop_assert_eq!(status, MatchStatus::Incomplete);
        }

        let statuses = feed_all(&mut matcher, &payload);
        let (last, body) = statuses.split_last().unwrap();
        prop_assert!(body.iter().all(|s| *s == MatchStatus::Incomplete));
        prop_assert_eq!(*last, MatchStatus::Complete);

        let data = matcher.results().unwrap();
        prop_assert_eq!(data.connection_id.as_u8(), id);
        prop_assert_eq!(data.payload_length, payload.len());
        let stored = payload.len().min(capacity);
        prop_assert_eq!(matcher.pattern().captured(), &payload[..stored]);
    }

    /// Property: a failed enqueue leaves the ring exactly as it found it.
    #[test]
    fn prop_failed_enqueue_restores_free_space(
        prefill in prop::collection::vec(staged_command(), 0..6),
        payload_len in 1usize..200,
    ) {
        let mut queue = CommandQueue::new(8, 128).unwrap();
        for (command, params) in prefill {
            // prefill may itself run out of space
            let _ = queue.enqueue(command, Operation::Set, params);
        }

        let before = queue.ring().free();
        let queued = queue.len();
        let data = SendData::new(ConnectionId::new(1).unwrap(), vec![b'p'; payload_len]);

        match queue.enqueue(AtCommand::Send, Operation::Set, data.into()) {
            Ok(()) => {
                let params_len = format!("1,{payload_len}").len();
                prop_assert_eq!(queue.ring().free(), before - params_len - payload_len);
                prop_assert_eq!(queue.len(), queued + 1);
            }
            Err(Error::BufferFull { .. }) | Err(Error::QueueFull { .. }) => {
                prop_assert_eq!(queue.ring().free(), before);
                prop_assert_eq!(queue.len(), queued);
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// Property: validation failures never touch the ring.
    #[test]
    fn prop_invalid_params_leave_ring_untouched(channel in 15u8.., ssid_len in 33usize..64) {
        let mut queue = CommandQueue::new(4, 256).unwrap();
        queue.enqueue(AtCommand::Multiplex, Operation::Set, MuxMode::Single.into()).unwrap();
        let before = queue.ring().free();

        let params = CommandParams::SoftAp(atlink_protocol::SoftApConfig {
            ssid: "x".repeat(ssid_len),
            password: "password".into(),
            channel,
            encryption: atlink_protocol::Encryption::Wpa2Psk,
        });
        let result = queue.enqueue(AtCommand::SoftApCurrent, Operation::Set, params);

        prop_assert!(matches!(result, Err(Error::InvalidParameter(_))));
        prop_assert_eq!(queue.ring().free(), before);
        prop_assert_eq!(queue.len(), 1);
    }
}

#[test]
fn test_reset_on_terminal_sample_stream() {
    let input = b"+IPD,1,2:ok0,CONNECT\r\n+IPD,9,1:x";
    assert_reset_on_terminal(|| FramedDataPattern::new(4), input);

    let mut matcher: Matcher<FramedDataPattern> = ready(FramedDataPattern::new(4));
    assert!(feed_all(&mut matcher, input).contains(&MatchStatus::Complete));
}
