//! Throughput of the inbound byte path.
//!
//! Every byte the radio sends goes through the framed-data matcher and,
//! outside payloads, through the lifecycle, reset and armed matchers. These
//! benchmarks measure single matchers and the whole fan-out.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench fanout_bench
//! ```

use atlink_core::ModemConfig;
use atlink_hardware::TokioDelay;
use atlink_hardware::mock::MockSerial;
use atlink_modem::Modem;
use atlink_protocol::matcher::{FramedDataPattern, LiteralPattern};
use atlink_protocol::{AtCommand, CommandQueue, Matcher, MuxMode, Operation, Pattern};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

/// `+IPD` message carrying `len` bytes of text.
fn framed_message(len: usize) -> Vec<u8> {
    let mut bytes = format!("+IPD,0,{len}:").into_bytes();
    bytes.extend((0..len).map(|i| b'a' + (i % 26) as u8));
    bytes
}

/// Typical command-response chatter with lifecycle notifications.
fn control_traffic() -> Vec<u8> {
    b"AT+CIPMUX=1\r\r\n\r\nOK\r\n0,CONNECT\r\nbusy p...\r\n\r\nOK\r\n0,CLOSED\r\n".repeat(16)
}

fn feed<P: Pattern>(matcher: &mut Matcher<P>, bytes: &[u8]) {
    for &byte in bytes {
        black_box(matcher.feed(byte));
    }
}

fn bench_literal_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("literal_matcher");
    let input = control_traffic();
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("ok_literal", |b| {
        let mut matcher = Matcher::new(LiteralPattern::new(b"\r\nOK".as_slice()));
        matcher.init();
        b.iter(|| feed(&mut matcher, black_box(&input)));
    });

    group.finish();
}

fn bench_framed_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("framed_matcher");

    for len in [16usize, 256, 2048] {
        let input = framed_message(len);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &input, |b, input| {
            let mut matcher = Matcher::new(FramedDataPattern::new(2048));
            matcher.init();
            b.iter(|| feed(&mut matcher, black_box(input)));
        });
    }

    group.finish();
}

fn bench_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("fanout");
    let (serial, _handle) = MockSerial::new();
    let modem = Modem::new(serial, TokioDelay::new(), &ModemConfig::default()).unwrap();

    let control = control_traffic();
    group.throughput(Throughput::Bytes(control.len() as u64));
    group.bench_function("control_traffic", |b| {
        b.iter(|| black_box(modem.process_inbound(black_box(&control))));
    });

    let data = framed_message(1024);
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("framed_1024", |b| {
        b.iter(|| black_box(modem.process_inbound(black_box(&data))));
    });

    group.finish();
}

fn bench_enqueue(c: &mut Criterion) {
    let mut group = c.benchmark_group("command_queue");
    group.throughput(Throughput::Elements(1));

    group.bench_function("enqueue_pop_mux", |b| {
        let mut queue = CommandQueue::new(16, 2048).unwrap();
        b.iter(|| {
            queue
                .enqueue(AtCommand::Multiplex, Operation::Set, MuxMode::Multiple.into())
                .unwrap();
            let mut cmd = queue.pop().unwrap();
            black_box(queue.line(&cmd));
            queue.discard(&mut cmd);
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_literal_matcher,
    bench_framed_matcher,
    bench_fanout,
    bench_enqueue
);
criterion_main!(benches);
