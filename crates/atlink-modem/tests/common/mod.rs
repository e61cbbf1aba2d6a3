//! Shared fixture for the engine integration tests.

#![allow(dead_code)]

use atlink_core::{ConnectionStatus, ModemConfig};
use atlink_hardware::TokioDelay;
use atlink_hardware::mock::{MockSerial, MockSerialHandle};
use atlink_modem::{DataReceived, Modem};
use atlink_protocol::AtCommand;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub type TestModem = Modem<MockSerial, TokioDelay>;

/// Everything a callback reported, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Sent(AtCommand),
    Data(DataReceived),
    Changed(u8, ConnectionStatus),
    Reset,
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    inner: Arc<Mutex<Vec<Recorded>>>,
}

impl Recorder {
    fn push(&self, event: Recorded) {
        self.inner.lock().unwrap().push(event);
    }

    pub fn all(&self) -> Vec<Recorded> {
        self.inner.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<AtCommand> {
        self.all()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Sent(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn data(&self) -> Vec<DataReceived> {
        self.all()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Data(data) => Some(data),
                _ => None,
            })
            .collect()
    }
}

/// A modem over a scripted serial link with its receive task running.
pub struct Harness {
    pub modem: Arc<TestModem>,
    pub serial: MockSerialHandle,
    pub events: Recorder,
    cancel: CancellationToken,
    receiver: JoinHandle<()>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ModemConfig::default())
    }

    pub fn with_config(config: ModemConfig) -> Self {
        let (serial, handle) = MockSerial::new();
        let modem = Arc::new(Modem::new(serial, TokioDelay::new(), &config).unwrap());
        let events = Recorder::default();

        let rec = events.clone();
        modem.register_command_sent(move |command| rec.push(Recorded::Sent(command)));
        let rec = events.clone();
        modem.register_data_received(move |data| rec.push(Recorded::Data(data.clone())));
        let rec = events.clone();
        modem.register_connection_changed(move |id, status| {
            rec.push(Recorded::Changed(id.as_u8(), status))
        });
        let rec = events.clone();
        modem.register_reset_detected(move || rec.push(Recorded::Reset));

        let cancel = CancellationToken::new();
        let receiver = modem.spawn_receive_task(cancel.clone());
        Self {
            modem,
            serial: handle,
            events,
            cancel,
            receiver,
        }
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.receiver.await.unwrap();
    }
}
