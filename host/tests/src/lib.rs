//! Host integration test framework
//!
//! A [`TestSession`] is a transport session whose transport records everything written to it
//! and whose upper layer records everything dispatched to it. The functions within the module
//! [`packets`] build the packets a controller would send.

pub mod packets;

use blelink_hci_interface::{
    ChannelIdentifier, Command, ConnectionHandle, Destination, DestinationTask, Event, L2capPdu, MessageId,
    SessionConfig, Transport, TransportSession, UpperLayer,
};
use std::sync::Once;

/// Error returned by a [`MockTransport`] set to fail its writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteFailed;

impl std::fmt::Display for WriteFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("write failed")
    }
}

/// A transport that records the requests made by the session
#[derive(Debug, Default)]
pub struct MockTransport {
    requested: Vec<usize>,
    written: Vec<Vec<u8>>,
    fail_writes: bool,
}

impl MockTransport {
    /// Get the lengths of every receive that was started
    pub fn get_requested(&self) -> &[usize] {
        &self.requested
    }

    pub fn get_written(&self) -> &[Vec<u8>] {
        &self.written
    }

    /// Take the packets written since the last call
    pub fn take_written(&mut self) -> Vec<Vec<u8>> {
        core::mem::take(&mut self.written)
    }

    /// Make every following write fail
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail
    }
}

impl Transport for MockTransport {
    type Error = WriteFailed;

    fn start_receive(&mut self, len: usize) {
        self.requested.push(len)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            Err(WriteFailed)
        } else {
            self.written.push(bytes.to_vec());

            Ok(())
        }
    }
}

/// A message received by a [`RecordingUpper`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Command {
        opcode: u16,
        command: Command,
    },
    Event {
        msg_id: MessageId,
        destination: DestinationTask,
        event: Event,
    },
    Frame {
        handle: ConnectionHandle,
        channel_id: ChannelIdentifier,
        destination: Destination,
        pdu: L2capPdu,
    },
}

/// An upper layer that records everything dispatched to it
#[derive(Debug, Default)]
pub struct RecordingUpper {
    received: Vec<Received>,
}

impl RecordingUpper {
    pub fn get_received(&self) -> &[Received] {
        &self.received
    }

    pub fn take_received(&mut self) -> Vec<Received> {
        core::mem::take(&mut self.received)
    }

    /// Get the events received
    pub fn events(&self) -> impl Iterator<Item = &Event> + '_ {
        self.received.iter().filter_map(|received| match received {
            Received::Event { event, .. } => Some(event),
            _ => None,
        })
    }

    /// Get the L2CAP PDUs received
    pub fn frames(&self) -> impl Iterator<Item = &L2capPdu> + '_ {
        self.received.iter().filter_map(|received| match received {
            Received::Frame { pdu, .. } => Some(pdu),
            _ => None,
        })
    }
}

impl UpperLayer for RecordingUpper {
    fn dispatch_command(&mut self, opcode: u16, command: Command) {
        self.received.push(Received::Command { opcode, command })
    }

    fn dispatch_event(&mut self, msg_id: MessageId, destination: DestinationTask, event: Event) {
        self.received.push(Received::Event {
            msg_id,
            destination,
            event,
        })
    }

    fn deliver_l2cap_frame(
        &mut self,
        handle: ConnectionHandle,
        channel_id: ChannelIdentifier,
        destination: Destination,
        pdu: L2capPdu,
    ) {
        self.received.push(Received::Frame {
            handle,
            channel_id,
            destination,
            pdu,
        })
    }
}

pub type TestSession = TransportSession<MockTransport, RecordingUpper>;

/// Initialize logging for a test
///
/// The logger is only installed once per test binary.
pub fn init_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

        // another logger may already be installed by the test harness
        let _ = TermLogger::init(
            LevelFilter::Trace,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        );
    })
}

/// Create a started session
pub fn create_session(config: SessionConfig) -> TestSession {
    init_logging();

    let mut session = TransportSession::new(MockTransport::default(), RecordingUpper::default(), config);

    session.start();

    session
}

/// Complete every write of the session
///
/// The packets are returned in the order they were written.
pub fn complete_writes(session: &mut TestSession) -> Vec<Vec<u8>> {
    let mut written = Vec::new();

    loop {
        let new = session.get_mut_transport().take_written();

        if new.is_empty() {
            break written;
        }

        written.extend(new);

        session.on_write_complete().expect("write failed");
    }
}

/// Create a connection handle
pub fn handle(raw: u16) -> ConnectionHandle {
    ConnectionHandle::try_from(raw).expect("invalid connection handle")
}
