use crate::config::SessionConfig;
use crate::error::{ConnectionError, FramingError, SendError};
use crate::{Transport, UpperLayer};
use alloc::collections::{BTreeSet, VecDeque};
use alloc::vec::Vec;
use blelink_hci_host::codec::{self, CodecError, CommandHeader, EventHeader};
use blelink_hci_host::l2cap::fragment_frame;
use blelink_hci_host::registry::EventEntry;
use blelink_hci_host::{AclHeader, Command, Event};
use blelink_hci_util::ConnectionHandle;
use blelink_l2cap::pdu::{FragmentationError, L2capPdu, PduError};
use blelink_l2cap::reassembly::{ReassemblyStats, Reassembler};
use blelink_l2cap::router::ChannelRouter;

/// The largest header of a supported packet (a Command Status event)
pub(crate) const MAX_HEADER_SIZE: usize = 6;

/// The state of the receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxState {
    /// Waiting for the packet indicator
    WaitType,
    WaitHeader,
    WaitPayload,
    /// A complete packet is being delivered
    Dispatch,
    /// The rest of a packet is being discarded
    Trash,
}

/// The state of the transmitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Idle,
    /// A write was started and has not completed
    Ongoing,
}

/// Counters of a session
///
/// Every protocol violation is counted in one of these.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub commands_dispatched: usize,
    pub events_dispatched: usize,
    pub frames_delivered: usize,
    pub unknown_packet_indicator: usize,
    pub unknown_opcode: usize,
    pub unknown_message_id: usize,
    pub unknown_connection: usize,
    pub length_mismatch: usize,
    pub invalid_packet: usize,
    pub frame_overrun: usize,
    pub trash_overflow: usize,
    /// The number of writes the transport failed
    pub write_failures: usize,
    pub pdu_rejected: usize,
    pub pdu_dropped: usize,
    /// The counters of the L2CAP reassembly
    pub reassembly: ReassemblyStats,
}

/// The header of the packet that is being received
#[derive(Debug, Clone, Copy)]
pub(crate) enum ReceivedHeader {
    Command(CommandHeader),
    Event(EventHeader, &'static EventEntry),
    Acl(AclHeader),
}

/// A packed packet waiting to be written
#[derive(Debug)]
pub(crate) enum TxPacket {
    Command(Vec<u8>),
    Event(Vec<u8>),
    Acl { handle: ConnectionHandle, packet: Vec<u8> },
}

impl TxPacket {
    fn as_bytes(&self) -> &[u8] {
        match self {
            TxPacket::Command(packet) | TxPacket::Event(packet) | TxPacket::Acl { packet, .. } => packet,
        }
    }
}

/// A session over a HCI transport
///
/// This is the framer and dispatcher of the HCI. See the [crate level](crate) documentation for
/// the details.
///
/// ```
/// # use blelink_hci_interface::*;
/// # struct Uart(Vec<Vec<u8>>);
/// # impl Transport for Uart {
/// #     type Error = ();
/// #     fn start_receive(&mut self, _: usize) {}
/// #     fn write(&mut self, bytes: &[u8]) -> Result<(), ()> { self.0.push(bytes.to_vec()); Ok(()) }
/// # }
/// # struct Host;
/// # impl UpperLayer for Host {
/// #     fn dispatch_command(&mut self, _: u16, _: Command) {}
/// #     fn dispatch_event(&mut self, _: MessageId, _: DestinationTask, _: Event) {}
/// #     fn deliver_l2cap_frame(&mut self, _: ConnectionHandle, _: ChannelIdentifier, _: Destination, _: L2capPdu) {}
/// # }
/// let mut session = TransportSession::new(Uart(Vec::new()), Host, SessionConfig::default());
///
/// session.start();
///
/// session.send_command(&Command::Reset).unwrap();
///
/// assert_eq!(session.get_transport().0[0], [0x01, 0x03, 0x0C, 0x00]);
///
/// // The credit of one command was used by the reset command
/// assert_eq!(session.get_command_credit(), 0);
/// ```
pub struct TransportSession<T, U> {
    pub(crate) transport: T,
    pub(crate) upper: U,
    pub(crate) config: SessionConfig,
    pub(crate) rx_state: RxState,
    pub(crate) tx_state: TxState,
    pub(crate) packet_type: Option<blelink_hci_util::HciPacketType>,
    pub(crate) header: Vec<u8>,
    pub(crate) last_header: Option<ReceivedHeader>,
    pub(crate) payload: Vec<u8>,
    pub(crate) rx_pending: usize,
    pub(crate) tx_queue: VecDeque<TxPacket>,
    pub(crate) command_credit: u8,
    pub(crate) acl_credit: Option<u16>,
    pub(crate) controller_acl_len: Option<usize>,
    pub(crate) reassembler: Reassembler<ConnectionHandle>,
    pub(crate) router: ChannelRouter,
    pub(crate) connections: BTreeSet<ConnectionHandle>,
    pub(crate) stats: SessionStats,
    pub(crate) last_error: Option<FramingError>,
}

impl<T, U> TransportSession<T, U>
where
    T: Transport,
    U: UpperLayer,
{
    /// Create a new `TransportSession`
    ///
    /// Nothing is received until the method [`start`](TransportSession::start) is called.
    pub fn new(transport: T, upper: U, config: SessionConfig) -> Self {
        TransportSession {
            transport,
            upper,
            config,
            rx_state: RxState::WaitType,
            tx_state: TxState::Idle,
            packet_type: None,
            header: Vec::with_capacity(MAX_HEADER_SIZE),
            last_header: None,
            payload: Vec::new(),
            rx_pending: 0,
            tx_queue: VecDeque::new(),
            command_credit: config.initial_command_credit,
            acl_credit: None,
            controller_acl_len: None,
            reassembler: Reassembler::new(),
            router: ChannelRouter::new(),
            connections: BTreeSet::new(),
            stats: SessionStats::default(),
            last_error: None,
        }
    }

    /// Send a command to the controller
    ///
    /// # Error
    /// Nothing is queued if the command cannot be packed, such as when its data is longer than the
    /// command allows.
    pub fn send_command(&mut self, command: &Command) -> Result<(), SendError<T::Error>> {
        let packet = codec::pack_command(command)?;

        log::debug!("(HCI) queueing {} command", command.get_kind());

        self.tx_queue.push_back(TxPacket::Command(packet));

        self.transmit().map_err(SendError::Transport)
    }

    /// Send an event
    ///
    /// This is for when the session is the controller side of the interface.
    pub fn send_event(&mut self, event: &Event) -> Result<(), SendError<T::Error>> {
        let packet = codec::pack_event(event)?;

        log::debug!("(HCI) queueing event {}", event.get_message_id());

        self.tx_queue.push_back(TxPacket::Event(packet));

        self.transmit().map_err(SendError::Transport)
    }

    /// Send a L2CAP PDU over the connection `handle`
    ///
    /// The PDU is fragmented into as many HCI ACL data packets as necessary.
    pub fn send_l2cap(&mut self, handle: ConnectionHandle, pdu: &L2capPdu) -> Result<(), SendError<T::Error>> {
        if !self.connections.contains(&handle) {
            return Err(SendError::UnknownConnection(handle));
        }

        self.queue_l2cap(handle, pdu)?;

        self.transmit().map_err(SendError::Transport)
    }

    pub(crate) fn queue_l2cap(&mut self, handle: ConnectionHandle, pdu: &L2capPdu) -> Result<(), FragmentationError> {
        let frame = pdu.into_frame();

        let max_payload = self.get_max_acl_payload();

        let packets = fragment_frame(handle, &frame, max_payload, self.config.flush_l2cap)?;

        log::debug!(
            "(HCI) queueing {} for connection {} as {} ACL packet(s)",
            pdu,
            handle,
            packets.len()
        );

        self.tx_queue.extend(packets.iter().map(|packet| TxPacket::Acl {
            handle,
            packet: packet.to_uart_packet(),
        }));

        Ok(())
    }

    /// Write the packet at the front of the queue if the transmitter is idle and there is credit
    /// for it
    ///
    /// A packet that fails to be written is put back at the front of the queue with its credit
    /// returned. It is written again by the next call to this method.
    pub(crate) fn transmit(&mut self) -> Result<(), T::Error> {
        if let TxState::Ongoing = self.tx_state {
            return Ok(());
        }

        match self.tx_queue.front() {
            None => return Ok(()),
            Some(TxPacket::Command(_)) if self.command_credit == 0 => {
                log::trace!("(HCI) waiting for command credit");

                return Ok(());
            }
            Some(TxPacket::Acl { .. }) if self.acl_credit == Some(0) => {
                log::trace!("(HCI) waiting for ACL data credit");

                return Ok(());
            }
            Some(_) => (),
        }

        let packet = match self.tx_queue.pop_front() {
            Some(packet) => packet,
            None => return Ok(()),
        };

        self.take_credit(&packet);

        self.tx_state = TxState::Ongoing;

        log::trace!("(HCI) writing {:x?}", packet.as_bytes());

        match self.transport.write(packet.as_bytes()) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::error!("(HCI) failed to write packet, it stays queued");

                self.stats.write_failures += 1;

                self.tx_state = TxState::Idle;

                self.return_credit(&packet);

                self.tx_queue.push_front(packet);

                Err(e)
            }
        }
    }

    fn take_credit(&mut self, packet: &TxPacket) {
        match packet {
            TxPacket::Command(_) => self.command_credit = self.command_credit.saturating_sub(1),
            TxPacket::Acl { .. } => {
                if let Some(credit) = self.acl_credit.as_mut() {
                    *credit = credit.saturating_sub(1)
                }
            }
            TxPacket::Event(_) => (),
        }
    }

    fn return_credit(&mut self, packet: &TxPacket) {
        match packet {
            TxPacket::Command(_) => self.command_credit = self.command_credit.saturating_add(1),
            TxPacket::Acl { .. } => {
                if let Some(credit) = self.acl_credit.as_mut() {
                    *credit = credit.saturating_add(1)
                }
            }
            TxPacket::Event(_) => (),
        }
    }

    /// Report the completion of the last write
    ///
    /// The next packet is written if there is credit for it.
    pub fn on_write_complete(&mut self) -> Result<(), T::Error> {
        self.tx_state = TxState::Idle;

        self.transmit()
    }

    /// Open a connection
    ///
    /// ACL data is only accepted for open connections. Connections are opened automatically by a
    /// successful *LE Connection Complete* event.
    pub fn open_connection(&mut self, handle: ConnectionHandle) -> Result<(), ConnectionError> {
        if self.connections.contains(&handle) {
            Err(ConnectionError::AlreadyOpen(handle))
        } else if self.connections.len() >= self.config.max_connections {
            Err(ConnectionError::TooManyConnections)
        } else {
            log::debug!("(HCI) opened connection {}", handle);

            self.connections.insert(handle);

            Ok(())
        }
    }

    /// Close a connection
    ///
    /// The partially recombined frame and the queued ACL data of the connection are discarded.
    /// Connections are closed automatically by a successful *Disconnection Complete* event.
    ///
    /// `true` is returned if the connection was open.
    pub fn close_connection(&mut self, handle: ConnectionHandle) -> bool {
        if self.reassembler.remove(handle) {
            log::debug!("(HCI) discarded partial L2CAP frame of connection {}", handle);
        }

        self.tx_queue
            .retain(|packet| !matches!(packet, TxPacket::Acl { handle: h, .. } if *h == handle));

        let was_open = self.connections.remove(&handle);

        if was_open {
            log::debug!("(HCI) closed connection {}", handle);
        }

        was_open
    }

    /// Reset the session
    ///
    /// The transmit queue is flushed, every partially recombined frame is discarded, and the
    /// receiver waits for the next packet indicator. Open connections stay open.
    ///
    /// The state shared with the controller is kept. This is the command credit, the ACL data
    /// credit and buffer length reported by the controller, and a write that has not completed
    /// (the transmitter stays [`Ongoing`](TxState::Ongoing) until
    /// [`on_write_complete`](TransportSession::on_write_complete) is called).
    pub fn reset(&mut self) {
        log::debug!("(HCI) resetting session");

        self.tx_queue.clear();

        self.reassembler.clear();

        self.last_header = None;

        self.set_wait_type();
    }

    /// Log and count a protocol violation
    pub(crate) fn record(&mut self, error: FramingError) {
        match error {
            FramingError::UnknownPacketIndicator(_) => self.stats.unknown_packet_indicator += 1,
            FramingError::UnknownOpcode(_) => self.stats.unknown_opcode += 1,
            FramingError::UnknownMessageId(_) => self.stats.unknown_message_id += 1,
            FramingError::UnknownConnection(_) => self.stats.unknown_connection += 1,
            FramingError::Codec(CodecError::LengthMismatch { .. }) => self.stats.length_mismatch += 1,
            FramingError::Codec(_) | FramingError::InvalidAclHeader(_) => self.stats.invalid_packet += 1,
            FramingError::FrameOverrun => self.stats.frame_overrun += 1,
            FramingError::Reassembly(_) => (),
            FramingError::Pdu(PduError::InvalidCid(_) | PduError::UnknownPduCode { .. }) => {
                self.stats.pdu_rejected += 1
            }
            FramingError::Pdu(_) => self.stats.pdu_dropped += 1,
            FramingError::TrashOverflow(_) => self.stats.trash_overflow += 1,
        }

        match error {
            FramingError::TrashOverflow(_) => log::error!("(HCI) {}", error),
            _ => log::warn!("(HCI) {}", error),
        }

        self.last_error = Some(error);
    }

    /// Get the maximum payload of a sent ACL data packet
    ///
    /// This is the configured maximum unless the controller reported a smaller buffer.
    pub fn get_max_acl_payload(&self) -> usize {
        match self.controller_acl_len {
            Some(len) => core::cmp::min(len, self.config.max_acl_payload),
            None => self.config.max_acl_payload,
        }
    }

    pub fn get_rx_state(&self) -> RxState {
        self.rx_state
    }

    pub fn get_tx_state(&self) -> TxState {
        self.tx_state
    }

    /// Get the number of commands that can be sent to the controller
    pub fn get_command_credit(&self) -> u8 {
        self.command_credit
    }

    /// Get the number of ACL data packets that can be sent to the controller
    ///
    /// This is `None` until the controller reports its buffer count.
    pub fn get_acl_credit(&self) -> Option<u16> {
        self.acl_credit
    }

    /// Get the number of packets waiting to be written
    pub fn get_queued(&self) -> usize {
        self.tx_queue.len()
    }

    /// Get the number of bytes the receiver is waiting for
    pub fn get_requested_len(&self) -> usize {
        self.rx_pending
    }

    pub fn is_connection_open(&self, handle: ConnectionHandle) -> bool {
        self.connections.contains(&handle)
    }

    pub fn get_open_connections(&self) -> impl Iterator<Item = ConnectionHandle> + '_ {
        self.connections.iter().copied()
    }

    /// Check if a L2CAP frame is being recombined for the connection `handle`
    pub fn is_reassembling(&self, handle: ConnectionHandle) -> bool {
        self.reassembler.is_in_progress(handle)
    }

    pub fn get_stats(&self) -> SessionStats {
        SessionStats {
            reassembly: self.reassembler.stats(),
            ..self.stats
        }
    }

    /// Get the last protocol violation
    pub fn get_last_error(&self) -> Option<FramingError> {
        self.last_error
    }

    pub fn get_config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn get_transport(&self) -> &T {
        &self.transport
    }

    pub fn get_mut_transport(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn get_upper(&self) -> &U {
        &self.upper
    }

    pub fn get_mut_upper(&mut self) -> &mut U {
        &mut self.upper
    }

    pub fn into_parts(self) -> (T, U) {
        (self.transport, self.upper)
    }
}
