//! The receiver of a transport session

use crate::error::FramingError;
use crate::session::{ReceivedHeader, RxState, TransportSession};
use crate::{Transport, UpperLayer};
use alloc::vec::Vec;
use blelink_core::Error;
use blelink_hci_host::codec::{self, CodecError, CommandHeader, EventHeader};
use blelink_hci_host::commands::CommandKind;
use blelink_hci_host::events::{Event, ReturnParameters};
use blelink_hci_host::registry::is_known_event_code;
use blelink_hci_host::AclHeader;
use blelink_hci_util::events::{MessageId, EVENT_HEADER_SIZE};
use blelink_hci_util::{ConnectionHandle, HciPacketType, ParameterLength};
use blelink_l2cap::pdu::BasicFrame;
use blelink_l2cap::router::RouteOutcome;
use blelink_l2cap::L2capFragment;

impl<T, U> TransportSession<T, U>
where
    T: Transport,
    U: UpperLayer,
{
    /// Start receiving
    ///
    /// This requests the packet indicator of the first packet from the transport.
    pub fn start(&mut self) {
        self.set_wait_type();
    }

    /// Process bytes received by the transport
    ///
    /// This is called by the driver of the transport with the bytes requested by the last call
    /// to [`Transport::start_receive`]. Fewer bytes than requested can be given, in which case the
    /// rest of them are requested again. Giving more bytes than were requested is a protocol
    /// violation, the bytes are discarded and the receiver waits for the next packet indicator.
    ///
    /// # Error
    /// Receiving can release packets waiting to be written, an error is returned if the transport
    /// fails to write one of them. The bytes are processed before the write is attempted and the
    /// packet that failed to be written stays at the front of the queue.
    pub fn on_received(&mut self, bytes: &[u8]) -> Result<(), T::Error> {
        self.receive(bytes);

        self.transmit()
    }

    fn receive(&mut self, bytes: &[u8]) {
        log::trace!("(HCI) received {:x?}", bytes);

        if bytes.is_empty() {
            return;
        }

        if bytes.len() > self.rx_pending {
            self.record(FramingError::FrameOverrun);

            return self.set_wait_type();
        }

        self.rx_pending -= bytes.len();

        match self.rx_state {
            RxState::WaitHeader => self.header.extend_from_slice(bytes),
            RxState::WaitPayload => self.payload.extend_from_slice(bytes),
            _ => (),
        }

        if self.rx_pending != 0 {
            return self.transport.start_receive(self.rx_pending);
        }

        match self.rx_state {
            RxState::WaitType => self.receive_indicator(bytes[0]),
            RxState::WaitHeader => self.receive_header(),
            RxState::WaitPayload => self.dispatch(),
            RxState::Trash => {
                log::debug!("(HCI) discarded packet");

                self.set_wait_type()
            }
            RxState::Dispatch => self.set_wait_type(),
        }
    }

    /// Process a chunk of the received byte stream
    ///
    /// This is for transports that do not deliver exactly the number of bytes requested. The
    /// chunk is split into the reads the receiver asks for.
    ///
    /// # Error
    /// Every byte of the chunk is processed even when the transport fails a write. After the
    /// first failure no more writes are tried for the rest of the chunk, the failed packet stays
    /// at the front of the queue and the error is returned once the chunk is consumed.
    pub fn feed(&mut self, mut bytes: &[u8]) -> Result<(), T::Error> {
        if self.rx_pending == 0 {
            self.set_wait_type();
        }

        let mut result = Ok(());

        while !bytes.is_empty() {
            let (read, rest) = bytes.split_at(core::cmp::min(self.rx_pending, bytes.len()));

            self.receive(read);

            if result.is_ok() {
                result = self.transmit();
            }

            bytes = rest;
        }

        result
    }

    fn request(&mut self, len: usize) {
        self.rx_pending = len;

        self.transport.start_receive(len);
    }

    pub(crate) fn set_wait_type(&mut self) {
        self.rx_state = RxState::WaitType;

        self.packet_type = None;

        self.header.clear();

        self.payload = Vec::new();

        self.request(1);
    }

    fn receive_indicator(&mut self, indicator: u8) {
        match HciPacketType::try_from_indicator(indicator) {
            Ok(packet_type @ (HciPacketType::Command | HciPacketType::Acl | HciPacketType::Event)) => {
                self.packet_type = Some(packet_type);

                self.rx_state = RxState::WaitHeader;

                self.request(packet_type.header_size());
            }
            _ => {
                self.record(FramingError::UnknownPacketIndicator(indicator));

                self.request(1);
            }
        }
    }

    fn receive_header(&mut self) {
        match self.packet_type {
            Some(HciPacketType::Command) => self.receive_command_header(),
            Some(HciPacketType::Event) => self.receive_event_header(),
            Some(HciPacketType::Acl) => self.receive_acl_header(),
            _ => self.set_wait_type(),
        }
    }

    fn receive_command_header(&mut self) {
        let header = match CommandHeader::try_from_bytes(&self.header) {
            Ok(header) => header,
            Err(e) => {
                self.record(e.into());

                return self.set_wait_type();
            }
        };

        match codec::check_command_header(&header) {
            Ok(_) => {
                self.last_header = Some(ReceivedHeader::Command(header));

                self.receive_payload(header.param_len.into())
            }
            Err(e) => {
                self.record(e.into());

                self.trash(header.param_len.into())
            }
        }
    }

    /// The header of an event is received in two steps. First the event code and parameter
    /// length, and then the routing fields if the event has them.
    fn receive_event_header(&mut self) {
        let fields = match *self.header {
            [code, param_len, ..] => Some((code, usize::from(param_len))),
            _ => None,
        };

        let (code, param_len) = match fields {
            Some(fields) => fields,
            None => return self.set_wait_type(),
        };

        let extension_len = EventHeader::header_len(code) - EVENT_HEADER_SIZE;

        if self.header.len() == EVENT_HEADER_SIZE {
            if !is_known_event_code(code) {
                self.record(FramingError::UnknownMessageId(MessageId::Event(code)));

                return self.trash(param_len);
            }

            if param_len < extension_len {
                self.record(FramingError::Codec(CodecError::LengthMismatch {
                    expected: ParameterLength::Variable {
                        min: extension_len as u8,
                        max: u8::MAX,
                    },
                    actual: param_len,
                }));

                return self.trash(param_len);
            }

            if extension_len != 0 {
                return self.request(extension_len);
            }
        }

        let header = match EventHeader::try_from_bytes(&self.header) {
            Ok(header) => header,
            Err(e) => {
                self.record(e.into());

                return self.trash(param_len.saturating_sub(extension_len));
            }
        };

        if let Some(credit) = header.get_command_credit() {
            log::debug!("(HCI) command credit is {}", credit);

            self.command_credit = credit;
        }

        match codec::check_event_header(&header) {
            Ok(entry) => {
                self.last_header = Some(ReceivedHeader::Event(header, entry));

                self.receive_payload(header.get_remaining_len())
            }
            Err(e) => {
                self.record(e.into());

                self.trash(header.get_remaining_len())
            }
        }
    }

    fn receive_acl_header(&mut self) {
        let header = match AclHeader::try_from_bytes(&self.header) {
            Ok(header) => header,
            Err(e) => {
                let data_len = match *self.header {
                    [_, _, l0, l1, ..] => <u16>::from_le_bytes([l0, l1]).into(),
                    _ => 0,
                };

                self.record(e.into());

                return self.skip(data_len);
            }
        };

        if !self.connections.contains(&header.connection_handle) {
            self.record(FramingError::UnknownConnection(header.connection_handle));

            return self.skip(header.data_len.into());
        }

        self.last_header = Some(ReceivedHeader::Acl(header));

        self.receive_payload(header.data_len.into())
    }

    fn receive_payload(&mut self, len: usize) {
        if len == 0 {
            self.dispatch()
        } else {
            self.payload = Vec::with_capacity(len);

            self.rx_state = RxState::WaitPayload;

            self.request(len)
        }
    }

    /// Discard the next `len` bytes
    ///
    /// The session is reset if `len` is larger than the trash capacity.
    fn trash(&mut self, len: usize) {
        if len == 0 {
            self.set_wait_type()
        } else if len > self.config.trash_capacity {
            self.record(FramingError::TrashOverflow(len));

            self.reset()
        } else {
            log::debug!("(HCI) discarding {} bytes", len);

            self.rx_state = RxState::Trash;

            self.request(len)
        }
    }

    /// Discard the next `len` bytes of ACL data
    ///
    /// The length of ACL data is always known from its header, so skipping it does not lose
    /// synchronization however large it is.
    fn skip(&mut self, len: usize) {
        if len == 0 {
            self.set_wait_type()
        } else {
            log::debug!("(HCI) skipping {} bytes of ACL data", len);

            self.rx_state = RxState::Trash;

            self.request(len)
        }
    }

    fn dispatch(&mut self) {
        self.rx_state = RxState::Dispatch;

        let payload = core::mem::take(&mut self.payload);

        match self.last_header.take() {
            Some(ReceivedHeader::Command(header)) => match codec::unpack_command(header.opcode, &payload) {
                Ok(command) => {
                    log::debug!("(HCI) received {} command", command.get_kind());

                    self.stats.commands_dispatched += 1;

                    self.upper.dispatch_command(header.opcode, command)
                }
                Err(e) => self.record(e.into()),
            },
            Some(ReceivedHeader::Event(header, entry)) => match codec::unpack_event(&header, &payload) {
                Ok(event) => {
                    log::debug!("(HCI) received event {} for {}", entry.msg_id, entry.dest);

                    self.track_event(&event);

                    self.stats.events_dispatched += 1;

                    self.upper.dispatch_event(entry.msg_id, entry.dest, event)
                }
                Err(e) => self.record(e.into()),
            },
            Some(ReceivedHeader::Acl(header)) => self.receive_fragment(header, &payload),
            None => (),
        }

        self.set_wait_type()
    }

    /// Update the connections and ACL flow control from a received event
    fn track_event(&mut self, event: &Event) {
        match event {
            Event::LeConnectionComplete(data) if data.status == Error::NoError => {
                if let Err(e) = self.open_connection(data.connection_handle) {
                    log::warn!("(HCI) {}", e);
                }
            }
            Event::DisconnectionComplete {
                status: Error::NoError,
                connection_handle,
                ..
            } => {
                self.close_connection(*connection_handle);
            }
            Event::CommandComplete {
                opcode,
                return_parameters:
                    ReturnParameters::BufferSize {
                        status: Error::NoError,
                        acl_data_packet_length,
                        total_num_acl_data_packets,
                    },
                ..
            } if *opcode == CommandKind::LeReadBufferSize.get_opcode() => {
                if *acl_data_packet_length != 0 {
                    self.controller_acl_len = Some((*acl_data_packet_length).into());
                }

                if *total_num_acl_data_packets != 0 {
                    log::debug!("(HCI) ACL data credit is {}", total_num_acl_data_packets);

                    self.acl_credit = Some((*total_num_acl_data_packets).into());
                }
            }
            Event::NumberOfCompletedPackets { completed } => {
                if let Some(credit) = self.acl_credit.as_mut() {
                    let returned = completed.iter().fold(0u16, |sum, (_, count)| sum.saturating_add(*count));

                    *credit = credit.saturating_add(returned);
                }
            }
            _ => (),
        }
    }

    fn receive_fragment(&mut self, header: AclHeader, payload: &[u8]) {
        let fragment = L2capFragment::new(header.packet_boundary_flag.into(), payload);

        match self.reassembler.push(header.connection_handle, &fragment) {
            Ok(None) => (),
            Ok(Some(frame)) => self.route(header.connection_handle, frame),
            Err(e) => self.record(e.into()),
        }
    }

    fn route(&mut self, handle: ConnectionHandle, frame: BasicFrame<Vec<u8>>) {
        match self.router.route_frame(&frame) {
            RouteOutcome::Deliver { destination, pdu } => {
                self.stats.frames_delivered += 1;

                self.upper
                    .deliver_l2cap_frame(handle, frame.get_channel_id(), destination, pdu)
            }
            RouteOutcome::Reject { error, reply } => {
                self.record(error.into());

                if let Err(e) = self.queue_l2cap(handle, &reply) {
                    log::error!("(HCI) cannot send command reject: {}", e);
                }
            }
            RouteOutcome::Drop(error) => self.record(error.into()),
        }
    }
}
