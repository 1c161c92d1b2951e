//! Packets sent by a controller

use blelink_hci_host::{AclBroadcastFlag, AclPacketBoundary, HciAclData};

/// The opcode of the *LE Read Buffer Size* command
pub const LE_READ_BUFFER_SIZE: u16 = 0x2002;

/// The opcode of the *Reset* command
pub const RESET: u16 = 0x0C03;

fn event(code: u8, parameters: &[u8]) -> Vec<u8> {
    let mut packet = vec![0x04, code, parameters.len() as u8];

    packet.extend_from_slice(parameters);

    packet
}

/// Create a Command Complete event
pub fn command_complete(num_hci_command_packets: u8, opcode: u16, return_parameters: &[u8]) -> Vec<u8> {
    let mut parameters = vec![num_hci_command_packets];

    parameters.extend_from_slice(&opcode.to_le_bytes());

    parameters.extend_from_slice(return_parameters);

    event(0x0E, &parameters)
}

/// Create a Command Status event
pub fn command_status(status: u8, num_hci_command_packets: u8, opcode: u16) -> Vec<u8> {
    let [o0, o1] = opcode.to_le_bytes();

    event(0x0F, &[status, num_hci_command_packets, o0, o1])
}

/// Create the Command Complete event of a *LE Read Buffer Size* command
pub fn le_buffer_size(acl_data_packet_length: u16, total_num_acl_data_packets: u8) -> Vec<u8> {
    let [l0, l1] = acl_data_packet_length.to_le_bytes();

    command_complete(1, LE_READ_BUFFER_SIZE, &[0x00, l0, l1, total_num_acl_data_packets])
}

/// Create a successful *LE Connection Complete* event
pub fn le_connection_complete(handle: u16) -> Vec<u8> {
    let [h0, h1] = handle.to_le_bytes();

    event(
        0x3E,
        &[
            0x01, // subevent
            0x00, // status
            h0, h1, 0x01, // peripheral
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, // peer address
            0x18, 0x00, // interval
            0x00, 0x00, // latency
            0x48, 0x00, // supervision timeout
            0x00,
        ],
    )
}

/// Create a successful *Disconnection Complete* event
pub fn disconnection_complete(handle: u16) -> Vec<u8> {
    let [h0, h1] = handle.to_le_bytes();

    event(0x05, &[0x00, h0, h1, 0x13])
}

/// Create a *Number Of Completed Packets* event
pub fn number_of_completed_packets(completed: &[(u16, u16)]) -> Vec<u8> {
    let mut parameters = vec![completed.len() as u8];

    for (handle, count) in completed {
        parameters.extend_from_slice(&handle.to_le_bytes());

        parameters.extend_from_slice(&count.to_le_bytes());
    }

    event(0x13, &parameters)
}

/// Create a HCI ACL data packet
pub fn acl(handle: u16, boundary: AclPacketBoundary, data: &[u8]) -> Vec<u8> {
    HciAclData::try_new(crate::handle(handle), boundary, AclBroadcastFlag::NoBroadcast, data)
        .expect("invalid ACL data")
        .to_uart_packet()
}

/// Create a packed basic frame
pub fn basic_frame(channel_id: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 4);

    frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());

    frame.extend_from_slice(&channel_id.to_le_bytes());

    frame.extend_from_slice(payload);

    frame
}
