//! Configuration of a transport session

/// The configuration of a [`TransportSession`](crate::TransportSession)
///
/// Use [`SessionConfigBuilder`] to create a configuration with anything other than the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// The largest number of bytes of a single packet that are discarded
    ///
    /// A packet that must be discarded but declares more bytes than this resets the session.
    pub trash_capacity: usize,
    /// The maximum payload of a HCI ACL data packet sent to the controller
    pub max_acl_payload: usize,
    /// The number of commands the controller accepts before its first Command Complete or Command
    /// Status event
    pub initial_command_credit: u8,
    /// The maximum number of connections that can be open at the same time
    pub max_connections: usize,
    /// Send L2CAP frames as automatically flushable
    pub flush_l2cap: bool,
}

impl SessionConfig {
    pub const DEFAULT_TRASH_CAPACITY: usize = 255;

    pub const DEFAULT_MAX_ACL_PAYLOAD: usize = 27;

    pub const DEFAULT_INITIAL_COMMAND_CREDIT: u8 = 1;

    pub const DEFAULT_MAX_CONNECTIONS: usize = 8;
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            trash_capacity: Self::DEFAULT_TRASH_CAPACITY,
            max_acl_payload: Self::DEFAULT_MAX_ACL_PAYLOAD,
            initial_command_credit: Self::DEFAULT_INITIAL_COMMAND_CREDIT,
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            flush_l2cap: false,
        }
    }
}

/// Builder of a [`SessionConfig`]
///
/// ```
/// # use blelink_hci_interface::SessionConfigBuilder;
/// let config = SessionConfigBuilder::new()
///     .set_max_acl_payload(251)
///     .set_max_connections(2)
///     .build();
///
/// assert_eq!(config.max_acl_payload, 251);
/// assert_eq!(config.trash_capacity, 255);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the largest packet that is discarded without resetting the session
    pub fn set_trash_capacity(mut self, capacity: usize) -> Self {
        self.config.trash_capacity = capacity;
        self
    }

    /// Set the maximum payload of a sent HCI ACL data packet
    ///
    /// A value of zero is replaced by the LE minimum of 27 bytes.
    pub fn set_max_acl_payload(mut self, max_payload: usize) -> Self {
        self.config.max_acl_payload = if max_payload == 0 {
            SessionConfig::DEFAULT_MAX_ACL_PAYLOAD
        } else {
            max_payload
        };
        self
    }

    pub fn set_initial_command_credit(mut self, credit: u8) -> Self {
        self.config.initial_command_credit = credit;
        self
    }

    pub fn set_max_connections(mut self, max: usize) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Send L2CAP frames as automatically flushable instead of non-flushable
    pub fn enable_flushable_l2cap(mut self) -> Self {
        self.config.flush_l2cap = true;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_acl_payload_is_replaced() {
        let config = SessionConfigBuilder::new().set_max_acl_payload(0).build();

        assert_eq!(config.max_acl_payload, SessionConfig::DEFAULT_MAX_ACL_PAYLOAD);
    }

    #[test]
    fn builder_defaults() {
        assert_eq!(SessionConfigBuilder::new().build(), SessionConfig::default());
    }
}
