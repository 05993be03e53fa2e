use crate::base::error::Result;
use crate::checksum::Checksum;
use crate::types::{DeviceAddress, PayloadMode};
use crate::utils::{hex_string, parse_hex_tokens};
use log::{trace, warn};
use std::borrow::Cow;
use std::fmt;

/// Constant first byte of every PREVAC frame.
pub const PREVAC_HEADER: u8 = 0xAA;

/// Maximum number of payload bytes a frame can carry.
pub const MAX_DATA_LEN: usize = 0xFF;

/// Header, data length, device address, device group, logic group, driver address and function code.
pub const FIXED_FIELDS_SIZE: usize = 7;

/// Size of the trailing checksum.
pub const CHECKSUM_SIZE: usize = 1;

/// Smallest buffer the decoder accepts before looking at any field.
pub const MIN_FRAME_SIZE: usize = 9;

/// Largest possible frame on the wire.
pub const MAX_FRAME_SIZE: usize = FIXED_FIELDS_SIZE + MAX_DATA_LEN + CHECKSUM_SIZE;

fn clamp_data_len(data_len: usize) -> usize {
    if data_len > MAX_DATA_LEN {
        warn!(
            "Data length {} exceeds maximum {}, clamping",
            data_len, MAX_DATA_LEN
        );
        MAX_DATA_LEN
    } else {
        data_len
    }
}

/// One PREVAC protocol frame.
///
/// The payload length is the data length field: `data().len() == data_len()` always
/// holds and never exceeds [`MAX_DATA_LEN`]. The checksum is derived from the other
/// fields and recomputed by every mutating method, so it cannot be set on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message {
    header: u8,
    device_addr: u8,
    device_group: u8,
    logic_group: u8,
    driver_addr: u8,
    function_code: u8,
    data: Vec<u8>,
    crc: u8,
}

impl Message {
    /// Creates a message for the default device with a function code and no payload.
    pub fn new(function_code: u8) -> Message {
        Message::with_data(function_code, &[])
    }

    /// Creates a message for the default device with a function code and payload data.
    ///
    /// Payloads longer than [`MAX_DATA_LEN`] are truncated.
    #[inline]
    pub fn with_data(function_code: u8, data: &[u8]) -> Message {
        Message::addressed(DeviceAddress::default(), function_code, data)
    }

    /// Creates a message for a specific device.
    ///
    /// # Arguments
    ///
    /// * `address` - The addressing fields of the target device.
    /// * `function_code` - The device operation requested.
    /// * `data` - The payload. Truncated to [`MAX_DATA_LEN`] bytes.
    pub fn addressed(address: DeviceAddress, function_code: u8, data: &[u8]) -> Message {
        let mut msg = Message::from_parts(
            PREVAC_HEADER,
            0,
            address.device_addr,
            address.device_group,
            address.logic_group,
            address.driver_addr,
            function_code,
            None,
            0,
        );
        msg.set_payload_text(data);
        msg
    }

    /// Builds a message from raw field values.
    ///
    /// `data_len` is clamped to [`MAX_DATA_LEN`]. The first `min(data_len, data.len())`
    /// bytes are copied from `data` and the rest of the payload is zero filled; a missing
    /// `data` yields an all-zero payload. `crc_seed` is ignored: the checksum is always
    /// recomputed from the fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        header: u8,
        data_len: usize,
        device_addr: u8,
        device_group: u8,
        logic_group: u8,
        driver_addr: u8,
        function_code: u8,
        data: Option<&[u8]>,
        crc_seed: u8,
    ) -> Message {
        let data_len = clamp_data_len(data_len);
        let mut payload = vec![0; data_len];
        if let Some(src) = data {
            let copied = data_len.min(src.len());
            payload[..copied].copy_from_slice(&src[..copied]);
        }

        let mut msg = Message {
            header,
            device_addr,
            device_group,
            logic_group,
            driver_addr,
            function_code,
            data: payload,
            crc: crc_seed,
        };
        let crc = msg.calculate_checksum();
        if crc != crc_seed {
            trace!(
                "Ignoring checksum seed {:02X}, computed {:02X}",
                crc_seed,
                crc
            );
        }
        msg
    }

    pub fn header(&self) -> u8 {
        self.header
    }

    /// Number of payload bytes, as sent in the data length field.
    pub fn data_len(&self) -> u8 {
        // data never grows past MAX_DATA_LEN
        self.data.len() as u8
    }

    pub fn device_addr(&self) -> u8 {
        self.device_addr
    }

    pub fn device_group(&self) -> u8 {
        self.device_group
    }

    pub fn logic_group(&self) -> u8 {
        self.logic_group
    }

    pub fn driver_addr(&self) -> u8 {
        self.driver_addr
    }

    pub fn function_code(&self) -> u8 {
        self.function_code
    }

    /// The meaningful payload bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The checksum computed by the last mutation.
    pub fn checksum(&self) -> u8 {
        self.crc
    }

    /// The addressing fields of this message.
    pub fn address(&self) -> DeviceAddress {
        DeviceAddress {
            device_addr: self.device_addr,
            device_group: self.device_group,
            logic_group: self.logic_group,
            driver_addr: self.driver_addr,
        }
    }

    /// Total number of bytes this message occupies on the wire.
    pub fn wire_size(&self) -> usize {
        FIXED_FIELDS_SIZE + self.data.len() + CHECKSUM_SIZE
    }

    /// Computes the checksum of the current fields without storing it.
    ///
    /// Sum of every field except the header, payload included, modulo 256.
    pub fn compute_checksum(&self) -> u8 {
        let mut checksum = Checksum::new();
        checksum.push(self.data_len());
        checksum.push(self.device_addr);
        checksum.push(self.device_group);
        checksum.push(self.logic_group);
        checksum.push(self.driver_addr);
        checksum.push(self.function_code);
        checksum.push_slice(&self.data);
        checksum.checksum()
    }

    /// Recomputes the checksum, stores it and returns it.
    pub fn calculate_checksum(&mut self) -> u8 {
        self.crc = self.compute_checksum();
        self.crc
    }

    pub fn set_device_addr(&mut self, device_addr: u8) {
        self.device_addr = device_addr;
        self.calculate_checksum();
    }

    pub fn set_device_group(&mut self, device_group: u8) {
        self.device_group = device_group;
        self.calculate_checksum();
    }

    pub fn set_logic_group(&mut self, logic_group: u8) {
        self.logic_group = logic_group;
        self.calculate_checksum();
    }

    pub fn set_driver_addr(&mut self, driver_addr: u8) {
        self.driver_addr = driver_addr;
        self.calculate_checksum();
    }

    /// Replaces all four addressing fields at once.
    pub fn set_address(&mut self, address: DeviceAddress) {
        self.device_addr = address.device_addr;
        self.device_group = address.device_group;
        self.logic_group = address.logic_group;
        self.driver_addr = address.driver_addr;
        self.calculate_checksum();
    }

    pub fn set_function_code(&mut self, function_code: u8) {
        self.function_code = function_code;
        self.calculate_checksum();
    }

    /// Declares a new data length.
    ///
    /// The value is clamped to [`MAX_DATA_LEN`]; the payload is truncated or zero padded
    /// to match it.
    pub fn set_data_len(&mut self, data_len: usize) {
        let data_len = clamp_data_len(data_len);
        self.data.resize(data_len, 0);
        self.calculate_checksum();
    }

    /// Assigns the payload according to `mode`.
    ///
    /// See [`Message::set_payload_text`] and [`Message::set_payload_hex`].
    pub fn set_payload(&mut self, mode: PayloadMode, input: &str) -> Result<()> {
        match mode {
            PayloadMode::Text => {
                self.set_payload_text(input);
                Ok(())
            }
            PayloadMode::HexTokens => self.set_payload_hex(input),
        }
    }

    /// Stores `data` verbatim as the payload and sets the data length to its length.
    ///
    /// Input longer than [`MAX_DATA_LEN`] is truncated.
    pub fn set_payload_text(&mut self, data: impl AsRef<[u8]>) {
        let data = data.as_ref();
        let data_len = clamp_data_len(data.len());
        self.data.clear();
        self.data.extend_from_slice(&data[..data_len]);
        self.calculate_checksum();
        trace!("Payload set to {} bytes (text)", data_len);
    }

    /// Fills the payload from whitespace separated hex byte tokens.
    ///
    /// The data length is kept as declared: extra tokens are dropped and missing ones
    /// are zero filled. On a malformed token the message is left untouched.
    ///
    /// # Example
    /// ```
    /// # use prevac::Message;
    /// let mut msg = Message::new(0x53);
    /// msg.set_data_len(4);
    /// msg.set_payload_hex("01 02 03").unwrap();
    /// assert_eq!(msg.data(), &[0x01, 0x02, 0x03, 0x00]);
    /// ```
    pub fn set_payload_hex(&mut self, tokens: &str) -> Result<()> {
        let mut bytes = parse_hex_tokens(tokens)?;
        let data_len = self.data.len();
        if bytes.len() > data_len {
            warn!(
                "{} hex tokens given for a data length of {}, truncating",
                bytes.len(),
                data_len
            );
        }
        bytes.resize(data_len, 0);
        self.data = bytes;
        self.calculate_checksum();
        trace!("Payload set to {} bytes (hex)", data_len);
        Ok(())
    }

    /// The payload interpreted as text; invalid UTF-8 is replaced.
    pub fn data_as_string(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// A `Display` adapter printing one labelled field per line.
    pub fn detailed(&self) -> Detailed<'_> {
        Detailed(self)
    }
}

impl Default for Message {
    /// An empty message with the instrument's power-on addressing and function code 0.
    fn default() -> Self {
        Message::new(0)
    }
}

/// Compact form: every wire byte as two hex digits, separated by spaces.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X} {:02X} {:02X} {:02X} {:02X} {:02X} {:02X} ",
            self.header,
            self.data_len(),
            self.device_addr,
            self.device_group,
            self.logic_group,
            self.driver_addr,
            self.function_code
        )?;
        for b in &self.data {
            write!(f, "{:02X} ", b)?;
        }
        write!(f, "{:02X}", self.crc)
    }
}

/// Multi-line rendering of a [`Message`], see [`Message::detailed`].
pub struct Detailed<'a>(&'a Message);

impl fmt::Display for Detailed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = self.0;
        writeln!(f, "Header: {:02X}", msg.header)?;
        writeln!(f, "Data Length: {}", msg.data_len())?;
        writeln!(f, "Device Address: {:02X}", msg.device_addr)?;
        writeln!(f, "Device Group: {:02X}", msg.device_group)?;
        writeln!(f, "Logic Group: {:02X}", msg.logic_group)?;
        writeln!(f, "Driver Address: {:02X}", msg.driver_addr)?;
        writeln!(f, "Function Code: {:02X}", msg.function_code)?;
        writeln!(f, "Data: {}", hex_string(&msg.data))?;
        write!(f, "CRC: {:02X}", msg.crc)
    }
}
