//! # PREVAC protocol driver
//!
//! `prevac` implements the binary PREVAC protocol spoken by TM13/TM14 thickness monitors
//! and related instruments over a serial line. It provides the [`Message`] frame type,
//! a stateless codec ([`encode`], [`decode`], [`checksum`]) and a [`Channel`] binding the
//! codec to any `Read + Write` stream.
//!
//! Opening and configuring the serial port is left to the caller; [`SerialSettings`]
//! lists the parameters the instrument expects.
//!
//! ```
//! use prevac::{decode, encode, Message};
//!
//! let msg = Message::with_data(0x53, &[0x01]);
//! let frame = encode(&msg).unwrap();
//! assert_eq!(frame, [0xAA, 0x01, 0xC8, 0x91, 0xC8, 0x01, 0x53, 0x01, 0x77]);
//! assert_eq!(decode(&frame).unwrap(), msg);
//! ```

extern crate log;

pub mod base;
mod checksum;
mod protocol;
pub mod types;
pub mod utils;

pub use crate::base::{
    Channel, Error, FrameObserver, LogObserver, Message, NullObserver, ProtocolDecoder,
    ProtocolEncoder, Result, MAX_DATA_LEN, MAX_FRAME_SIZE, PREVAC_HEADER,
};
pub use crate::protocol::{
    checksum, decode, decode_observed, encode, encode_into, encode_observed, PrevacHostProtocol,
};
pub use crate::types::{DeviceAddress, DeviceClass, PayloadMode, SerialSettings};

use log::{error, trace, warn};
use std::io::{Read, Write};

/// A connection to one PREVAC device.
///
/// Wraps a [`Channel`] and the addressing fields of the target so requests only need a
/// function code and a payload.
#[derive(Debug)]
pub struct PrevacDevice<T: ?Sized> {
    channel: Channel<PrevacHostProtocol, T>,
    address: DeviceAddress,
}

impl<T: ?Sized> PrevacDevice<T>
where
    T: Read + Write,
{
    /// Constructs a new `PrevacDevice` for the default device address.
    ///
    /// # Example
    /// ```ignore
    /// # use prevac::{Channel, PrevacDevice, PrevacHostProtocol};
    /// let serial_port = serialport::new("/dev/ttyUSB0", 57600).open()?;
    /// let channel = Channel::new(PrevacHostProtocol::new(), serial_port);
    /// let mut device = PrevacDevice::new(channel);
    /// ```
    pub fn new(channel: Channel<PrevacHostProtocol, T>) -> PrevacDevice<T> {
        PrevacDevice::with_address(channel, DeviceAddress::default())
    }

    /// Constructs a new `PrevacDevice` talking to a specific address.
    pub fn with_address(
        channel: Channel<PrevacHostProtocol, T>,
        address: DeviceAddress,
    ) -> PrevacDevice<T> {
        trace!("Creating new PrevacDevice for {:?}", address);
        PrevacDevice { channel, address }
    }

    /// Constructs a new `PrevacDevice` directly from a communication stream.
    pub fn with_stream(stream: Box<T>) -> PrevacDevice<T> {
        PrevacDevice::new(Channel::new(PrevacHostProtocol::new(), stream))
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    pub fn set_address(&mut self, address: DeviceAddress) {
        self.address = address;
    }

    /// Builds a request addressed to this device.
    pub fn request(&self, function_code: u8, data: &[u8]) -> Message {
        Message::addressed(self.address, function_code, data)
    }

    /// Sends a request without waiting for an answer.
    pub fn send(&mut self, function_code: u8, data: &[u8]) -> Result<()> {
        let msg = self.request(function_code, data);
        trace!("Sending request: {}", msg);
        self.channel.write(&msg)?;
        Ok(())
    }

    /// Sends an already built message unchanged.
    pub fn send_message(&mut self, msg: &Message) -> Result<()> {
        self.channel.write(msg)?;
        Ok(())
    }

    /// Receives one message.
    pub fn receive(&mut self) -> Result<Message> {
        self.channel.read()
    }

    /// Sends a request and waits for the answer.
    ///
    /// Answers coming from another device address are logged but still returned; the
    /// meaning of a response is up to the caller.
    pub fn invoke(&mut self, function_code: u8, data: &[u8]) -> Result<Message> {
        let request = self.request(function_code, data);
        trace!("Invoking request: {}", request);
        match self.channel.invoke(&request) {
            Ok(resp) => {
                if resp.device_addr() != self.address.device_addr {
                    warn!(
                        "Response from device {:02X}, expected {:02X}",
                        resp.device_addr(),
                        self.address.device_addr
                    );
                }
                trace!("Received response: {}", resp);
                Ok(resp)
            }
            Err(e) => {
                error!("Error invoking function {:02X}: {}", function_code, e);
                Err(e)
            }
        }
    }
}
