use crate::base::error::{Error, Result};
use crate::base::message::Message;
use std::io;

/// Defines the behavior for decoding a received frame into a `Message`.
pub trait ProtocolDecoder {
    /// Decodes exactly one frame.
    ///
    /// `buf` must hold the whole frame and nothing else: the decoder does not
    /// reassemble partial frames or skip trailing bytes.
    ///
    /// # Arguments
    ///
    /// * `buf` - The bytes delivered by one read of the transport.
    fn decode(&self, buf: &[u8]) -> Result<Message>;
}

/// Defines the behavior for encoding `Message` objects into byte streams.
pub trait ProtocolEncoder {
    /// Encodes a `Message` into the provided byte buffer.
    ///
    /// Returns the number of bytes written to the buffer upon successful encoding.
    ///
    /// # Arguments
    ///
    /// * `msg` - The `Message` to encode.
    /// * `bytes` - The mutable byte slice to write the encoded message into.
    fn encode(&self, msg: &Message, bytes: &mut [u8]) -> Result<usize>;

    /// Size in bytes of the encoded form of `msg`.
    fn encoded_size(&self, msg: &Message) -> usize;

    /// Encodes a `Message` and writes it directly to a `Write` target (e.g., a serial port).
    ///
    /// Returns the number of bytes successfully written to the destination.
    ///
    /// # Arguments
    ///
    /// * `msg` - The `Message` to encode and write.
    /// * `dest` - The `Write` target to write the encoded bytes to.
    fn write_to(&self, msg: &Message, dest: &mut impl io::Write) -> Result<usize>;
}

/// Receives every frame the codec rejects.
///
/// Any `Fn(&Error, &[u8])` closure is an observer.
pub trait FrameObserver {
    /// Called with the rejection reason and the bytes that caused it.
    fn frame_rejected(&self, error: &Error, frame: &[u8]);
}

impl<F> FrameObserver for F
where
    F: Fn(&Error, &[u8]),
{
    fn frame_rejected(&self, error: &Error, frame: &[u8]) {
        self(error, frame)
    }
}
