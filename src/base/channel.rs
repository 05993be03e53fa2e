use crate::base::error::Result;
use crate::base::message::{Message, MAX_FRAME_SIZE};
use crate::base::traits::{ProtocolDecoder, ProtocolEncoder};
use log::{error, trace, warn};
use std::io;

/// Channel encode and decode message with protocol, and send and receive bytes via stream
///
/// The stream is expected to be already opened and configured (see
/// [`SerialSettings`](crate::types::SerialSettings)); its read timeout bounds every
/// [`Channel::read`].
///
/// # Examples
/// ```ignore
/// let mut channel = Channel::new(
///     PrevacHostProtocol::new(),
///     serial_port
/// );
///
/// channel.write(&Message::new(0x53)).unwrap();
/// ```
#[derive(Debug)]
pub struct Channel<P, T: ?Sized> {
    protocol: P,
    stream: Box<T>,
    read_buffer: Vec<u8>,
}

impl<P, T: ?Sized> Channel<P, T>
where
    P: ProtocolDecoder + ProtocolEncoder,
    T: io::Read + io::Write,
{
    /// Create a new `Channel` to read and write messages
    pub fn new(protocol: P, stream: Box<T>) -> Channel<P, T> {
        trace!("Creating new Channel with read buffer size {}", MAX_FRAME_SIZE);
        Channel {
            protocol,
            stream,
            read_buffer: vec![0; MAX_FRAME_SIZE],
        }
    }

    /// The protocol used to encode and decode frames.
    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    /// Read one message from channel
    ///
    /// Performs a single read of up to one maximum sized frame and decodes whatever
    /// arrived. A read that times out counts as zero bytes, which the decoder rejects
    /// as too short. Partial frames are discarded, not reassembled.
    ///
    /// # Example
    /// ```ignore
    /// match channel.read() {
    ///     Ok(msg) => println!("{}", msg),
    ///     Err(e) if e.is_frame_error() => { /* drop the frame and keep listening */ }
    ///     Err(e) => return Err(e),
    /// }
    /// ```
    pub fn read(&mut self) -> Result<Message> {
        trace!("Channel read called");
        let read = self.receive(MAX_FRAME_SIZE)?;
        let result = self.protocol.decode(&self.read_buffer[..read]);
        match &result {
            Ok(msg) => trace!(
                "Decoded message: function={:02X}, data_len={}",
                msg.function_code(),
                msg.data_len()
            ),
            Err(e) => warn!("Discarding {} received bytes: {}", read, e),
        }
        result
    }

    /// Reads at most `max_len` bytes into the read buffer, returning how many arrived.
    fn receive(&mut self, max_len: usize) -> Result<usize> {
        let max_len = max_len.min(self.read_buffer.len());
        loop {
            match self.stream.read(&mut self.read_buffer[..max_len]) {
                Ok(read) => {
                    trace!("Read {} bytes from stream", read);
                    return Ok(read);
                }
                Err(e)
                    if e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::WouldBlock =>
                {
                    trace!("Stream read timed out");
                    return Ok(0);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    trace!("Stream read interrupted, retrying");
                }
                Err(e) => {
                    error!("IO error reading from stream: {}", e);
                    return Err(e.into());
                }
            }
        }
    }

    /// Write message to channel
    ///
    /// Succeeds only when every byte of the frame was accepted by the stream.
    ///
    /// # Example
    /// ```ignore
    /// channel.write(&Message::new(0x53)).unwrap();
    /// ```
    pub fn write(&mut self, msg: &Message) -> Result<usize> {
        trace!(
            "Channel write called: function={:02X}, data_len={}",
            msg.function_code(),
            msg.data_len()
        );
        let written = self.protocol.write_to(msg, &mut self.stream)?;
        trace!("Flushing stream...");
        self.stream.flush()?;
        Ok(written)
    }

    /// Send a request to channel and read the response
    ///
    /// # Example
    /// ```ignore
    /// let resp = channel.invoke(&Message::new(0x53))?;
    /// ```
    pub fn invoke(&mut self, request: &Message) -> Result<Message> {
        trace!(
            "Channel invoke called: function={:02X}, data_len={}",
            request.function_code(),
            request.data_len()
        );
        if let Err(e) = self.write(request) {
            error!("Invoke: failed to write request: {:?}", e);
            return Err(e);
        }
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{Error, NullObserver};
    use crate::protocol::{encode, PrevacHostProtocol};
    use std::collections::VecDeque;

    /// In-memory stream: each queued read result is returned by one `read` call.
    #[derive(Default)]
    struct MockStream {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
        flushes: usize,
        accept_writes: bool,
    }

    impl io::Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    Ok(n)
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
            }
        }
    }

    impl io::Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.accept_writes {
                return Ok(0);
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn channel(
        reads: Vec<io::Result<Vec<u8>>>,
    ) -> Channel<PrevacHostProtocol<NullObserver>, MockStream> {
        let stream = MockStream {
            reads: reads.into(),
            accept_writes: true,
            ..Default::default()
        };
        Channel::new(
            PrevacHostProtocol::with_observer(NullObserver),
            Box::new(stream),
        )
    }

    #[test]
    fn write_sends_whole_frame_and_flushes() {
        let mut chn = channel(vec![]);
        let msg = Message::with_data(0x53, &[1, 2]);
        assert_eq!(chn.write(&msg).unwrap(), 10);
        assert_eq!(chn.stream.written, encode(&msg).unwrap());
        assert_eq!(chn.stream.flushes, 1);
    }

    #[test]
    fn write_fails_when_stream_refuses_bytes() {
        let mut chn = channel(vec![]);
        chn.stream.accept_writes = false;
        assert!(matches!(
            chn.write(&Message::new(0x53)),
            Err(Error::IoError(e)) if e.kind() == io::ErrorKind::WriteZero
        ));
    }

    #[test]
    fn read_decodes_one_frame() {
        let response = Message::with_data(0x53, b"OK");
        let mut chn = channel(vec![Ok(encode(&response).unwrap())]);
        assert_eq!(chn.read().unwrap(), response);
    }

    #[test]
    fn read_timeout_is_too_short() {
        let mut chn = channel(vec![]);
        assert!(matches!(chn.read(), Err(Error::TooShort { len: 0 })));
    }

    #[test]
    fn partial_frame_is_discarded() {
        let bytes = encode(&Message::with_data(0x53, &[1, 2, 3, 4])).unwrap();
        let (head, tail) = bytes.split_at(9);
        let mut chn = channel(vec![Ok(head.to_vec()), Ok(tail.to_vec())]);
        assert!(matches!(
            chn.read(),
            Err(Error::LengthMismatch {
                expected: 12,
                actual: 9
            })
        ));
        assert!(matches!(chn.read(), Err(Error::TooShort { len: 3 })));
    }

    #[test]
    fn read_retries_after_interrupt_and_propagates_io_errors() {
        let frame = encode(&Message::with_data(0x53, &[0])).unwrap();
        let mut chn = channel(vec![
            Err(io::Error::new(io::ErrorKind::Interrupted, "signal")),
            Ok(frame),
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone")),
        ]);
        assert_eq!(chn.read().unwrap().data(), &[0]);
        assert!(matches!(chn.read(), Err(Error::IoError(_))));
    }

    #[test]
    fn invoke_writes_then_reads() {
        let response = Message::with_data(0x54, &[0x10, 0x20]);
        let mut chn = channel(vec![Ok(encode(&response).unwrap())]);
        let request = Message::with_data(0x53, &[0x01]);
        assert_eq!(chn.invoke(&request).unwrap(), response);
        assert_eq!(chn.stream.written, encode(&request).unwrap());
    }
}
