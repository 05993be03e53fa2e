use crate::base::{
    Error, FrameObserver, FrameReader, FrameWriter, LogObserver, Message, ProtocolDecoder,
    ProtocolEncoder, Result, CHECKSUM_SIZE, FIXED_FIELDS_SIZE, MIN_FRAME_SIZE, PREVAC_HEADER,
};
use log::{error, trace};
use std::io::Write;

/// Checksum of `msg` recomputed from its current fields.
pub fn checksum(msg: &Message) -> u8 {
    msg.compute_checksum()
}

/// Encodes `msg` into a freshly allocated frame, logging failures.
pub fn encode(msg: &Message) -> Result<Vec<u8>> {
    encode_observed(msg, &LogObserver)
}

/// Encodes `msg` into a freshly allocated frame of exactly `msg.wire_size()` bytes.
pub fn encode_observed<O>(msg: &Message, observer: &O) -> Result<Vec<u8>>
where
    O: FrameObserver + ?Sized,
{
    let mut buf = vec![0; msg.wire_size()];
    let written = encode_into(msg, &mut buf, observer)?;
    buf.truncate(written);
    Ok(buf)
}

/// Encodes `msg` at the start of `bytes` and returns the number of bytes written.
///
/// Fails with `Error::BufferOverflow` when `bytes` cannot hold the whole frame; nothing
/// is ever silently truncated. The observer sees the partially written frame.
pub fn encode_into<O>(msg: &Message, bytes: &mut [u8], observer: &O) -> Result<usize>
where
    O: FrameObserver + ?Sized,
{
    trace!(
        "Encoding message: function={:02X}, data_len={}",
        msg.function_code(),
        msg.data_len()
    );
    let mut writer = FrameWriter::new(bytes);
    match write_fields(msg, &mut writer) {
        Ok(()) => {
            let written = writer.offset();
            trace!("Encoded {} bytes", written);
            Ok(written)
        }
        Err(err) => {
            let written = writer.offset();
            error!("Failed to encode message: {}", err);
            observer.frame_rejected(&err, &bytes[..written]);
            Err(err)
        }
    }
}

fn write_fields(msg: &Message, writer: &mut FrameWriter<'_>) -> Result<()> {
    writer.put_u8(msg.header())?;
    writer.put_u8(msg.data_len())?;
    writer.put_u8(msg.device_addr())?;
    writer.put_u8(msg.device_group())?;
    writer.put_u8(msg.logic_group())?;
    writer.put_u8(msg.driver_addr())?;
    writer.put_u8(msg.function_code())?;
    writer.put_slice(msg.data())?;
    writer.put_u8(msg.checksum())
}

/// Decodes one complete frame, logging rejections.
pub fn decode(buf: &[u8]) -> Result<Message> {
    decode_observed(buf, &LogObserver)
}

/// Decodes one complete frame.
///
/// Checks run in order and the first failure is reported: minimum size, header,
/// announced length against the received length, per-field bounds, checksum.
/// Every rejection is reported to `observer` together with the offending bytes.
pub fn decode_observed<O>(buf: &[u8], observer: &O) -> Result<Message>
where
    O: FrameObserver + ?Sized,
{
    trace!("decode called with {} bytes", buf.len());
    decode_frame(buf).map_err(|err| {
        trace!("Frame rejected: {}", err);
        observer.frame_rejected(&err, buf);
        err
    })
}

fn decode_frame(buf: &[u8]) -> Result<Message> {
    if buf.len() < MIN_FRAME_SIZE {
        return Err(Error::TooShort { len: buf.len() });
    }

    if buf[0] != PREVAC_HEADER {
        return Err(Error::BadHeader { found: buf[0] });
    }

    let expected = FIXED_FIELDS_SIZE + usize::from(buf[1]) + CHECKSUM_SIZE;
    if buf.len() != expected {
        return Err(Error::LengthMismatch {
            expected,
            actual: buf.len(),
        });
    }

    let mut reader = FrameReader::new(buf);
    let header = reader.read_u8()?;
    let data_len = reader.read_u8()?;
    let device_addr = reader.read_u8()?;
    let device_group = reader.read_u8()?;
    let logic_group = reader.read_u8()?;
    let driver_addr = reader.read_u8()?;
    let function_code = reader.read_u8()?;
    let data = reader.read_bytes(usize::from(data_len))?;
    let received = reader.read_u8()?;
    trace!(
        "Extracted fields: function={:02X}, data_len={}, {} bytes left",
        function_code,
        data_len,
        reader.remaining()
    );

    let msg = Message::from_parts(
        header,
        usize::from(data_len),
        device_addr,
        device_group,
        logic_group,
        driver_addr,
        function_code,
        Some(data),
        received,
    );
    if msg.checksum() != received {
        return Err(Error::ChecksumMismatch {
            expected: msg.checksum(),
            actual: received,
        });
    }

    Ok(msg)
}

/// The PREVAC host protocol.
///
/// Stateless: it only carries the observer that is told about rejected frames.
#[derive(Debug, Clone, Default)]
pub struct PrevacHostProtocol<O = LogObserver> {
    observer: O,
}

impl PrevacHostProtocol {
    /// Creates a protocol that logs rejected frames.
    pub fn new() -> PrevacHostProtocol {
        trace!("Creating new PrevacHostProtocol");
        PrevacHostProtocol {
            observer: LogObserver,
        }
    }
}

impl<O: FrameObserver> PrevacHostProtocol<O> {
    /// Creates a protocol reporting rejected frames to `observer`.
    pub fn with_observer(observer: O) -> PrevacHostProtocol<O> {
        PrevacHostProtocol { observer }
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

impl<O: FrameObserver> ProtocolDecoder for PrevacHostProtocol<O> {
    fn decode(&self, buf: &[u8]) -> Result<Message> {
        decode_observed(buf, &self.observer)
    }
}

impl<O: FrameObserver> ProtocolEncoder for PrevacHostProtocol<O> {
    fn encode(&self, msg: &Message, bytes: &mut [u8]) -> Result<usize> {
        encode_into(msg, bytes, &self.observer)
    }

    fn encoded_size(&self, msg: &Message) -> usize {
        msg.wire_size()
    }

    fn write_to(&self, msg: &Message, dest: &mut impl Write) -> Result<usize> {
        trace!(
            "write_to called for message: function={:02X}, data_len={}",
            msg.function_code(),
            msg.data_len()
        );
        let buf = encode_observed(msg, &self.observer)?;
        match dest.write_all(&buf) {
            Ok(()) => {
                trace!("Successfully wrote {} bytes", buf.len());
                Ok(buf.len())
            }
            Err(err) => {
                error!("IO error during write_all: {}", err);
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{NullObserver, MAX_FRAME_SIZE};
    use std::cell::RefCell;

    fn frame(data: &[u8]) -> Vec<u8> {
        encode(&Message::with_data(0x53, data)).unwrap()
    }

    #[test]
    fn protocol_encode() {
        assert_eq!(
            encode(&Message::new(0x53)).unwrap().as_slice(),
            [0xAA, 0x00, 0xC8, 0x91, 0xC8, 0x01, 0x53, 0x75]
        );

        let mut msg = Message::new(0x53);
        msg.set_data_len(4);
        msg.set_payload_hex("0x01").unwrap();
        assert_eq!(
            encode(&msg).unwrap().as_slice(),
            [0xAA, 0x04, 0xC8, 0x91, 0xC8, 0x01, 0x53, 0x01, 0x00, 0x00, 0x00, 0x7A]
        );
        assert_eq!(checksum(&msg), 0x7A);
    }

    #[test]
    fn encode_does_not_mutate_source() {
        let msg = Message::with_data(0x10, &[1, 2, 3]);
        let copy = msg.clone();
        let bytes = encode(&msg).unwrap();
        assert_eq!(bytes.len(), msg.wire_size());
        assert_eq!(msg, copy);
    }

    #[test]
    fn encode_into_rejects_small_buffer() {
        let msg = Message::with_data(0x53, &[1, 2, 3]);
        let mut buf = [0u8; 9];
        let rejected = RefCell::new(Vec::new());
        let observer = |err: &Error, bytes: &[u8]| {
            rejected.borrow_mut().push((err.to_string(), bytes.to_vec()))
        };
        match encode_into(&msg, &mut buf, &observer) {
            Err(Error::BufferOverflow {
                offset: 7,
                size: 3,
                capacity: 9,
            }) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(rejected.borrow().len(), 1);
        assert_eq!(rejected.borrow()[0].1.len(), 7);

        let mut big = [0xEEu8; 20];
        assert_eq!(encode_into(&msg, &mut big, &NullObserver).unwrap(), 11);
        assert_eq!(big[11], 0xEE);
    }

    #[test]
    fn round_trip() {
        for data in [&[0x00][..], &[1, 2, 3, 4][..], &[0xFF; 255][..]] {
            let msg = Message::with_data(0x53, data);
            assert_eq!(decode(&encode(&msg).unwrap()).unwrap(), msg);
        }

        let mut msg = Message::from_parts(0xAA, 2, 0x10, 0xA1, 0x20, 0x02, 0x7F, None, 0);
        msg.set_payload_hex("DE AD").unwrap();
        let decoded = decode(&encode(&msg).unwrap()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.data(), &[0xDE, 0xAD]);
    }

    #[test]
    fn decode_short_buffer() {
        for len in 0..MIN_FRAME_SIZE {
            let buf = vec![0xAA; len];
            assert!(matches!(
                decode_observed(&buf, &NullObserver),
                Err(Error::TooShort { len: l }) if l == len
            ));
        }
        // an empty frame is valid to encode but below the decode minimum
        let empty = encode(&Message::new(0x53)).unwrap();
        assert!(matches!(
            decode_observed(&empty, &NullObserver),
            Err(Error::TooShort { len: 8 })
        ));
    }

    #[test]
    fn decode_bad_header() {
        let mut buf = frame(&[1]);
        buf[0] = 0x55;
        assert!(matches!(
            decode_observed(&buf, &NullObserver),
            Err(Error::BadHeader { found: 0x55 })
        ));
    }

    #[test]
    fn decode_length_mismatch() {
        let buf = frame(&[1, 2, 3]);
        assert!(matches!(
            decode_observed(&buf[..buf.len() - 1], &NullObserver),
            Err(Error::LengthMismatch {
                expected: 11,
                actual: 10
            })
        ));

        let mut longer = buf.clone();
        longer.push(0);
        assert!(matches!(
            decode_observed(&longer, &NullObserver),
            Err(Error::LengthMismatch {
                expected: 11,
                actual: 12
            })
        ));

        let mut lying = buf;
        lying[1] = 0xFF;
        assert!(matches!(
            decode_observed(&lying, &NullObserver),
            Err(Error::LengthMismatch {
                expected: MAX_FRAME_SIZE,
                actual: 11
            })
        ));
    }

    #[test]
    fn decode_detects_single_byte_corruption() {
        let buf = frame(&[0x10, 0x20, 0x30]);
        // skip header and data length, which fail earlier checks
        for i in 2..buf.len() {
            let mut corrupted = buf.clone();
            corrupted[i] = corrupted[i].wrapping_add(1);
            assert!(
                matches!(
                    decode_observed(&corrupted, &NullObserver),
                    Err(Error::ChecksumMismatch { .. })
                ),
                "corruption at offset {} not detected",
                i
            );
        }
    }

    #[test]
    fn observer_sees_every_rejection() {
        let seen = RefCell::new(Vec::new());
        let protocol = PrevacHostProtocol::with_observer(|err: &Error, bytes: &[u8]| {
            seen.borrow_mut().push((err.is_frame_error(), bytes.len()))
        });

        assert!(protocol.decode(&[0xAA; 3]).is_err());
        assert!(protocol.decode(&[0x00; 9]).is_err());
        let good = frame(&[7]);
        assert_eq!(protocol.decode(&good).unwrap().data(), &[7]);

        assert_eq!(*seen.borrow(), vec![(true, 3), (true, 9)]);
    }

    #[test]
    fn write_to_emits_whole_frame() {
        let protocol = PrevacHostProtocol::new();
        let msg = Message::with_data(0x53, &[9, 8]);
        let mut out = Vec::new();
        assert_eq!(protocol.write_to(&msg, &mut out).unwrap(), 10);
        assert_eq!(protocol.encoded_size(&msg), 10);
        assert_eq!(out, encode(&msg).unwrap());
    }
}
