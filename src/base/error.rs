use std::error;
use std::fmt;
use std::io;

/// Represents errors that can occur while encoding, decoding or exchanging PREVAC frames.
#[derive(Debug)]
pub enum Error {
    /// Fewer bytes than the minimum frame size were received.
    TooShort { len: usize },

    /// The first byte of the frame is not the protocol header.
    BadHeader { found: u8 },

    /// The number of received bytes does not match the length announced by the frame.
    LengthMismatch { expected: usize, actual: usize },

    /// A field extraction would have read past the end of the frame.
    OutOfBounds {
        offset: usize,
        size: usize,
        len: usize,
    },

    /// The transmitted checksum does not match the one computed over the received fields.
    ChecksumMismatch { expected: u8, actual: u8 },

    /// A payload token could not be parsed as a hexadecimal byte.
    InvalidHexToken { token: String },

    /// An encode tried to write past the capacity of the destination buffer.
    BufferOverflow {
        offset: usize,
        size: usize,
        capacity: usize,
    },

    /// An I/O error occurred while communicating with the underlying stream (e.g., serial port).
    IoError(io::Error),
}

impl Error {
    /// Returns `true` for errors raised while validating an inbound frame.
    ///
    /// These are recoverable: the caller discards the frame and keeps listening.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            Error::TooShort { .. }
                | Error::BadHeader { .. }
                | Error::LengthMismatch { .. }
                | Error::OutOfBounds { .. }
                | Error::ChecksumMismatch { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooShort { len } => write!(f, "frame too short: {} bytes", len),
            Error::BadHeader { found } => write!(f, "bad frame header: {:02X}", found),
            Error::LengthMismatch { expected, actual } => write!(
                f,
                "frame length mismatch: expected {} bytes, got {}",
                expected, actual
            ),
            Error::OutOfBounds { offset, size, len } => write!(
                f,
                "read of {} bytes at offset {} exceeds frame of {} bytes",
                size, offset, len
            ),
            Error::ChecksumMismatch { expected, actual } => write!(
                f,
                "checksum mismatch: computed {:02X}, received {:02X}",
                expected, actual
            ),
            Error::InvalidHexToken { token } => write!(f, "invalid hex token: {:?}", token),
            Error::BufferOverflow {
                offset,
                size,
                capacity,
            } => write!(
                f,
                "write of {} bytes at offset {} exceeds buffer of {} bytes",
                size, offset, capacity
            ),
            Error::IoError(err) => write!(f, "io error: {}", err),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::IoError(err)
    }
}

/// A specialized `Result` type for PREVAC operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;
    use std::io;

    #[test]
    fn frame_errors_are_recoverable() {
        assert!(Error::TooShort { len: 3 }.is_frame_error());
        assert!(Error::ChecksumMismatch {
            expected: 1,
            actual: 2
        }
        .is_frame_error());
        assert!(!Error::InvalidHexToken {
            token: "ZZ".to_owned()
        }
        .is_frame_error());
        assert!(!Error::from(io::Error::new(io::ErrorKind::Other, "boom")).is_frame_error());
    }

    #[test]
    fn display_formats_bytes_in_hex() {
        assert_eq!(
            Error::BadHeader { found: 0x5A }.to_string(),
            "bad frame header: 5A"
        );
        assert_eq!(
            Error::LengthMismatch {
                expected: 12,
                actual: 9
            }
            .to_string(),
            "frame length mismatch: expected 12 bytes, got 9"
        );
    }
}
