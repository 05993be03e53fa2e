mod channel;
mod cursor;
mod error;
mod message;
mod observer;
mod traits;

pub use self::channel::*;
pub use self::cursor::{FrameReader, FrameWriter};
pub use self::error::{Error, Result};
pub use self::message::*;
pub use self::observer::{LogObserver, NullObserver};
pub use self::traits::{FrameObserver, ProtocolDecoder, ProtocolEncoder};
