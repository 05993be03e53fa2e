use crate::base::error::Error;
use crate::base::traits::FrameObserver;
use crate::utils::hex_string;
use log::warn;

/// Logs rejected frames through the `log` facade at `warn` level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogObserver;

impl FrameObserver for LogObserver {
    fn frame_rejected(&self, error: &Error, frame: &[u8]) {
        warn!(
            "Rejected frame ({} bytes): {} [{}]",
            frame.len(),
            error,
            hex_string(frame)
        );
    }
}

/// Ignores rejected frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullObserver;

impl FrameObserver for NullObserver {
    fn frame_rejected(&self, _error: &Error, _frame: &[u8]) {}
}
