use crate::shared::frame::Frame;

/// Where annotated frames are presented, and where the quit key comes from.
pub trait DisplaySink: Send {
    /// Presents one annotated frame.
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Waits up to `timeout_ms` for a keypress.
    ///
    /// Returns `None` when no key arrived within the timeout.
    fn poll_key(&mut self, timeout_ms: u64) -> Result<Option<char>, Box<dyn std::error::Error>>;

    /// Tears down the window, if any. Safe to call more than once.
    fn close(&mut self);
}
