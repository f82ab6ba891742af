use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Produces frames from a camera or a recorded stream.
///
/// Implementations own the underlying device handle. `close` must be
/// idempotent and should also run on drop, so the handle is released
/// on every exit path.
pub trait FrameSource: Send {
    /// Opens the device or file and returns the negotiated metadata.
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Blocks until the next frame is available.
    ///
    /// `Ok(None)` means a finite source is exhausted. Live sources never
    /// end cleanly: losing the stream is an error.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the device.
    fn close(&mut self);
}
