/// What a frame source negotiated when it was opened.
///
/// Camera drivers may ignore the requested size, so `width`/`height` are
/// what the decoder actually reports.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec: String,
    /// Device string or file path, for logging.
    pub source: String,
}
