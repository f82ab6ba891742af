use crate::display::domain::display_sink::DisplaySink;
use crate::shared::frame::Frame;

/// Discards frames and never reports a key.
///
/// Used for file replay on machines without a display; the loop then
/// runs until the source is exhausted.
#[derive(Debug, Default)]
pub struct HeadlessSink;

impl HeadlessSink {
    pub fn new() -> Self {
        Self
    }
}

impl DisplaySink for HeadlessSink {
    fn show(&mut self, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn poll_key(&mut self, _timeout_ms: u64) -> Result<Option<char>, Box<dyn std::error::Error>> {
        Ok(None)
    }

    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_frames_and_never_quits() {
        let mut sink = HeadlessSink::new();
        let frame = Frame::new(vec![0; 12], 2, 2, 0);
        for _ in 0..3 {
            assert!(sink.show(&frame).is_ok());
            assert_eq!(sink.poll_key(1).unwrap(), None);
        }
        sink.close();
        sink.close();
    }
}
