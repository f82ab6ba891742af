use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Domain interface for locating faces in a full frame.
///
/// Boxes come back in the order the pipeline should process them.
/// Implementations may hold inference state, hence `&mut self`.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>>;
}
