use ndarray::Array4;

/// Domain interface for the pretrained gender classifier.
///
/// `batch` holds a single face in NHWC layout (`1 × 96 × 96 × 3`) with
/// values in `[0, 1]`. Implementations return one score per label, in
/// [`Gender::ALL`](super::gender::Gender::ALL) order.
pub trait GenderClassifier: Send {
    fn scores(&mut self, batch: Array4<f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
