/// Gender classifier using ONNX Runtime via `ort`.
///
/// Wraps a Keras-exported model that takes a `1 × 96 × 96 × 3` NHWC batch
/// and emits two softmax scores in `[man, woman]` order.
use std::path::Path;

use ndarray::Array4;

use crate::classification::domain::gender::{ClassificationError, Gender};
use crate::classification::domain::gender_classifier::GenderClassifier;
use crate::shared::execution_provider::preferred_execution_providers;
use crate::shared::model_resolver;

pub struct OnnxGenderClassifier {
    session: ort::session::Session,
}

impl OnnxGenderClassifier {
    /// Load the classifier from a fixed local path.
    ///
    /// A missing file fails here rather than on the first face.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let model_path = model_resolver::resolve_local(model_path)?;
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .commit_from_file(&model_path)?;
        log::info!("Loaded gender classifier from {}", model_path.display());
        Ok(Self { session })
    }
}

impl GenderClassifier for OnnxGenderClassifier {
    fn scores(&mut self, batch: Array4<f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let input_value = ort::value::Tensor::from_array(batch)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("Gender classifier produced no outputs".into());
        }

        // Output shape is [1, 2]; flatten the batch dimension away.
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let scores: Vec<f32> = tensor.iter().copied().collect();
        if scores.len() != Gender::ALL.len() {
            return Err(Box::new(ClassificationError::UnexpectedScores {
                expected: Gender::ALL.len(),
                actual: scores.len(),
            }));
        }
        Ok(scores)
    }
}
