use std::time::Instant;

use crate::classification::domain::face_preprocessor::FacePreprocessor;
use crate::classification::domain::gender::Classification;
use crate::classification::domain::gender_classifier::GenderClassifier;
use crate::detection::domain::face_locator::FaceLocator;
use crate::pipeline::frame_tally::FrameTally;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// What one frame contained: every counted face with its label, plus totals.
///
/// Faces rejected as too small are absent from both.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub faces: Vec<(FaceBox, Classification)>,
    pub tally: FrameTally,
}

/// Locates and classifies every face in a frame.
pub struct FrameAnalyzer {
    locator: Box<dyn FaceLocator>,
    classifier: Box<dyn GenderClassifier>,
    preprocessor: FacePreprocessor,
}

impl FrameAnalyzer {
    pub fn new(
        locator: Box<dyn FaceLocator>,
        classifier: Box<dyn GenderClassifier>,
        preprocessor: FacePreprocessor,
    ) -> Self {
        Self {
            locator,
            classifier,
            preprocessor,
        }
    }

    pub fn analyze(
        &mut self,
        frame: &Frame,
        logger: &mut dyn PipelineLogger,
    ) -> Result<FrameReport, Box<dyn std::error::Error>> {
        let t0 = Instant::now();
        let boxes = self.locator.locate(frame)?;
        logger.timing("detect", t0.elapsed().as_secs_f64() * 1000.0);

        let t0 = Instant::now();
        let mut report = FrameReport::default();
        for face in boxes {
            let Some(crop) = self.preprocessor.crop(frame, &face) else {
                log::debug!("Skipping undersized face at ({}, {})", face.left, face.top);
                continue;
            };
            let batch = self.preprocessor.to_batch(&crop);
            let scores = self.classifier.scores(batch)?;
            let classification = Classification::from_scores(&scores)?;
            log::debug!(
                "Face at ({}, {}) score {:.2}: {}",
                face.left,
                face.top,
                face.score,
                classification.label_text()
            );
            logger.metric("face_score", face.score as f64);
            report.tally.record(classification.gender);
            report.faces.push((face, classification));
        }
        logger.timing("classify", t0.elapsed().as_secs_f64() * 1000.0);

        logger.metric("faces", report.faces.len() as f64);
        logger.metric("males", report.tally.male as f64);
        logger.metric("females", report.tally.female as f64);
        Ok(report)
    }
}
