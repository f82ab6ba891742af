use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classification::domain::face_preprocessor::ChannelOrder;
use crate::detection::infrastructure::onnx_yolo_locator::DEFAULT_CONFIDENCE;
use crate::pipeline::frame_tally::AlertRule;
use crate::shared::constants::{
    CLASSIFIER_INPUT_SIZE, CLASSIFIER_MODEL_PATH, DEFAULT_CAMERA_INDEX, DEFAULT_CAPTURE_HEIGHT,
    DEFAULT_CAPTURE_WIDTH, KEY_POLL_MS, MIN_FACE_SIZE, QUIT_KEY, SETTINGS_DIR_NAME,
    SETTINGS_FILE_NAME, WINDOW_TITLE,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Which camera to open and the size to ask it for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub index: u32,
    /// Backend-specific device string; overrides `index` when set.
    pub device_name: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            index: DEFAULT_CAMERA_INDEX,
            device_name: None,
            width: DEFAULT_CAPTURE_WIDTH,
            height: DEFAULT_CAPTURE_HEIGHT,
        }
    }
}

/// Everything the capture loop can be tuned with.
///
/// Loaded from JSON; any field missing from the file keeps its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub classifier_model: PathBuf,
    /// Explicit face locator model; resolved from the cache when unset.
    pub detector_model: Option<PathBuf>,
    pub detector_confidence: f64,
    pub camera: CameraSettings,
    pub classifier_input_size: u32,
    pub min_face_size: u32,
    pub channel_order: ChannelOrder,
    pub alert: AlertRule,
    pub window_title: String,
    pub quit_key: char,
    pub key_poll_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            classifier_model: PathBuf::from(CLASSIFIER_MODEL_PATH),
            detector_model: None,
            detector_confidence: DEFAULT_CONFIDENCE,
            camera: CameraSettings::default(),
            classifier_input_size: CLASSIFIER_INPUT_SIZE,
            min_face_size: MIN_FACE_SIZE,
            channel_order: ChannelOrder::default(),
            alert: AlertRule::default(),
            window_title: WINDOW_TITLE.to_string(),
            quit_key: QUIT_KEY,
            key_poll_ms: KEY_POLL_MS,
        }
    }
}

impl PipelineSettings {
    /// Default location: `<config dir>/FaceTally/settings.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Reads settings from an explicit file. A missing or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Reads the default settings file if one exists, else returns defaults.
    pub fn load_or_default() -> Result<Self, SettingsError> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                log::info!("Loading settings from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.detector_confidence) {
            return Err(SettingsError::Invalid(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.detector_confidence
            )));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(SettingsError::Invalid(format!(
                "Capture size must be non-zero, got {}x{}",
                self.camera.width, self.camera.height
            )));
        }
        if self.classifier_input_size == 0 {
            return Err(SettingsError::Invalid(
                "Classifier input size must be non-zero".to_string(),
            ));
        }
        if self.min_face_size == 0 {
            return Err(SettingsError::Invalid(
                "Minimum face size must be at least 1 pixel".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_capture_contract() {
        let s = PipelineSettings::default();
        assert_eq!(s.classifier_model, PathBuf::from("gender_detection.onnx"));
        assert_eq!(s.camera.index, 0);
        assert_eq!((s.camera.width, s.camera.height), (1280, 720));
        assert_eq!(s.classifier_input_size, 96);
        assert_eq!(s.min_face_size, 10);
        assert_eq!(s.quit_key, 'q');
        assert_eq!(s.window_title, "gender detection");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "camera": { "index": 2 }, "channel_order": "rgb", "alert": { "min_females": 3 } }"#,
        )
        .unwrap();

        let s = PipelineSettings::load(&path).unwrap();
        assert_eq!(s.camera.index, 2);
        assert_eq!(s.camera.width, 1280);
        assert_eq!(s.channel_order, ChannelOrder::Rgb);
        assert_eq!(s.alert.min_females, 3);
        assert_eq!(s.alert.males_above, AlertRule::default().males_above);
        assert_eq!(s.min_face_size, 10);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let tmp = TempDir::new().unwrap();
        let err = PipelineSettings::load(&tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_load_malformed_file_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let err = PipelineSettings::load(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn test_round_trip_through_json() {
        let mut s = PipelineSettings::default();
        s.detector_model = Some(PathBuf::from("/models/face.onnx"));
        s.camera.device_name = Some("video=USB Camera".to_string());
        let json = serde_json::to_string_pretty(&s).unwrap();
        let back: PipelineSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }

    #[rstest]
    #[case::negative_confidence(|s: &mut PipelineSettings| s.detector_confidence = -0.1)]
    #[case::confidence_above_one(|s: &mut PipelineSettings| s.detector_confidence = 1.5)]
    #[case::zero_width(|s: &mut PipelineSettings| s.camera.width = 0)]
    #[case::zero_input(|s: &mut PipelineSettings| s.classifier_input_size = 0)]
    #[case::zero_min_face_size(|s: &mut PipelineSettings| s.min_face_size = 0)]
    fn test_validate_rejects(#[case] mutate: fn(&mut PipelineSettings)) {
        let mut s = PipelineSettings::default();
        mutate(&mut s);
        assert!(matches!(s.validate(), Err(SettingsError::Invalid(_))));
    }
}
