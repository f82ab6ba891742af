pub const DETECTOR_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const DETECTOR_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

/// Classifier artifact, read from the working directory unless overridden.
pub const CLASSIFIER_MODEL_PATH: &str = "gender_detection.onnx";

/// Side length of the square classifier input.
pub const CLASSIFIER_INPUT_SIZE: u32 = 96;

/// Crops narrower or shorter than this are treated as noise.
pub const MIN_FACE_SIZE: u32 = 10;

pub const DEFAULT_CAMERA_INDEX: u32 = 0;
pub const DEFAULT_CAPTURE_WIDTH: u32 = 1280;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 720;

pub const WINDOW_TITLE: &str = "gender detection";
pub const QUIT_KEY: char = 'q';
pub const KEY_POLL_MS: u64 = 1;

/// Alert fires when males exceed this count and at least
/// `ALERT_MIN_FEMALES` females are present.
pub const ALERT_MALES_ABOVE: u32 = 5;
pub const ALERT_MIN_FEMALES: u32 = 1;

pub const SETTINGS_DIR_NAME: &str = "FaceTally";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
