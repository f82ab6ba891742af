use std::path::PathBuf;
use std::process;

use clap::Parser;

use facetally_core::annotation::frame_annotator::FrameAnnotator;
use facetally_core::classification::domain::face_preprocessor::FacePreprocessor;
use facetally_core::classification::infrastructure::onnx_gender_classifier::OnnxGenderClassifier;
use facetally_core::detection::infrastructure::onnx_yolo_locator::OnnxYoloLocator;
use facetally_core::display::domain::display_sink::DisplaySink;
use facetally_core::display::infrastructure::headless_sink::HeadlessSink;
use facetally_core::display::infrastructure::highgui_window::HighguiWindow;
use facetally_core::pipeline::capture_loop_use_case::{CaptureLoopUseCase, StopReason};
use facetally_core::pipeline::frame_analyzer::FrameAnalyzer;
use facetally_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facetally_core::shared::constants::{DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL};
use facetally_core::shared::model_resolver;
use facetally_core::shared::settings::PipelineSettings;
use facetally_core::video::domain::frame_source::FrameSource;
use facetally_core::video::infrastructure::ffmpeg_source::FfmpegSource;

/// Live webcam face detection with per-frame male/female counts.
#[derive(Parser, Debug)]
#[command(name = "facetally")]
struct Cli {
    /// Gender classifier ONNX model [default: gender_detection.onnx].
    #[arg(long)]
    model: Option<PathBuf>,

    /// Face detector ONNX model (downloaded on first use when omitted).
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Camera index [default: 0].
    #[arg(long)]
    device: Option<u32>,

    /// Explicit capture device string, e.g. "USB Camera" for dshow.
    #[arg(long)]
    device_name: Option<String>,

    /// Requested capture width [default: 1280].
    #[arg(long)]
    width: Option<u32>,

    /// Requested capture height [default: 720].
    #[arg(long)]
    height: Option<u32>,

    /// Replay a video file instead of opening the camera.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Run without a window until the input file ends.
    #[arg(long, requires = "input")]
    headless: bool,

    /// Face detection confidence threshold (0.0-1.0) [default: 0.5].
    #[arg(long)]
    confidence: Option<f64>,

    /// JSON settings file [default: <config dir>/FaceTally/settings.json].
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    let analyzer = build_analyzer(&settings)?;
    let source = build_source(&cli, &settings);
    let sink = build_sink(&cli, &settings)?;

    let mut use_case = CaptureLoopUseCase::new(
        source,
        analyzer,
        FrameAnnotator::new(settings.alert),
        sink,
        Box::new(StdoutPipelineLogger::default()),
        settings.quit_key,
        settings.key_poll_ms,
    );
    let outcome = use_case.execute()?;

    match outcome.stop {
        StopReason::QuitKey => log::info!("Quit after {} frames", outcome.frames),
        StopReason::EndOfStream => log::info!("Input ended after {} frames", outcome.frames),
    }
    Ok(())
}

fn load_settings(cli: &Cli) -> Result<PipelineSettings, Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => PipelineSettings::load(path)?,
        None => PipelineSettings::load_or_default()?,
    };
    apply_overrides(cli, &mut settings);
    settings.validate()?;
    Ok(settings)
}

fn apply_overrides(cli: &Cli, settings: &mut PipelineSettings) {
    if let Some(model) = &cli.model {
        settings.classifier_model = model.clone();
    }
    if let Some(model) = &cli.detector_model {
        settings.detector_model = Some(model.clone());
    }
    if let Some(index) = cli.device {
        settings.camera.index = index;
    }
    if let Some(name) = &cli.device_name {
        settings.camera.device_name = Some(name.clone());
    }
    if let Some(width) = cli.width {
        settings.camera.width = width;
    }
    if let Some(height) = cli.height {
        settings.camera.height = height;
    }
    if let Some(confidence) = cli.confidence {
        settings.detector_confidence = confidence;
    }
}

fn build_analyzer(settings: &PipelineSettings) -> Result<FrameAnalyzer, Box<dyn std::error::Error>> {
    // Classifier first: a missing model should fail before any download.
    let classifier = OnnxGenderClassifier::new(&settings.classifier_model)?;

    let detector_path = match &settings.detector_model {
        Some(path) => model_resolver::resolve_local(path)?,
        None => {
            log::info!("Resolving model: {DETECTOR_MODEL_NAME}");
            let path = model_resolver::resolve(
                DETECTOR_MODEL_NAME,
                DETECTOR_MODEL_URL,
                None,
                Some(Box::new(download_progress)),
            )?;
            eprintln!();
            path
        }
    };
    let locator = OnnxYoloLocator::new(&detector_path, settings.detector_confidence)?;

    let preprocessor = FacePreprocessor::new(
        settings.classifier_input_size,
        settings.min_face_size,
        settings.channel_order,
    );
    Ok(FrameAnalyzer::new(
        Box::new(locator),
        Box::new(classifier),
        preprocessor,
    ))
}

fn build_source(cli: &Cli, settings: &PipelineSettings) -> Box<dyn FrameSource> {
    match &cli.input {
        Some(path) => Box::new(FfmpegSource::file(path)),
        None => Box::new(FfmpegSource::camera(settings.camera.clone())),
    }
}

fn build_sink(
    cli: &Cli,
    settings: &PipelineSettings,
) -> Result<Box<dyn DisplaySink>, Box<dyn std::error::Error>> {
    if cli.headless {
        Ok(Box::new(HeadlessSink::new()))
    } else {
        Ok(Box::new(HighguiWindow::new(&settings.window_title)?))
    }
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
