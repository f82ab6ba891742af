use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::settings::CameraSettings;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("capture backend '{0}' is not available in this ffmpeg build")]
    BackendUnavailable(String),
    #[error("a capture device name is required on this platform")]
    DeviceNameRequired,
    #[error("failed to open {location}: {source}")]
    Open {
        location: String,
        #[source]
        source: ffmpeg_next::Error,
    },
    #[error("{0} has no video stream")]
    NoVideoStream(String),
    #[error("frame source is not open")]
    NotOpened,
    #[error("capture stream from {0} ended")]
    StreamEnded(String),
    #[error("failed to decode frame: {0}")]
    Decode(#[source] ffmpeg_next::Error),
}

enum SourceKind {
    Camera(CameraSettings),
    File(PathBuf),
}

/// Captures frames via ffmpeg-next: a webcam through libavdevice, or a
/// recorded file through libavformat.
///
/// Each decoded frame is converted to RGB24 and wrapped in a [`Frame`].
pub struct FfmpegSource {
    kind: SourceKind,
    state: Option<OpenSource>,
}

// Safety: FfmpegSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegSource {}

impl FfmpegSource {
    /// Live capture from the platform camera backend.
    pub fn camera(settings: CameraSettings) -> Self {
        Self {
            kind: SourceKind::Camera(settings),
            state: None,
        }
    }

    /// Replays a video file through the same decode path.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: SourceKind::File(path.into()),
            state: None,
        }
    }

    fn is_live(&self) -> bool {
        matches!(self.kind, SourceKind::Camera(_))
    }
}

impl FrameSource for FfmpegSource {
    fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let (ictx, location) = match &self.kind {
            SourceKind::Camera(settings) => open_camera(settings)?,
            SourceKind::File(path) => {
                let location = path.display().to_string();
                let ictx = ffmpeg_next::format::input(path).map_err(|e| SourceError::Open {
                    location: location.clone(),
                    source: e,
                })?;
                (ictx, location)
            }
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| SourceError::NoVideoStream(location.clone()))?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let metadata = VideoMetadata {
            width: decoder.width(),
            height: decoder.height(),
            fps,
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source: location.clone(),
        };
        log::info!(
            "Opened {location}: {}x{} @ {:.1} fps ({})",
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.codec
        );

        self.state = Some(OpenSource {
            ictx,
            decoder,
            scaler: None,
            stream_index,
            location,
            frame_index: 0,
            flushing: false,
        });
        Ok(metadata)
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let live = self.is_live();
        let state = self.state.as_mut().ok_or(SourceError::NotOpened)?;

        loop {
            if let Some(frame) = state.try_receive()? {
                return Ok(Some(frame));
            }
            if state.flushing {
                return if live {
                    Err(Box::new(SourceError::StreamEnded(state.location.clone())))
                } else {
                    Ok(None)
                };
            }

            match state.ictx.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() != state.stream_index {
                        continue;
                    }
                    if let Err(e) = state.decoder.send_packet(&packet) {
                        log::debug!("Skipping undecodable packet: {e}");
                    }
                }
                None => {
                    let _ = state.decoder.send_eof();
                    state.flushing = true;
                }
            }
        }
    }

    fn close(&mut self) {
        if let Some(state) = self.state.take() {
            log::info!("Released {}", state.location);
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.close();
    }
}

struct OpenSource {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: Option<Scaler>,
    stream_index: usize,
    location: String,
    frame_index: usize,
    flushing: bool,
}

/// RGB24 converter keyed by the input geometry it was built for.
///
/// Some webcam decoders only report their pixel format once the first
/// frame arrives, so the scaler is built lazily and rebuilt on change.
struct Scaler {
    context: ffmpeg_next::software::scaling::Context,
    format: ffmpeg_next::format::Pixel,
    width: u32,
    height: u32,
}

impl OpenSource {
    fn try_receive(&mut self) -> Result<Option<Frame>, SourceError> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let (format, width, height) = (decoded.format(), decoded.width(), decoded.height());
        let stale = self
            .scaler
            .as_ref()
            .map_or(true, |s| s.format != format || s.width != width || s.height != height);
        if stale {
            let context = ffmpeg_next::software::scaling::Context::get(
                format,
                width,
                height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )
            .map_err(SourceError::Decode)?;
            self.scaler = Some(Scaler {
                context,
                format,
                width,
                height,
            });
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        if let Some(scaler) = self.scaler.as_mut() {
            scaler
                .context
                .run(&decoded, &mut rgb_frame)
                .map_err(SourceError::Decode)?;
        }

        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        let frame = Frame::new(pixels, width, height, self.frame_index);
        self.frame_index += 1;
        Ok(Some(frame))
    }
}

// ---------------------------------------------------------------------------
// Camera device selection
// ---------------------------------------------------------------------------

/// Platform capture backend name and the device string to open with it.
fn platform_device(settings: &CameraSettings) -> Result<(&'static str, String), SourceError> {
    #[cfg(target_os = "linux")]
    {
        Ok((
            "video4linux2",
            settings
                .device_name
                .clone()
                .unwrap_or_else(|| format!("/dev/video{}", settings.index)),
        ))
    }
    #[cfg(target_os = "macos")]
    {
        Ok((
            "avfoundation",
            settings
                .device_name
                .clone()
                .unwrap_or_else(|| settings.index.to_string()),
        ))
    }
    #[cfg(target_os = "windows")]
    {
        settings
            .device_name
            .as_ref()
            .map(|name| ("dshow", format!("video={name}")))
            .ok_or(SourceError::DeviceNameRequired)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        let _ = settings;
        Err(SourceError::BackendUnavailable(
            std::env::consts::OS.to_string(),
        ))
    }
}

fn find_input_format(name: &str) -> Option<ffmpeg_next::format::format::Input> {
    ffmpeg_next::device::input::video().find(|fmt| fmt.name().split(',').any(|n| n == name))
}

/// Opens the camera at the requested size, falling back to the device default.
fn open_camera(
    settings: &CameraSettings,
) -> Result<(ffmpeg_next::format::context::Input, String), SourceError> {
    ffmpeg_next::device::register_all();
    let (backend, device) = platform_device(settings)?;

    let requested = format!("{}x{}", settings.width, settings.height);
    let mut options = capture_options();
    options.set("video_size", &requested);

    match open_device(backend, &device, options) {
        Ok(ictx) => Ok((ictx, device)),
        Err(SourceError::Open { source, .. }) => {
            log::warn!(
                "Could not open {device} at {requested}: {source}. Using device default."
            );
            open_device(backend, &device, capture_options()).map(|ictx| (ictx, device))
        }
        Err(e) => Err(e),
    }
}

fn capture_options() -> ffmpeg_next::Dictionary<'static> {
    let mut options = ffmpeg_next::Dictionary::new();
    // avfoundation refuses to start without an explicit rate
    if cfg!(target_os = "macos") {
        options.set("framerate", "30");
    }
    options
}

fn open_device(
    backend: &str,
    device: &str,
    options: ffmpeg_next::Dictionary,
) -> Result<ffmpeg_next::format::context::Input, SourceError> {
    let format = find_input_format(backend)
        .ok_or_else(|| SourceError::BackendUnavailable(backend.to_string()))?;
    let open_err = |e| SourceError::Open {
        location: device.to_string(),
        source: e,
    };

    match ffmpeg_next::format::open_with(
        &PathBuf::from(device),
        &ffmpeg_next::format::format::Format::Input(format),
        options,
    )
    .map_err(open_err)?
    {
        ffmpeg_next::format::context::Context::Input(ictx) => Ok(ictx),
        ffmpeg_next::format::context::Context::Output(_) => {
            Err(open_err(ffmpeg_next::Error::InvalidData))
        }
    }
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_len = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in 0..height as usize {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_len]);
    }
    pixels
}
