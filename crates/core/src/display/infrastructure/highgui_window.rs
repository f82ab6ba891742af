use opencv::core::{AlgorithmHint, Mat};
use opencv::{highgui, imgproc};
use opencv::prelude::*;
use thiserror::Error;

use crate::display::domain::display_sink::DisplaySink;
use crate::shared::frame::{Frame, CHANNELS};

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("failed to create window '{title}': {source}")]
    Window {
        title: String,
        #[source]
        source: opencv::Error,
    },
    #[error("failed to convert frame for display: {0}")]
    Convert(#[source] opencv::Error),
    #[error("failed to show frame: {0}")]
    Show(#[source] opencv::Error),
    #[error("failed to read keyboard: {0}")]
    Key(#[source] opencv::Error),
}

/// An OpenCV HighGUI window.
///
/// Frames arrive as RGB and are converted to OpenCV's BGR in a reused
/// buffer before `imshow`.
pub struct HighguiWindow {
    title: String,
    bgr: Mat,
    open: bool,
}

impl HighguiWindow {
    pub fn new(title: &str) -> Result<Self, DisplayError> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE).map_err(|e| {
            DisplayError::Window {
                title: title.to_string(),
                source: e,
            }
        })?;
        log::info!("Opened display window '{title}'");
        Ok(Self {
            title: title.to_string(),
            bgr: Mat::default(),
            open: true,
        })
    }
}

impl DisplaySink for HighguiWindow {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        rgb_to_bgr(frame, &mut self.bgr)?;
        highgui::imshow(&self.title, &self.bgr).map_err(DisplayError::Show)?;
        Ok(())
    }

    fn poll_key(&mut self, timeout_ms: u64) -> Result<Option<char>, Box<dyn std::error::Error>> {
        let delay = timeout_ms.clamp(1, i32::MAX as u64) as i32;
        let code = highgui::wait_key(delay).map_err(DisplayError::Key)?;
        Ok(key_from_code(code))
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Err(e) = highgui::destroy_window(&self.title) {
            log::warn!("Failed to destroy window '{}': {e}", self.title);
        }
    }
}

impl Drop for HighguiWindow {
    fn drop(&mut self) {
        self.close();
    }
}

/// Maps a `wait_key` result to a character using its low byte.
fn key_from_code(code: i32) -> Option<char> {
    if code < 0 {
        None
    } else {
        Some(char::from((code & 0xFF) as u8))
    }
}

/// Converts an RGB frame into `dst`, which is reallocated only when the
/// frame size changes.
fn rgb_to_bgr(frame: &Frame, dst: &mut Mat) -> Result<(), DisplayError> {
    let rows = frame.height() as i32;
    let row_bytes = (frame.width() as usize * CHANNELS) as i32;
    let packed = Mat::new_rows_cols_with_data(rows, row_bytes, frame.data())
        .map_err(DisplayError::Convert)?;
    let rgb = packed
        .reshape(CHANNELS as i32, rows)
        .map_err(DisplayError::Convert)?;
    imgproc::cvt_color(
        &*rgb,
        dst,
        imgproc::COLOR_RGB2BGR,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )
    .map_err(DisplayError::Convert)
}
