use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;
use serde::{Deserialize, Serialize};

use crate::shared::face_box::FaceBox;
use crate::shared::frame::{Frame, CHANNELS};

/// Channel order the classifier was trained on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    Rgb,
    /// OpenCV-trained models see blue first.
    #[default]
    Bgr,
}

/// Turns a face box into the classifier's input batch.
///
/// Crops are taken from the box clipped to the frame; crops below
/// `min_size` in either dimension are rejected as detector noise.
#[derive(Clone, Debug)]
pub struct FacePreprocessor {
    input_size: u32,
    min_size: u32,
    channel_order: ChannelOrder,
}

impl FacePreprocessor {
    pub fn new(input_size: u32, min_size: u32, channel_order: ChannelOrder) -> Self {
        Self {
            input_size,
            min_size,
            channel_order,
        }
    }

    /// Crops `face` out of `frame`, or `None` when the clipped crop is too small.
    pub fn crop(&self, frame: &Frame, face: &FaceBox) -> Option<RgbImage> {
        let clipped = face.clip(frame.width(), frame.height());
        let crop_w = clipped.width() as u32;
        let crop_h = clipped.height() as u32;
        if crop_w < self.min_size || crop_h < self.min_size {
            return None;
        }

        let stride = frame.width() as usize * CHANNELS;
        let row_len = crop_w as usize * CHANNELS;
        let data = frame.data();
        let mut pixels = Vec::with_capacity(row_len * crop_h as usize);
        for y in clipped.top as usize..clipped.bottom as usize {
            let start = y * stride + clipped.left as usize * CHANNELS;
            pixels.extend_from_slice(&data[start..start + row_len]);
        }

        RgbImage::from_raw(crop_w, crop_h, pixels)
    }

    /// Resizes a crop to `input_size²` and normalizes it to a `[1, S, S, 3]` batch.
    pub fn to_batch(&self, crop: &RgbImage) -> Array4<f32> {
        let size = self.input_size;
        let resized = imageops::resize(crop, size, size, FilterType::Triangle);

        let s = size as usize;
        let mut batch = Array4::<f32>::zeros((1, s, s, CHANNELS));
        for (x, y, pixel) in resized.enumerate_pixels() {
            let [r, g, b] = pixel.0;
            let ordered = match self.channel_order {
                ChannelOrder::Rgb => [r, g, b],
                ChannelOrder::Bgr => [b, g, r],
            };
            for (c, value) in ordered.iter().enumerate() {
                batch[[0, y as usize, x as usize, c]] = *value as f32 / 255.0;
            }
        }
        batch
    }
}
