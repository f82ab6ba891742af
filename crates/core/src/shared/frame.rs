use image::RgbImage;
use ndarray::ArrayView3;

/// A single captured frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the pipeline
/// treats pixel data as opaque until it is annotated.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

/// Frames are always three-channel RGB.
pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    /// Wraps an annotated image back into a frame with the given index.
    pub fn from_rgb_image(image: RgbImage, index: usize) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, index)
    }

    /// Converts the frame into an `image` buffer for drawing.
    pub fn into_rgb_image(self) -> Result<RgbImage, Box<dyn std::error::Error>> {
        RgbImage::from_raw(self.width, self.height, self.data)
            .ok_or_else(|| "Frame data length does not match its dimensions".into())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (self.height as usize, self.width as usize, CHANNELS)
    }
}
