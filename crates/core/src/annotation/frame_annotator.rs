use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::annotation::font::draw_text;
use crate::pipeline::frame_analyzer::FrameReport;
use crate::pipeline::frame_tally::AlertRule;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

pub const OVERLAY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const ALERT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

pub const TEXT_SCALE: u32 = 2;
pub const ALERT_SCALE: u32 = 3;
pub const BOX_STROKE: u32 = 2;

const TALLY_X: i32 = 10;
const MALE_LINE_Y: i32 = 30;
const FEMALE_LINE_Y: i32 = 60;
const RATIO_LINE_Y: i32 = 90;
const ALERT_LINE_Y: i32 = 120;
const LABEL_OFFSET: i32 = 10;

/// Baseline for a face label: above the box, or just inside it when the
/// box is too close to the top edge.
pub fn label_baseline(top: i32) -> i32 {
    let above = top - LABEL_OFFSET;
    if above > LABEL_OFFSET {
        above
    } else {
        top + LABEL_OFFSET
    }
}

/// Draws face boxes, labels, tally lines and the alert onto a frame.
pub struct FrameAnnotator {
    alert: AlertRule,
}

impl FrameAnnotator {
    pub fn new(alert: AlertRule) -> Self {
        Self { alert }
    }

    pub fn annotate(
        &self,
        frame: Frame,
        report: &FrameReport,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        let index = frame.index();
        let mut image = frame.into_rgb_image()?;

        for (face, classification) in &report.faces {
            draw_face_box(&mut image, face);
            draw_text(
                &mut image,
                face.left,
                label_baseline(face.top),
                &classification.label_text(),
                OVERLAY_COLOR,
                TEXT_SCALE,
            );
        }

        let tally = &report.tally;
        let lines = [
            (format!("Males in frame: {}", tally.male), MALE_LINE_Y),
            (format!("Females in frame: {}", tally.female), FEMALE_LINE_Y),
            (format!("Male/Female Ratio: {:.2}", tally.ratio()), RATIO_LINE_Y),
        ];
        for (text, y) in &lines {
            draw_text(&mut image, TALLY_X, *y, text, OVERLAY_COLOR, TEXT_SCALE);
        }

        if self.alert.triggered(tally) {
            draw_text(
                &mut image,
                TALLY_X,
                ALERT_LINE_Y,
                &self.alert.message(),
                ALERT_COLOR,
                ALERT_SCALE,
            );
        }

        Ok(Frame::from_rgb_image(image, index))
    }
}

fn draw_face_box(image: &mut RgbImage, face: &FaceBox) {
    for inset in 0..BOX_STROKE as i32 {
        let w = face.width() - 2 * inset;
        let h = face.height() - 2 * inset;
        if w <= 0 || h <= 0 {
            break;
        }
        let rect = Rect::at(face.left + inset, face.top + inset).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(image, rect, OVERLAY_COLOR);
    }
}
