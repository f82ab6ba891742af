/// A face bounding box in frame-pixel space, as returned by a face locator.
///
/// Coordinates follow the `(left, top, right, bottom)` convention with
/// `right`/`bottom` exclusive. Boxes are not tracked across frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    /// Locator detection score; informational only.
    pub score: f32,
}

impl FaceBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
            score: 1.0,
        }
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    /// Clamps the box to a `frame_width × frame_height` frame.
    ///
    /// A box lying fully outside the frame collapses to zero area.
    pub fn clip(&self, frame_width: u32, frame_height: u32) -> FaceBox {
        let fw = frame_width as i32;
        let fh = frame_height as i32;
        let left = self.left.clamp(0, fw);
        let top = self.top.clamp(0, fh);
        FaceBox {
            left,
            top,
            right: self.right.clamp(left, fw),
            bottom: self.bottom.clamp(top, fh),
            score: self.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    // ── Geometry ─────────────────────────────────────────────────────

    #[test]
    fn test_width_and_height() {
        let b = FaceBox::new(10, 20, 110, 70);
        assert_eq!(b.width(), 100);
        assert_eq!(b.height(), 50);
    }

    #[test]
    fn test_inverted_box_has_zero_size() {
        let b = FaceBox::new(50, 50, 40, 30);
        assert_eq!(b.width(), 0);
        assert_eq!(b.height(), 0);
    }

    #[test]
    fn test_with_score_keeps_coordinates() {
        let b = FaceBox::new(1, 2, 3, 4).with_score(0.75);
        assert_eq!((b.left, b.top, b.right, b.bottom), (1, 2, 3, 4));
        assert_relative_eq!(b.score, 0.75);
    }

    // ── Clipping ─────────────────────────────────────────────────────

    #[rstest]
    #[case::inside(FaceBox::new(10, 10, 50, 50), (10, 10, 50, 50))]
    #[case::left_edge(FaceBox::new(-20, 10, 30, 50), (0, 10, 30, 50))]
    #[case::bottom_right(FaceBox::new(80, 60, 140, 120), (80, 60, 100, 80))]
    #[case::fully_outside(FaceBox::new(150, 150, 200, 200), (100, 80, 100, 80))]
    fn test_clip(#[case] input: FaceBox, #[case] expected: (i32, i32, i32, i32)) {
        let c = input.clip(100, 80);
        assert_eq!((c.left, c.top, c.right, c.bottom), expected);
    }

    #[test]
    fn test_clip_preserves_score() {
        let c = FaceBox::new(-5, -5, 10, 10).with_score(0.4).clip(100, 100);
        assert_relative_eq!(c.score, 0.4);
    }
}
