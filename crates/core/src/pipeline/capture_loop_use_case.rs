use std::time::Instant;

use crate::annotation::frame_annotator::FrameAnnotator;
use crate::display::domain::display_sink::DisplaySink;
use crate::pipeline::frame_analyzer::FrameAnalyzer;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::video::domain::frame_source::FrameSource;

/// Why the capture loop stopped without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    QuitKey,
    /// A finite source (file replay) ran out of frames.
    EndOfStream,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub frames: usize,
    pub stop: StopReason,
}

/// Releases the source when dropped, whichever way the loop exits.
struct SourceGuard<'a> {
    source: &'a mut dyn FrameSource,
}

impl Drop for SourceGuard<'_> {
    fn drop(&mut self) {
        self.source.close();
    }
}

/// Read → analyze → annotate → show → poll, until quit or end of stream.
///
/// Any error from the source, the locator or the classifier ends the loop
/// and is returned after the source has been released.
pub struct CaptureLoopUseCase {
    source: Box<dyn FrameSource>,
    analyzer: FrameAnalyzer,
    annotator: FrameAnnotator,
    sink: Box<dyn DisplaySink>,
    logger: Box<dyn PipelineLogger>,
    quit_key: char,
    key_poll_ms: u64,
}

impl CaptureLoopUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        analyzer: FrameAnalyzer,
        annotator: FrameAnnotator,
        sink: Box<dyn DisplaySink>,
        logger: Box<dyn PipelineLogger>,
        quit_key: char,
        key_poll_ms: u64,
    ) -> Self {
        Self {
            source,
            analyzer,
            annotator,
            sink,
            logger,
            quit_key,
            key_poll_ms,
        }
    }

    pub fn execute(&mut self) -> Result<CaptureOutcome, Box<dyn std::error::Error>> {
        let result = self.run();
        self.sink.close();
        self.logger.summary();
        result
    }

    fn run(&mut self) -> Result<CaptureOutcome, Box<dyn std::error::Error>> {
        let mut guard = SourceGuard {
            source: self.source.as_mut(),
        };
        let metadata = guard.source.open()?;
        self.logger.info(&format!(
            "Capturing {}x{} {} from {}",
            metadata.width, metadata.height, metadata.codec, metadata.source
        ));

        let mut frames = 0;
        let stop = loop {
            let t0 = Instant::now();
            let Some(frame) = guard.source.next_frame()? else {
                break StopReason::EndOfStream;
            };
            self.logger.timing("read", ms_since(t0));

            let report = self.analyzer.analyze(&frame, self.logger.as_mut())?;

            let t0 = Instant::now();
            let annotated = self.annotator.annotate(frame, &report)?;
            self.logger.timing("annotate", ms_since(t0));

            let t0 = Instant::now();
            self.sink.show(&annotated)?;
            let key = self.sink.poll_key(self.key_poll_ms)?;
            self.logger.timing("display", ms_since(t0));

            frames += 1;
            self.logger.progress(frames);

            if key == Some(self.quit_key) {
                break StopReason::QuitKey;
            }
        };
        drop(guard);

        self.logger.info(&format!("Stopped after {frames} frames ({stop:?})"));
        Ok(CaptureOutcome { frames, stop })
    }
}

fn ms_since(t0: Instant) -> f64 {
    t0.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::gender_classifier::GenderClassifier;
    use crate::detection::domain::face_locator::FaceLocator;
    use crate::pipeline::frame_analyzer::tests::{
        blank_frame, preprocessor, three_faces, StubClassifier, StubLocator,
    };
    use crate::pipeline::frame_tally::AlertRule;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::face_box::FaceBox;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    #[derive(Default)]
    struct SourceLog {
        opens: usize,
        closes: usize,
        reads: usize,
    }

    /// Yields `frames` blank frames, then either ends or fails.
    struct StubSource {
        log: Arc<Mutex<SourceLog>>,
        frames: usize,
        fail_open: bool,
        fail_after: Option<usize>,
        endless: bool,
    }

    impl StubSource {
        fn new(frames: usize) -> (Self, Arc<Mutex<SourceLog>>) {
            let log = Arc::new(Mutex::new(SourceLog::default()));
            let source = Self {
                log: log.clone(),
                frames,
                fail_open: false,
                fail_after: None,
                endless: false,
            };
            (source, log)
        }

        fn endless() -> (Self, Arc<Mutex<SourceLog>>) {
            let (mut source, log) = Self::new(0);
            source.endless = true;
            (source, log)
        }
    }

    impl FrameSource for StubSource {
        fn open(&mut self) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            self.log.lock().unwrap().opens += 1;
            if self.fail_open {
                return Err("camera unavailable".into());
            }
            Ok(VideoMetadata {
                width: 640,
                height: 480,
                fps: 30.0,
                codec: "rawvideo".to_string(),
                source: "stub".to_string(),
            })
        }

        fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
            let mut log = self.log.lock().unwrap();
            let index = log.reads;
            log.reads += 1;
            if self.fail_after == Some(index) {
                return Err("frame grab failed".into());
            }
            if self.endless || index < self.frames {
                let blank = blank_frame(640, 480);
                Ok(Some(Frame::new(blank.data().to_vec(), 640, 480, index)))
            } else {
                Ok(None)
            }
        }

        fn close(&mut self) {
            self.log.lock().unwrap().closes += 1;
        }
    }

    /// Records shown frames and replays scripted keys, one per poll.
    struct StubSink {
        shown: Arc<Mutex<Vec<Frame>>>,
        keys: Vec<Option<char>>,
        polls: usize,
    }

    impl StubSink {
        fn new(keys: Vec<Option<char>>) -> (Self, Arc<Mutex<Vec<Frame>>>) {
            let shown = Arc::new(Mutex::new(Vec::new()));
            let sink = Self {
                shown: shown.clone(),
                keys,
                polls: 0,
            };
            (sink, shown)
        }
    }

    impl DisplaySink for StubSink {
        fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.shown.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn poll_key(&mut self, _timeout_ms: u64) -> Result<Option<char>, Box<dyn std::error::Error>> {
            let key = self.keys.get(self.polls).copied().flatten();
            self.polls += 1;
            Ok(key)
        }

        fn close(&mut self) {}
    }

    /// Captures metrics so tests can read per-frame counts.
    struct RecordingLogger {
        metrics: Arc<Mutex<HashMap<String, Vec<f64>>>>,
    }

    impl PipelineLogger for RecordingLogger {
        fn progress(&mut self, _frames: usize) {}
        fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
        fn metric(&mut self, name: &str, value: f64) {
            self.metrics
                .lock()
                .unwrap()
                .entry(name.to_string())
                .or_default()
                .push(value);
        }
        fn info(&mut self, _message: &str) {}
    }

    struct FailingClassifier;

    impl GenderClassifier for FailingClassifier {
        fn scores(
            &mut self,
            _batch: ndarray::Array4<f32>,
        ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
            Err("inference failed".into())
        }
    }

    // --- Helpers ---

    fn analyzer(
        locator: impl FaceLocator + 'static,
        classifier: impl GenderClassifier + 'static,
    ) -> FrameAnalyzer {
        FrameAnalyzer::new(Box::new(locator), Box::new(classifier), preprocessor())
    }

    fn use_case(
        source: StubSource,
        analyzer: FrameAnalyzer,
        sink: StubSink,
        logger: Box<dyn PipelineLogger>,
    ) -> CaptureLoopUseCase {
        CaptureLoopUseCase::new(
            Box::new(source),
            analyzer,
            FrameAnnotator::new(AlertRule::default()),
            Box::new(sink),
            logger,
            'q',
            1,
        )
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * frame.width() + x) * 3) as usize;
        [frame.data()[i], frame.data()[i + 1], frame.data()[i + 2]]
    }

    // --- Tests ---

    #[test]
    fn test_three_faces_end_to_end() {
        let (source, source_log) = StubSource::new(1);
        let (sink, shown) = StubSink::new(Vec::new());
        let metrics = Arc::new(Mutex::new(HashMap::new()));
        let logger = RecordingLogger {
            metrics: metrics.clone(),
        };
        let classifier = StubClassifier::new(vec![
            vec![0.9, 0.1],
            vec![0.9, 0.1],
            vec![0.2, 0.8],
        ]);

        let outcome = use_case(
            source,
            analyzer(StubLocator(three_faces()), classifier),
            sink,
            Box::new(logger),
        )
        .execute()
        .unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome {
                frames: 1,
                stop: StopReason::EndOfStream,
            }
        );
        let metrics = metrics.lock().unwrap();
        assert_eq!(metrics["faces"], vec![3.0]);
        assert_eq!(metrics["males"], vec![2.0]);
        assert_eq!(metrics["females"], vec![1.0]);

        let shown = shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        let frame = &shown[0];
        for face in three_faces() {
            let mid_y = ((face.top + face.bottom) / 2) as u32;
            assert_eq!(pixel(frame, face.left as u32, mid_y), [0, 255, 0]);
            assert_eq!(pixel(frame, (face.right - 1) as u32, mid_y), [0, 255, 0]);
        }
        assert!(!frame.data().chunks_exact(3).any(|p| p == [255, 0, 0]));

        let log = source_log.lock().unwrap();
        assert_eq!((log.opens, log.closes), (1, 1));
    }

    #[test]
    fn test_zero_faces_still_shows_frame() {
        let (source, _) = StubSource::new(2);
        let (sink, shown) = StubSink::new(Vec::new());
        let outcome = use_case(
            source,
            analyzer(StubLocator(Vec::new()), StubClassifier::new(Vec::new())),
            sink,
            Box::new(NullPipelineLogger),
        )
        .execute()
        .unwrap();
        assert_eq!(outcome.frames, 2);
        assert_eq!(shown.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_undersized_face_gets_no_rectangle() {
        let (source, _) = StubSource::new(1);
        let (sink, shown) = StubSink::new(Vec::new());
        let tiny = FaceBox::new(300, 300, 305, 305);
        use_case(
            source,
            analyzer(StubLocator(vec![tiny]), StubClassifier::new(Vec::new())),
            sink,
            Box::new(NullPipelineLogger),
        )
        .execute()
        .unwrap();

        let shown = shown.lock().unwrap();
        for y in 295..310 {
            for x in 295..310 {
                assert_ne!(pixel(&shown[0], x, y), [0, 255, 0]);
            }
        }
    }

    #[test]
    fn test_quit_key_stops_after_display_and_releases_once() {
        let (source, source_log) = StubSource::endless();
        let (sink, shown) = StubSink::new(vec![None, None, Some('q')]);
        let outcome = use_case(
            source,
            analyzer(StubLocator(Vec::new()), StubClassifier::new(Vec::new())),
            sink,
            Box::new(NullPipelineLogger),
        )
        .execute()
        .unwrap();

        assert_eq!(
            outcome,
            CaptureOutcome {
                frames: 3,
                stop: StopReason::QuitKey,
            }
        );
        assert_eq!(shown.lock().unwrap().len(), 3);
        let log = source_log.lock().unwrap();
        assert_eq!(log.reads, 3);
        assert_eq!(log.closes, 1);
    }

    #[test]
    fn test_quit_key_is_case_sensitive() {
        let (source, _) = StubSource::new(3);
        let (sink, _) = StubSink::new(vec![Some('Q'), Some('x'), None]);
        let outcome = use_case(
            source,
            analyzer(StubLocator(Vec::new()), StubClassifier::new(Vec::new())),
            sink,
            Box::new(NullPipelineLogger),
        )
        .execute()
        .unwrap();
        assert_eq!(outcome.stop, StopReason::EndOfStream);
        assert_eq!(outcome.frames, 3);
    }

    #[test]
    fn test_acquisition_error_releases_once_and_propagates() {
        let (mut source, source_log) = StubSource::endless();
        source.fail_after = Some(1);
        let (sink, shown) = StubSink::new(Vec::new());
        let err = use_case(
            source,
            analyzer(StubLocator(Vec::new()), StubClassifier::new(Vec::new())),
            sink,
            Box::new(NullPipelineLogger),
        )
        .execute()
        .unwrap_err();

        assert_eq!(err.to_string(), "frame grab failed");
        assert_eq!(shown.lock().unwrap().len(), 1);
        assert_eq!(source_log.lock().unwrap().closes, 1);
    }

    #[test]
    fn test_open_error_still_releases() {
        let (mut source, source_log) = StubSource::new(1);
        source.fail_open = true;
        let (sink, shown) = StubSink::new(Vec::new());
        let err = use_case(
            source,
            analyzer(StubLocator(Vec::new()), StubClassifier::new(Vec::new())),
            sink,
            Box::new(NullPipelineLogger),
        )
        .execute()
        .unwrap_err();

        assert_eq!(err.to_string(), "camera unavailable");
        assert!(shown.lock().unwrap().is_empty());
        let log = source_log.lock().unwrap();
        assert_eq!((log.reads, log.closes), (0, 1));
    }

    #[test]
    fn test_inference_error_releases_once_and_propagates() {
        let (source, source_log) = StubSource::endless();
        let (sink, shown) = StubSink::new(Vec::new());
        let err = use_case(
            source,
            analyzer(StubLocator(three_faces()), FailingClassifier),
            sink,
            Box::new(NullPipelineLogger),
        )
        .execute()
        .unwrap_err();

        assert_eq!(err.to_string(), "inference failed");
        assert!(shown.lock().unwrap().is_empty());
        assert_eq!(source_log.lock().unwrap().closes, 1);
    }
}
