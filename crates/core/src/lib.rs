//! Live face detection, gender classification and per-frame tallying.

pub mod annotation {
    pub mod font;
    pub mod frame_annotator;
}

pub mod classification {
    pub mod domain {
        pub mod face_preprocessor;
        pub mod gender;
        pub mod gender_classifier;
    }
    pub mod infrastructure {
        pub mod onnx_gender_classifier;
    }
}

pub mod detection {
    pub mod domain {
        pub mod face_locator;
    }
    pub mod infrastructure;
}

pub mod display {
    pub mod domain {
        pub mod display_sink;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod capture_loop_use_case;
    pub mod frame_analyzer;
    pub mod frame_tally;
    pub mod pipeline_logger;
}

pub mod shared {
    pub mod constants;
    pub mod execution_provider;
    pub mod face_box;
    pub mod frame;
    pub mod model_resolver;
    pub mod settings;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod frame_source;
    }
    pub mod infrastructure {
        pub mod ffmpeg_source;
    }
}
