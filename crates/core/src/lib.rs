pub mod blink {
    pub mod domain {
        pub mod blink_event;
        pub mod blink_state_machine;
        pub mod eye_aspect_ratio;
        pub mod eye_state;
        pub mod face_blink_state;
    }
}

pub mod detection {
    pub mod domain {
        pub mod detected_face;
        pub mod landmark_detector;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod event_sink;
    pub mod face_detection_processor;
    pub mod frame_throttle;
    pub mod infrastructure {
        pub mod channel_event_sink;
        pub mod threaded_frame_worker;
    }
    pub mod pipeline_logger;
    pub mod processor_chain;
    pub mod processor_config;
}

pub mod shared {
    pub mod constants;
    pub mod error;
    pub mod frame;
    pub mod point;
}
