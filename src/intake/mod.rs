//! Scan intake: collaborators and the frame state machine.

pub mod decoder;
pub mod machine;
pub mod repository;
pub mod vision;

pub use decoder::{ImageQrDecoder, LocalDecoder, TextPayloadDecoder};
pub use machine::{
    DEFAULT_VISION_TIMEOUT, FrameFailure, FrameOutcome, IntakeConfig, IntakeError, ScanIntake,
};
pub use repository::{InMemoryScanRepository, RepoError, ScanRepository};
pub use vision::{
    DEFAULT_VISION_MODEL, DisabledVisionAnalyzer, HttpVisionAnalyzer, VisionAnalyzer,
    VisionError, VisionReply, VisionRequest, VisionUsage,
};
