//! Closed classification enums shared by the intake pipeline.

use serde::{Deserialize, Serialize};

/// Camera-side state of a single frame-processing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraState {
    Searching,
    Analyzing,
    Found,
    Error,
}

impl CameraState {
    pub fn display_name(self) -> &'static str {
        match self {
            CameraState::Searching => "Searching",
            CameraState::Analyzing => "Analyzing",
            CameraState::Found => "Found",
            CameraState::Error => "Error",
        }
    }

    /// `Found` and `Error` end the current cycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, CameraState::Found | CameraState::Error)
    }

    pub fn can_transition_to(self, next: CameraState) -> bool {
        matches!(
            (self, next),
            (CameraState::Searching, CameraState::Analyzing)
                | (CameraState::Analyzing, CameraState::Searching)
                | (CameraState::Analyzing, CameraState::Found)
                | (CameraState::Analyzing, CameraState::Error)
        )
    }
}

/// What a decoded frame logically contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanIntent {
    NoUuidNoDataIntake,
    UuidFoundNoDataIntake,
    UuidAndDataFound,
    InvalidScan,
}

impl ScanIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanIntent::NoUuidNoDataIntake => "no_uuid_no_data_intake",
            ScanIntent::UuidFoundNoDataIntake => "uuid_found_no_data_intake",
            ScanIntent::UuidAndDataFound => "uuid_and_data_found",
            ScanIntent::InvalidScan => "invalid_scan",
        }
    }
}

/// Lifecycle of the call to the vision collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisionResponseState {
    Idle,
    Responding,
    Complete,
    Error,
}

impl VisionResponseState {
    pub fn display_name(self) -> &'static str {
        match self {
            VisionResponseState::Idle => "Idle",
            VisionResponseState::Responding => "Responding",
            VisionResponseState::Complete => "Complete",
            VisionResponseState::Error => "Error",
        }
    }

    pub fn can_transition_to(self, next: VisionResponseState) -> bool {
        matches!(
            (self, next),
            (VisionResponseState::Idle, VisionResponseState::Responding)
                | (VisionResponseState::Responding, VisionResponseState::Complete)
                | (VisionResponseState::Responding, VisionResponseState::Error)
        )
    }
}
