//! Structured scan records produced by the intake pipeline.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::types::{CameraState, VisionResponseState};

/// Descriptive label data read off a parcel by the vision collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelFields {
    pub tracking_number: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub phone_number: Option<String>,
    /// Deliver-by instant, RFC 3339 on the wire.
    #[serde(with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub notes: Option<String>,
}

impl LabelFields {
    /// A label is usable once it names either where it goes or how it is tracked.
    pub fn has_descriptive_data(&self) -> bool {
        is_present(self.address.as_deref()) || is_present(self.tracking_number.as_deref())
    }
}

/// Result of one frame-processing cycle, as cached and handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub uuid: Option<Uuid>,
    pub camera_state: CameraState,
    pub vision_state: VisionResponseState,
    #[serde(flatten)]
    pub fields: LabelFields,
}

impl ScanResponse {
    pub fn found(uuid: Uuid, fields: LabelFields) -> Self {
        Self {
            uuid: Some(uuid),
            camera_state: CameraState::Found,
            vision_state: VisionResponseState::Complete,
            fields,
        }
    }

    pub fn error(
        uuid: Option<Uuid>,
        vision_state: VisionResponseState,
        note: impl Into<String>,
    ) -> Self {
        Self {
            uuid,
            camera_state: CameraState::Error,
            vision_state,
            fields: LabelFields {
                notes: Some(note.into()),
                ..LabelFields::default()
            },
        }
    }

    pub fn tracking_number(&self) -> Option<&str> {
        self.fields.tracking_number.as_deref()
    }
}

fn is_present(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
