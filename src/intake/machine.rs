//! Frame-processing state machine.
//!
//! Every frame is an independent cycle: decode locally, pass the admission
//! gate, ask the vision service, then cache and persist a completed scan. No
//! lock on the cache or the admission table is held while the vision call is
//! outstanding.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::admission::{AdmissionController, DEFAULT_COOLDOWN};
use crate::cache::{Cache, CacheProfile, ScopedCache};
use crate::domain::scan::{LabelFields, ScanResponse};
use crate::domain::tracking::{TrackingPrefix, is_well_formed};
use crate::domain::types::{CameraState, ScanIntent, VisionResponseState};
use crate::identity::{IdentifierIssuer, IssueError};

use super::decoder::LocalDecoder;
use super::repository::ScanRepository;
use super::vision::{VisionAnalyzer, VisionRequest, VisionUsage, millis};

const METRIC_SCAN_TOTAL: &str = "courier_intake_scan_total";
const METRIC_VISION_FAILURE_TOTAL: &str = "courier_intake_vision_failure_total";
const METRIC_VISION_LATENCY_MS: &str = "courier_intake_vision_latency_ms";

/// Default bound on a single vision call.
pub const DEFAULT_VISION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Issue(#[from] IssueError),
}

/// Why a cycle ended in [`CameraState::Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameFailure {
    InvalidContent,
    RateLimited,
    VisionFailed,
    VisionTimedOut,
    IdentifierMismatch,
    MissingData,
}

impl FrameFailure {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameFailure::InvalidContent => "invalid_content",
            FrameFailure::RateLimited => "rate_limited",
            FrameFailure::VisionFailed => "vision_failed",
            FrameFailure::VisionTimedOut => "vision_timed_out",
            FrameFailure::IdentifierMismatch => "identifier_mismatch",
            FrameFailure::MissingData => "missing_data",
        }
    }

    fn note(self) -> &'static str {
        match self {
            FrameFailure::InvalidContent => "QR content is not a label identifier",
            FrameFailure::RateLimited => "rate limited",
            FrameFailure::VisionFailed => "vision service failed",
            FrameFailure::VisionTimedOut => "vision service timed out",
            FrameFailure::IdentifierMismatch => "vision service read a different identifier",
            FrameFailure::MissingData => "label carries no address or tracking number",
        }
    }
}

/// Result of one [`ScanIntake::process_frame`] cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameOutcome {
    pub uuid: Option<Uuid>,
    pub intent: ScanIntent,
    pub camera_state: CameraState,
    pub vision_state: VisionResponseState,
    /// Camera states visited, in order.
    pub trail: Vec<CameraState>,
    pub response: Option<ScanResponse>,
    pub failure: Option<FrameFailure>,
    pub usage: Option<VisionUsage>,
    pub persisted: bool,
}

impl FrameOutcome {
    pub fn is_found(&self) -> bool {
        self.camera_state == CameraState::Found
    }
}

/// Tunables for [`ScanIntake`].
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub cooldown: Duration,
    pub vision_timeout: Duration,
    pub tracking_prefix: TrackingPrefix,
    /// Also cache failed cycles under the scan-error profile.
    pub record_errors: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            vision_timeout: DEFAULT_VISION_TIMEOUT,
            tracking_prefix: TrackingPrefix::default(),
            record_errors: false,
        }
    }
}

/// In-flight state of one cycle.
struct Cycle {
    uuid: Option<Uuid>,
    intent: ScanIntent,
    camera: CameraState,
    vision: VisionResponseState,
    trail: Vec<CameraState>,
    usage: Option<VisionUsage>,
}

impl Cycle {
    fn start() -> Self {
        let mut cycle = Self {
            uuid: None,
            intent: ScanIntent::NoUuidNoDataIntake,
            camera: CameraState::Searching,
            vision: VisionResponseState::Idle,
            trail: vec![CameraState::Searching],
            usage: None,
        };
        cycle.camera_to(CameraState::Analyzing);
        cycle
    }

    fn camera_to(&mut self, next: CameraState) {
        debug_assert!(
            self.camera.can_transition_to(next),
            "illegal camera transition {:?} -> {:?}",
            self.camera,
            next
        );
        self.camera = next;
        self.trail.push(next);
    }

    fn vision_to(&mut self, next: VisionResponseState) {
        debug_assert!(
            self.vision.can_transition_to(next),
            "illegal vision transition {:?} -> {:?}",
            self.vision,
            next
        );
        self.vision = next;
    }

    fn finish(
        self,
        response: Option<ScanResponse>,
        failure: Option<FrameFailure>,
        persisted: bool,
    ) -> FrameOutcome {
        debug_assert!(
            self.camera.is_terminal() || self.camera == CameraState::Searching,
            "cycle finished mid-analysis"
        );
        FrameOutcome {
            uuid: self.uuid,
            intent: self.intent,
            camera_state: self.camera,
            vision_state: self.vision,
            trail: self.trail,
            response,
            failure,
            usage: self.usage,
            persisted,
        }
    }
}

/// Sequences the decoder, admission gate, vision service, issuer and cache
/// around a single inbound frame.
pub struct ScanIntake {
    decoder: Arc<dyn LocalDecoder>,
    vision: Arc<dyn VisionAnalyzer>,
    repository: Arc<dyn ScanRepository>,
    admission: AdmissionController,
    issuer: IdentifierIssuer,
    scans: ScopedCache<Uuid, ScanResponse>,
    errors: ScopedCache<Uuid, ScanResponse>,
    config: IntakeConfig,
}

impl ScanIntake {
    pub fn new(
        decoder: Arc<dyn LocalDecoder>,
        vision: Arc<dyn VisionAnalyzer>,
        repository: Arc<dyn ScanRepository>,
        admission: AdmissionController,
        cache: Arc<Cache<Uuid, ScanResponse>>,
        config: IntakeConfig,
    ) -> Self {
        Self {
            decoder,
            vision,
            repository,
            admission,
            issuer: IdentifierIssuer::new(config.tracking_prefix.clone()),
            scans: ScopedCache::new(CacheProfile::SCANS, Arc::clone(&cache)),
            errors: ScopedCache::new(CacheProfile::SCAN_ERRORS, cache),
            config,
        }
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn scans(&self) -> &ScopedCache<Uuid, ScanResponse> {
        &self.scans
    }

    pub fn scan_errors(&self) -> &ScopedCache<Uuid, ScanResponse> {
        &self.errors
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Run one frame through a full cycle.
    ///
    /// Every recoverable problem is reported inside the [`FrameOutcome`]; the
    /// only error is a failure to mint a tracking number.
    #[instrument(skip_all, fields(caller_id = %caller_id, frame_len = frame.len()))]
    pub async fn process_frame(
        &self,
        caller_id: &str,
        frame: Bytes,
    ) -> Result<FrameOutcome, IntakeError> {
        let mut cycle = Cycle::start();

        let Some(content) = self.decoder.decode(&frame) else {
            cycle.camera_to(CameraState::Searching);
            debug!("no QR payload in frame");
            return Ok(self.conclude(cycle, None, None, false));
        };

        let uuid = match Uuid::parse_str(&content) {
            Ok(uuid) if !uuid.is_nil() => uuid,
            _ => {
                cycle.intent = ScanIntent::InvalidScan;
                return Ok(self.fail(cycle, FrameFailure::InvalidContent));
            }
        };
        cycle.uuid = Some(uuid);
        cycle.intent = ScanIntent::UuidFoundNoDataIntake;

        if !self.admission.is_allowed(caller_id, self.config.cooldown) {
            return Ok(self.fail(cycle, FrameFailure::RateLimited));
        }

        cycle.vision_to(VisionResponseState::Responding);
        let request = VisionRequest {
            caller_id: caller_id.to_owned(),
            expected_uuid: uuid,
            frame,
        };

        let started = Instant::now();
        let result = tokio::time::timeout(self.config.vision_timeout, self.vision.analyze(request))
            .await;
        let elapsed = started.elapsed();
        histogram!(METRIC_VISION_LATENCY_MS).record(elapsed.as_secs_f64() * 1000.0);

        let reply = match result {
            Ok(Ok(reply)) => reply,
            Ok(Err(err)) => {
                warn!(error = %err, "vision call failed");
                cycle.vision_to(VisionResponseState::Error);
                return Ok(self.fail(cycle, FrameFailure::VisionFailed));
            }
            Err(_) => {
                warn!(timeout_ms = millis(self.config.vision_timeout), "vision call timed out");
                cycle.vision_to(VisionResponseState::Error);
                return Ok(self.fail(cycle, FrameFailure::VisionTimedOut));
            }
        };

        cycle.usage = Some(VisionUsage {
            total_tokens: reply.usage.total_tokens,
            latency_ms: millis(elapsed),
        });

        if reply.identifier != Some(uuid) {
            cycle.vision_to(VisionResponseState::Error);
            return Ok(self.fail(cycle, FrameFailure::IdentifierMismatch));
        }
        if !reply.fields.has_descriptive_data() {
            cycle.vision_to(VisionResponseState::Error);
            return Ok(self.fail(cycle, FrameFailure::MissingData));
        }

        let fields = self.settle_tracking_number(uuid, reply.fields)?;
        let response = ScanResponse::found(uuid, fields);

        cycle.vision_to(VisionResponseState::Complete);
        cycle.camera_to(CameraState::Found);
        cycle.intent = ScanIntent::UuidAndDataFound;

        if let Err(err) = self.scans.record(uuid, response.clone()) {
            warn!(error = %err, %uuid, "failed to cache completed scan");
        }

        let persisted = match self.repository.save(&response).await {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, %uuid, "failed to persist completed scan");
                false
            }
        };

        info!(
            %uuid,
            tracking_number = response.tracking_number().unwrap_or_default(),
            persisted,
            "scan completed"
        );
        Ok(self.conclude(cycle, Some(response), None, persisted))
    }

    /// Keep a well-formed tracking number from the label, mint one otherwise.
    fn settle_tracking_number(
        &self,
        uuid: Uuid,
        mut fields: LabelFields,
    ) -> Result<LabelFields, IssueError> {
        let prefix = self.config.tracking_prefix.as_str();
        let usable = fields
            .tracking_number
            .as_deref()
            .is_some_and(|candidate| is_well_formed(prefix, candidate));

        if !usable {
            let issued = self.issuer.issue_tracking_number(uuid)?;
            debug!(%uuid, tracking_number = issued.tracking_number(), "tracking number minted");
            fields.tracking_number = Some(issued.tracking_number().to_owned());
        }

        Ok(fields)
    }

    fn fail(&self, mut cycle: Cycle, failure: FrameFailure) -> FrameOutcome {
        cycle.camera_to(CameraState::Error);

        if matches!(
            failure,
            FrameFailure::VisionFailed
                | FrameFailure::VisionTimedOut
                | FrameFailure::IdentifierMismatch
                | FrameFailure::MissingData
        ) {
            counter!(METRIC_VISION_FAILURE_TOTAL, "reason" => failure.as_str()).increment(1);
        }
        debug!(reason = failure.as_str(), "frame cycle failed");

        if self.config.record_errors
            && let Some(uuid) = cycle.uuid
        {
            let record = ScanResponse::error(Some(uuid), cycle.vision, failure.note());
            if let Err(err) = self.errors.record(uuid, record) {
                warn!(error = %err, %uuid, "failed to cache scan error");
            }
        }

        self.conclude(cycle, None, Some(failure), false)
    }

    fn conclude(
        &self,
        cycle: Cycle,
        response: Option<ScanResponse>,
        failure: Option<FrameFailure>,
        persisted: bool,
    ) -> FrameOutcome {
        counter!(METRIC_SCAN_TOTAL, "intent" => cycle.intent.as_str()).increment(1);
        cycle.finish(response, failure, persisted)
    }
}
