//! Stub collaborators shared by the intake integration tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use courier_intake::admission::AdmissionController;
use courier_intake::cache::Cache;
use courier_intake::domain::scan::{LabelFields, ScanResponse};
use courier_intake::intake::{
    ImageQrDecoder, InMemoryScanRepository, IntakeConfig, LocalDecoder, RepoError, ScanIntake,
    ScanRepository, TextPayloadDecoder, VisionAnalyzer, VisionError, VisionReply, VisionRequest,
    VisionUsage,
};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, QrCode};
use uuid::Uuid;

/// How the stub vision service answers.
#[derive(Debug, Clone)]
pub enum Script {
    /// Echo the expected uuid back with the given fields.
    Echo(LabelFields),
    /// Answer with a fixed reply regardless of the request.
    Fixed(VisionReply),
    Fail(VisionError),
    /// Sleep before echoing, to trip the timeout.
    Hang(Duration),
}

pub struct StubVision {
    script: Script,
    calls: AtomicUsize,
}

impl StubVision {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionAnalyzer for StubVision {
    async fn analyze(&self, request: VisionRequest) -> Result<VisionReply, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Echo(fields) => Ok(echo(request.expected_uuid, fields.clone())),
            Script::Fixed(reply) => Ok(reply.clone()),
            Script::Fail(err) => Err(err.clone()),
            Script::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(echo(request.expected_uuid, addressed()))
            }
        }
    }
}

fn echo(uuid: Uuid, fields: LabelFields) -> VisionReply {
    VisionReply {
        identifier: Some(uuid),
        fields,
        usage: VisionUsage {
            total_tokens: 128,
            latency_ms: 0,
        },
    }
}

/// Label fields with an address and nothing else.
pub fn addressed() -> LabelFields {
    LabelFields {
        name: Some("Ada Lovelace".to_string()),
        address: Some("12 Analytical Row".to_string()),
        city: Some("London".to_string()),
        ..LabelFields::default()
    }
}

/// Repository that can be told to fail, counting every save attempt.
#[derive(Default)]
pub struct StubRepository {
    inner: InMemoryScanRepository,
    fail: bool,
    saves: AtomicUsize,
}

impl StubRepository {
    pub fn working() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScanRepository for StubRepository {
    async fn save(&self, scan: &ScanResponse) -> Result<(), RepoError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RepoError::from_persistence("database offline"));
        }
        self.inner.save(scan).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScanResponse>, RepoError> {
        self.inner.find_by_id(id).await
    }
}

pub struct Harness {
    pub intake: ScanIntake,
    pub vision: Arc<StubVision>,
    pub repository: Arc<StubRepository>,
    pub cache: Arc<Cache<Uuid, ScanResponse>>,
    pub admission: AdmissionController,
}

pub fn harness(script: Script) -> Harness {
    harness_with(script, StubRepository::working(), IntakeConfig::default())
}

pub fn harness_with(
    script: Script,
    repository: Arc<StubRepository>,
    config: IntakeConfig,
) -> Harness {
    build(Arc::new(TextPayloadDecoder), script, repository, config)
}

/// Harness whose frames are encoded camera images.
pub fn image_harness(script: Script) -> Harness {
    build(
        Arc::new(ImageQrDecoder),
        script,
        StubRepository::working(),
        IntakeConfig::default(),
    )
}

fn build(
    decoder: Arc<dyn LocalDecoder>,
    script: Script,
    repository: Arc<StubRepository>,
    config: IntakeConfig,
) -> Harness {
    let vision = StubVision::new(script);
    let cache = Arc::new(Cache::new());
    let admission = AdmissionController::new();
    let intake = ScanIntake::new(
        decoder,
        vision.clone(),
        repository.clone(),
        admission.clone(),
        Arc::clone(&cache),
        config,
    );

    Harness {
        intake,
        vision,
        repository,
        cache,
        admission,
    }
}

/// PNG frame showing `text` as a QR code with a four-module quiet zone.
pub fn qr_frame(text: &str) -> Vec<u8> {
    const SCALE: u32 = 6;
    const QUIET: u32 = 4;

    let code = QrCode::new(text.as_bytes()).expect("qr encoding");
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET) * SCALE;

    let image = GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / SCALE, y / SCALE);
        let inside =
            (QUIET..QUIET + modules).contains(&mx) && (QUIET..QUIET + modules).contains(&my);
        let dark =
            inside && colors[((my - QUIET) * modules + (mx - QUIET)) as usize] == Color::Dark;
        Luma([if dark { 0 } else { 255 }])
    });

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("png encoding");
    bytes
}
