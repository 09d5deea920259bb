use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use nestmtx_bridge::domain::sdp::canonicalizer::section_order;
use nestmtx_bridge::domain::value_objects::{
    DtlsFingerprint, DtlsParameters, DtlsRole, IceParameters,
};
use nestmtx_bridge::{
    BusyPolicy, Camera, CameraId, DeviceCommandApi, DomainError, EndpointPorts, EndpointResolver,
    ExtendOptions, InMemoryRepository, KeepAliveService, LocalMediaEngine, LocalPublishService,
    LocalTransportDescriptor, MetricsReporter, OrchestratorSettings, Result, RtspStreamGrant,
    SessionEvent, SessionEventPublisher, SessionRepository, SessionState, StartOptions,
    StartupMode, StopOptions, StreamDefaults, StreamExtension, StreamProtocol,
    StreamSessionOrchestrator, StreamTeardown, WebRtcStreamGrant,
};

const OFFER_WITHOUT_APPLICATION: &str = "v=0\r\n\
o=- 1 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96\r\n\
c=IN IP4 0.0.0.0\r\n\
a=mid:1\r\n\
a=recvonly\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
c=IN IP4 0.0.0.0\r\n\
a=mid:0\r\n\
a=recvonly\r\n";

const ANSWER: &str = "v=0\r\no=- 9 2 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n";

#[derive(Default)]
struct FakeCommands {
    generated: AtomicUsize,
    extended: AtomicUsize,
    fail_calls: AtomicBool,
    delay: Mutex<Duration>,
    /// Token handed back on extension; `None` means an empty response
    extension_token: Mutex<Option<String>>,
    offers: Mutex<Vec<String>>,
    hints: Mutex<Vec<Option<String>>>,
}

impl FakeCommands {
    fn with_extension_token(token: Option<&str>) -> Self {
        let fake = Self::default();
        *fake.extension_token.lock().unwrap() = token.map(str::to_string);
        fake
    }

    async fn simulate(&self, command: &str, hint: Option<&str>) -> Result<()> {
        self.hints.lock().unwrap().push(hint.map(str::to_string));
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_calls.load(Ordering::SeqCst) {
            return Err(DomainError::remote(command, "503 Service Unavailable"));
        }
        Ok(())
    }

    fn extension(&self) -> StreamExtension {
        self.extended.fetch_add(1, Ordering::SeqCst);
        StreamExtension {
            token: self.extension_token.lock().unwrap().clone(),
            expires_at: Some("2026-01-01T00:10:00Z".to_string()),
        }
    }
}

#[async_trait]
impl DeviceCommandApi for FakeCommands {
    async fn generate_rtsp_stream(
        &self,
        _device_name: &str,
        redirect_hint: Option<&str>,
    ) -> Result<RtspStreamGrant> {
        self.simulate("GenerateRtspStream", redirect_hint).await?;
        let n = self.generated.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RtspStreamGrant {
            stream_extension_token: format!("rtsp-{n}"),
            stream_url: Some(format!("rtsps://cloud.example/stream-{n}?auth=secret")),
            expires_at: Some("2026-01-01T00:05:00Z".to_string()),
        })
    }

    async fn generate_webrtc_stream(
        &self,
        _device_name: &str,
        offer_sdp: &str,
        redirect_hint: Option<&str>,
    ) -> Result<WebRtcStreamGrant> {
        self.offers.lock().unwrap().push(offer_sdp.to_string());
        self.simulate("GenerateWebRtcStream", redirect_hint).await?;
        self.generated.fetch_add(1, Ordering::SeqCst);
        Ok(WebRtcStreamGrant {
            answer_sdp: ANSWER.to_string(),
            media_session_id: "abc".to_string(),
            expires_at: None,
        })
    }

    async fn extend_rtsp_stream(
        &self,
        _device_name: &str,
        _stream_extension_token: &str,
        redirect_hint: Option<&str>,
    ) -> Result<StreamExtension> {
        self.simulate("ExtendRtspStream", redirect_hint).await?;
        Ok(self.extension())
    }

    async fn extend_webrtc_stream(
        &self,
        _device_name: &str,
        _media_session_id: &str,
        redirect_hint: Option<&str>,
    ) -> Result<StreamExtension> {
        self.simulate("ExtendWebRtcStream", redirect_hint).await?;
        Ok(self.extension())
    }
}

#[derive(Default)]
struct FakeTeardown {
    calls: AtomicUsize,
    fail: AtomicBool,
}

#[async_trait]
impl StreamTeardown for FakeTeardown {
    async fn teardown(&self, _camera_id: &CameraId, _protocol: StreamProtocol) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::remote("Teardown", "helper already gone"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingEvents {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingEvents {
    fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }
}

impl SessionEventPublisher for RecordingEvents {
    fn publish(&self, event: SessionEvent) {
        self.events.lock().unwrap().push(event);
    }
}

struct NoopMetrics;

impl MetricsReporter for NoopMetrics {
    fn report_session_started(&self, _protocol: StreamProtocol) {}
    fn report_session_extended(&self, _protocol: StreamProtocol) {}
    fn report_extension_rejected(&self, _protocol: StreamProtocol) {}
    fn report_session_stopped(&self, _protocol: StreamProtocol, _was_active: bool) {}
    fn report_session_failed(&self, _protocol: StreamProtocol, _was_active: bool) {}
    fn report_state_change(&self, _camera_id: &str, _state: SessionState) {}
}

struct Harness {
    orchestrator: Arc<StreamSessionOrchestrator>,
    repository: Arc<InMemoryRepository>,
    commands: Arc<FakeCommands>,
    teardown: Arc<FakeTeardown>,
    events: Arc<RecordingEvents>,
}

fn device(protocols: &[&str]) -> Value {
    json!({
        "type": "sdm.devices.types.CAMERA",
        "traits": {
            "sdm.devices.traits.CameraLiveStream": { "supportedProtocols": protocols }
        }
    })
}

fn camera(id: &str, protocols: &[&str]) -> Camera {
    Camera::new(
        CameraId::from(id),
        format!("enterprises/p/devices/{id}"),
        device(protocols),
    )
}

fn harness(cameras: Vec<Camera>, commands: FakeCommands, busy_policy: BusyPolicy) -> Harness {
    let repository = Arc::new(InMemoryRepository::with_cameras(cameras));
    let commands = Arc::new(commands);
    let teardown = Arc::new(FakeTeardown::default());
    let events = Arc::new(RecordingEvents::default());
    let orchestrator = Arc::new(StreamSessionOrchestrator::new(
        commands.clone(),
        repository.clone(),
        teardown.clone(),
        events.clone(),
        Arc::new(NoopMetrics),
        OrchestratorSettings {
            busy_policy,
            command_timeout: Duration::from_secs(5),
        },
    ));
    Harness {
        orchestrator,
        repository,
        commands,
        teardown,
        events,
    }
}

fn stored_state(h: &Harness, id: &CameraId) -> Option<SessionState> {
    h.repository
        .load_session(id)
        .unwrap()
        .map(|session| session.state())
}

#[tokio::test]
async fn test_webrtc_start_then_rejected_extension() {
    let h = harness(
        vec![camera("doorbell", &["WEB_RTC"])],
        FakeCommands::with_extension_token(None),
        BusyPolicy::Queue,
    );
    let id = CameraId::from("doorbell");

    let started = h
        .orchestrator
        .start(&id, Some(OFFER_WITHOUT_APPLICATION), StartOptions::default())
        .await
        .unwrap();

    assert_eq!(started.state, SessionState::Active);
    assert_eq!(started.protocol, StreamProtocol::WebRtc);
    assert_eq!(started.token.as_ref().unwrap().value(), "abc");
    assert_eq!(started.answer_sdp(), Some(ANSWER));

    let sent = h.commands.offers.lock().unwrap()[0].clone();
    assert_eq!(section_order(&sent), vec!["audio", "video", "application"]);
    assert_eq!(sent.matches("a=setup:actpass").count(), 1);

    let err = h
        .orchestrator
        .extend(&id, ExtendOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DomainError::ExtensionRejected {
            protocol: StreamProtocol::WebRtc,
            ..
        }
    ));
    let session = h.repository.load_session(&id).unwrap().unwrap();
    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(session.token().unwrap().value(), "abc");
}

#[tokio::test]
async fn test_start_without_capabilities_is_unsupported() {
    let h = harness(
        vec![camera("legacy", &[])],
        FakeCommands::default(),
        BusyPolicy::Queue,
    );
    let id = CameraId::from("legacy");

    let err = h
        .orchestrator
        .start(&id, None, StartOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::UnsupportedProtocol(_)));
    assert!(matches!(stored_state(&h, &id), None | Some(SessionState::Inactive)));
    assert_eq!(h.commands.generated.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_camera() {
    let h = harness(vec![], FakeCommands::default(), BusyPolicy::Queue);
    let err = h
        .orchestrator
        .start(&CameraId::from("ghost"), None, StartOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::UnknownCamera(_)));
}

#[tokio::test]
async fn test_extend_and_stop_require_active_session() {
    let h = harness(
        vec![camera("cam", &["RTSP"])],
        FakeCommands::default(),
        BusyPolicy::Queue,
    );
    let id = CameraId::from("cam");

    let extend = h.orchestrator.extend(&id, ExtendOptions::default()).await;
    assert!(matches!(extend, Err(DomainError::NotActive(_))));

    let stop = h.orchestrator.stop(&id, StopOptions::default()).await;
    assert!(matches!(stop, Err(DomainError::NotActive(_))));

    let lenient = StopOptions {
        allow_already_inactive: true,
        ..StopOptions::default()
    };
    assert!(h.orchestrator.stop(&id, lenient).await.is_ok());
    assert_eq!(h.teardown.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rtsp_lifecycle() {
    let h = harness(
        vec![camera("cam", &["WEB_RTC", "RTSP"])],
        FakeCommands::with_extension_token(Some("rtsp-ext")),
        BusyPolicy::Queue,
    );
    let id = CameraId::from("cam");

    let started = h
        .orchestrator
        .start(&id, None, StartOptions::default())
        .await
        .unwrap();
    assert_eq!(started.protocol, StreamProtocol::Rtsp);
    assert_eq!(started.token.as_ref().unwrap().value(), "rtsp-1");
    let stream_url = started.stream_url().unwrap().to_string();

    let extended = h
        .orchestrator
        .extend(&id, ExtendOptions::default())
        .await
        .unwrap();
    assert_eq!(extended.state, SessionState::Active);
    assert_eq!(extended.token.as_ref().unwrap().value(), "rtsp-ext");
    assert_eq!(extended.stream_url(), Some(stream_url.as_str()));
    assert_eq!(extended.expires_hint.as_deref(), Some("2026-01-01T00:10:00Z"));

    h.orchestrator.stop(&id, StopOptions::default()).await.unwrap();

    let session = h.repository.load_session(&id).unwrap().unwrap();
    assert_eq!(session.state(), SessionState::Inactive);
    assert!(session.token().is_none());
    assert_eq!(h.teardown.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.events.names(),
        vec!["sessionStarted", "sessionExtended", "sessionStopped"]
    );
}

#[tokio::test]
async fn test_extend_reuses_start_redirect_hint() {
    let h = harness(
        vec![camera("cam", &["RTSP"])],
        FakeCommands::with_extension_token(Some("next")),
        BusyPolicy::Queue,
    );
    let id = CameraId::from("cam");
    let start = StartOptions {
        redirect_hint: Some("https://bridge.local/oauth".to_string()),
        ..StartOptions::default()
    };

    h.orchestrator.start(&id, None, start).await.unwrap();
    h.orchestrator
        .extend(&id, ExtendOptions::default())
        .await
        .unwrap();

    let hints = h.commands.hints.lock().unwrap().clone();
    assert_eq!(hints.len(), 2);
    assert_eq!(hints[1].as_deref(), Some("https://bridge.local/oauth"));
}

#[tokio::test]
async fn test_start_twice_requires_force_restart() {
    let h = harness(
        vec![camera("cam", &["RTSP"])],
        FakeCommands::default(),
        BusyPolicy::Queue,
    );
    let id = CameraId::from("cam");

    h.orchestrator
        .start(&id, None, StartOptions::default())
        .await
        .unwrap();

    let again = h.orchestrator.start(&id, None, StartOptions::default()).await;
    assert!(matches!(again, Err(DomainError::AlreadyActive(_))));

    let forced = StartOptions {
        force_restart: true,
        ..StartOptions::default()
    };
    let restarted = h.orchestrator.start(&id, None, forced).await.unwrap();

    assert_eq!(restarted.token.as_ref().unwrap().value(), "rtsp-2");
    assert_eq!(h.teardown.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_webrtc_start_requires_offer() {
    let h = harness(
        vec![camera("cam", &["WEB_RTC"])],
        FakeCommands::default(),
        BusyPolicy::Queue,
    );
    let id = CameraId::from("cam");

    let err = h
        .orchestrator
        .start(&id, None, StartOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::MissingOffer(_)));
    assert!(h.commands.offers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_failure_marks_failed_and_allows_restart() {
    let commands = FakeCommands::default();
    commands.fail_calls.store(true, Ordering::SeqCst);
    let h = harness(vec![camera("cam", &["RTSP"])], commands, BusyPolicy::Queue);
    let id = CameraId::from("cam");

    let err = h
        .orchestrator
        .start(&id, None, StartOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::RemoteCallFailed { .. }));

    let session = h.repository.load_session(&id).unwrap().unwrap();
    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.token().is_none());
    assert!(session.last_error().unwrap().contains("503"));
    assert_eq!(h.events.names(), vec!["sessionFailed"]);

    h.commands.fail_calls.store(false, Ordering::SeqCst);
    let restarted = h
        .orchestrator
        .start(&id, None, StartOptions::default())
        .await
        .unwrap();
    assert_eq!(restarted.state, SessionState::Active);
    assert!(restarted.last_error.is_none());
}

#[tokio::test]
async fn test_remote_failure_during_extend_marks_failed() {
    let h = harness(
        vec![camera("cam", &["RTSP"])],
        FakeCommands::with_extension_token(Some("next")),
        BusyPolicy::Queue,
    );
    let id = CameraId::from("cam");
    h.orchestrator
        .start(&id, None, StartOptions::default())
        .await
        .unwrap();

    h.commands.fail_calls.store(true, Ordering::SeqCst);
    let err = h
        .orchestrator
        .extend(&id, ExtendOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::RemoteCallFailed { .. }));
    assert_eq!(stored_state(&h, &id), Some(SessionState::Failed));
}

#[tokio::test]
async fn test_deadline_during_start_leaves_failed() {
    let commands = FakeCommands::default();
    *commands.delay.lock().unwrap() = Duration::from_millis(500);
    let h = harness(vec![camera("cam", &["RTSP"])], commands, BusyPolicy::Queue);
    let id = CameraId::from("cam");

    let options = StartOptions {
        deadline: Some(Duration::from_millis(20)),
        ..StartOptions::default()
    };
    let err = h.orchestrator.start(&id, None, options).await.unwrap_err();

    assert!(matches!(err, DomainError::RemoteCallFailed { .. }));
    let session = h.repository.load_session(&id).unwrap().unwrap();
    assert_eq!(session.state(), SessionState::Failed);
    assert!(session.token().is_none());
}

#[tokio::test]
async fn test_teardown_failure_still_marks_inactive() {
    let h = harness(
        vec![camera("cam", &["RTSP"])],
        FakeCommands::default(),
        BusyPolicy::Queue,
    );
    let id = CameraId::from("cam");
    h.orchestrator
        .start(&id, None, StartOptions::default())
        .await
        .unwrap();

    h.teardown.fail.store(true, Ordering::SeqCst);
    h.orchestrator.stop(&id, StopOptions::default()).await.unwrap();

    assert_eq!(stored_state(&h, &id), Some(SessionState::Inactive));
}

#[tokio::test]
async fn test_fail_fast_policy_rejects_concurrent_call() {
    let commands = FakeCommands::default();
    *commands.delay.lock().unwrap() = Duration::from_millis(300);
    let h = harness(vec![camera("cam", &["RTSP"])], commands, BusyPolicy::FailFast);
    let id = CameraId::from("cam");

    let first = {
        let orchestrator = h.orchestrator.clone();
        let id = id.clone();
        tokio::spawn(async move {
            orchestrator
                .start(&id, None, StartOptions::default())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = h.orchestrator.start(&id, None, StartOptions::default()).await;
    assert!(matches!(second, Err(DomainError::SessionBusy(_))));

    assert!(first.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_queue_policy_serializes_calls() {
    let commands = FakeCommands::default();
    *commands.delay.lock().unwrap() = Duration::from_millis(50);
    let h = harness(vec![camera("cam", &["RTSP"])], commands, BusyPolicy::Queue);
    let id = CameraId::from("cam");

    let (a, b) = tokio::join!(
        h.orchestrator.start(&id, None, StartOptions::default()),
        h.orchestrator.start(&id, None, StartOptions::default()),
    );

    let results = [a, b];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(DomainError::AlreadyActive(_)))));
    assert_eq!(h.commands.generated.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_different_cameras_run_concurrently() {
    let commands = FakeCommands::default();
    *commands.delay.lock().unwrap() = Duration::from_millis(200);
    let h = harness(
        vec![camera("a", &["RTSP"]), camera("b", &["RTSP"])],
        commands,
        BusyPolicy::FailFast,
    );
    let (a, b) = (CameraId::from("a"), CameraId::from("b"));

    let (ra, rb) = tokio::join!(
        h.orchestrator.start(&a, None, StartOptions::default()),
        h.orchestrator.start(&b, None, StartOptions::default()),
    );

    assert!(ra.is_ok());
    assert!(rb.is_ok());
}

#[tokio::test]
async fn test_keepalive_restarts_always_on_rtsp_camera() {
    let cam = camera("cam", &["RTSP"]).with_startup_mode(StartupMode::AlwaysOn);
    let h = harness(
        vec![cam],
        FakeCommands::with_extension_token(None),
        BusyPolicy::Queue,
    );
    let id = CameraId::from("cam");
    let keepalive = KeepAliveService::new(
        h.orchestrator.clone(),
        h.repository.clone(),
        Duration::from_secs(60),
    );

    assert_eq!(keepalive.start_always_on().await.unwrap(), 1);

    let report = keepalive.tick().await.unwrap();

    assert_eq!(report.extended, 0);
    assert_eq!(report.restarted, 1);
    let session = h.repository.load_session(&id).unwrap().unwrap();
    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(session.token().unwrap().value(), "rtsp-2");

    assert_eq!(keepalive.stop_all().await.unwrap(), 1);
    assert_eq!(stored_state(&h, &id), Some(SessionState::Inactive));
}

#[tokio::test]
async fn test_keepalive_extends_on_demand_session() {
    let h = harness(
        vec![camera("cam", &["RTSP"])],
        FakeCommands::with_extension_token(Some("fresh")),
        BusyPolicy::Queue,
    );
    let id = CameraId::from("cam");
    let keepalive = KeepAliveService::new(
        h.orchestrator.clone(),
        h.repository.clone(),
        Duration::from_secs(60),
    );

    assert_eq!(keepalive.start_always_on().await.unwrap(), 0);
    h.orchestrator
        .start(&id, None, StartOptions::default())
        .await
        .unwrap();

    let report = keepalive.tick().await.unwrap();

    assert_eq!(report.extended, 1);
    assert_eq!(h.commands.extended.load(Ordering::SeqCst), 1);
}

struct FakeEngine {
    offers: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl LocalMediaEngine for FakeEngine {
    async fn publish_offer(&self, path_hint: &str, offer_sdp: &str) -> Result<String> {
        self.offers
            .lock()
            .unwrap()
            .push((path_hint.to_string(), offer_sdp.to_string()));
        Ok(format!("{path_hint}-live"))
    }
}

fn descriptor() -> LocalTransportDescriptor {
    LocalTransportDescriptor::new(
        IceParameters {
            username_fragment: "ufrag".to_string(),
            password: "pwd".to_string(),
            ice_lite: true,
        },
        Vec::new(),
        DtlsParameters {
            role: DtlsRole::Auto,
            fingerprints: vec![DtlsFingerprint {
                algorithm: "sha-256".to_string(),
                value: "AA:BB".to_string(),
            }],
        },
    )
}

#[tokio::test]
async fn test_local_publish_records_engine_path() {
    let repository = Arc::new(InMemoryRepository::with_cameras(vec![
        camera("cam", &["WEB_RTC"]).with_media_path("cam"),
    ]));
    let engine = Arc::new(FakeEngine {
        offers: Mutex::new(Vec::new()),
    });
    let service = LocalPublishService::new(
        engine.clone(),
        repository.clone(),
        EndpointResolver::new(None, EndpointPorts::default()),
    );
    let id = CameraId::from("cam");

    let path = service.publish(&id, &descriptor()).await.unwrap();

    assert_eq!(path, "cam-live");
    let (hint, offer) = engine.offers.lock().unwrap()[0].clone();
    assert_eq!(hint, "cam");
    assert!(offer.contains("a=ice-lite\r\n"));
    assert!(offer.contains("a=setup:actpass\r\n"));

    let camera = repository.load_camera(&id).unwrap().unwrap();
    assert_eq!(camera.media_path(), Some("cam-live"));

    let endpoints = service.endpoints(&id).unwrap();
    assert_eq!(
        endpoints.hls.as_deref(),
        Some("http://localhost:8888/cam-live")
    );
    assert_eq!(service.publish_destination(&id).unwrap(), None);
}

#[test]
fn test_stream_overrides_flow_into_parameters() {
    let cam: Camera = serde_json::from_value(json!({
        "id": "cam",
        "device_name": "enterprises/p/devices/cam",
        "device_info": device(&["WEB_RTC"]),
        "stream": { "fps": 15 },
    }))
    .unwrap();

    let params = cam
        .stream_parameters(&StreamDefaults::default())
        .unwrap();
    assert_eq!((params.width, params.height, params.fps), (1920, 1080, 15));
}
