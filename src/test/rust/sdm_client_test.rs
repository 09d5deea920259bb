use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use warp::http::StatusCode;
use warp::Filter;

use nestmtx_bridge::{
    Camera, CameraId, DeviceCommandApi, DomainError, InMemoryRepository, OrchestratorSettings,
    ProcessTeardown, SdmCommandClient, SessionState, StartOptions, StaticTokenProvider,
    StreamSessionOrchestrator,
};

const DEVICE: &str = "enterprises/p/devices/d1";

#[derive(Debug, Clone)]
struct RecordedRequest {
    segment: String,
    authorization: String,
    body: Value,
}

type Recorded = Arc<Mutex<Vec<RecordedRequest>>>;

fn results_for(command: &str) -> Value {
    match command.rsplit('.').next().unwrap_or_default() {
        "GenerateRtspStream" => json!({
            "streamUrls": { "rtspUrl": "rtsps://stream.example/live?auth=x" },
            "streamExtensionToken": "rtsp-token",
            "streamToken": "ignored",
            "expiresAt": "2026-01-01T00:05:00Z"
        }),
        "GenerateWebRtcStream" => json!({
            "answerSdp": "v=0\r\n",
            "mediaSessionId": "media-1",
            "expiresAt": "2026-01-01T00:05:00Z"
        }),
        "ExtendRtspStream" => json!({
            "streamExtensionToken": "rtsp-token-2",
            "expiresAt": "2026-01-01T00:10:00Z"
        }),
        "ExtendWebRtcStream" => json!({
            "mediaSessionId": "media-2",
            "expiresAt": "2026-01-01T00:10:00Z"
        }),
        _ => Value::Null,
    }
}

/// Serve a fake `executeCommand` endpoint answering with `status`
async fn spawn_mock(status: StatusCode) -> (String, Recorded) {
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = recorded.clone();

    let route = warp::post()
        .and(warp::path!("v1" / "enterprises" / "p" / "devices" / String))
        .and(warp::header::<String>("authorization"))
        .and(warp::body::json())
        .map(move |segment: String, authorization: String, body: Value| {
            let command = body["command"].as_str().unwrap_or_default().to_string();
            sink.lock().unwrap().push(RecordedRequest {
                segment,
                authorization,
                body,
            });
            let reply = if status.is_success() {
                json!({ "results": results_for(&command) })
            } else {
                json!({ "error": { "code": status.as_u16(), "message": "Request had invalid credentials" } })
            };
            warp::reply::with_status(warp::reply::json(&reply), status)
        });

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (format!("http://{addr}"), recorded)
}

fn client(base_url: &str) -> SdmCommandClient {
    let tokens = Arc::new(StaticTokenProvider::new("test-access-token".to_string()));
    SdmCommandClient::new(base_url, tokens, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_generate_rtsp_stream() {
    let (base_url, recorded) = spawn_mock(StatusCode::OK).await;

    let grant = client(&base_url)
        .generate_rtsp_stream(DEVICE, None)
        .await
        .unwrap();

    assert_eq!(grant.stream_extension_token, "rtsp-token");
    assert_eq!(
        grant.stream_url.as_deref(),
        Some("rtsps://stream.example/live?auth=x")
    );
    assert_eq!(grant.expires_at.as_deref(), Some("2026-01-01T00:05:00Z"));

    let requests = recorded.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].segment, "d1:executeCommand");
    assert_eq!(requests[0].authorization, "Bearer test-access-token");
    assert_eq!(
        requests[0].body["command"],
        "sdm.devices.commands.CameraLiveStream.GenerateRtspStream"
    );
}

#[tokio::test]
async fn test_generate_webrtc_stream_sends_offer() {
    let (base_url, recorded) = spawn_mock(StatusCode::OK).await;

    let grant = client(&base_url)
        .generate_webrtc_stream(DEVICE, "v=0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\n", None)
        .await
        .unwrap();

    assert_eq!(grant.answer_sdp, "v=0\r\n");
    assert_eq!(grant.media_session_id, "media-1");

    let body = recorded.lock().unwrap()[0].body.clone();
    assert_eq!(
        body["params"]["offerSdp"],
        "v=0\r\nm=audio 9 UDP/TLS/RTP/SAVPF 111\r\n"
    );
}

#[tokio::test]
async fn test_extend_streams() {
    let (base_url, recorded) = spawn_mock(StatusCode::OK).await;
    let client = client(&base_url);

    let rtsp = client
        .extend_rtsp_stream(DEVICE, "rtsp-token", None)
        .await
        .unwrap();
    assert_eq!(rtsp.token.as_deref(), Some("rtsp-token-2"));

    let webrtc = client
        .extend_webrtc_stream(DEVICE, "media-1", None)
        .await
        .unwrap();
    assert_eq!(webrtc.token.as_deref(), Some("media-2"));
    assert_eq!(webrtc.expires_at.as_deref(), Some("2026-01-01T00:10:00Z"));

    let requests = recorded.lock().unwrap().clone();
    assert_eq!(
        requests[0].body["params"]["streamExtensionToken"],
        "rtsp-token"
    );
    assert_eq!(requests[1].body["params"]["mediaSessionId"], "media-1");
}

#[tokio::test]
async fn test_rejected_command_maps_to_remote_failure() {
    let (base_url, _recorded) = spawn_mock(StatusCode::UNAUTHORIZED).await;

    let err = client(&base_url)
        .generate_rtsp_stream(DEVICE, None)
        .await
        .unwrap_err();

    match err {
        DomainError::RemoteCallFailed { command, reason } => {
            assert_eq!(command, "GenerateRtspStream");
            assert!(reason.starts_with("401"));
            assert!(reason.contains("invalid credentials"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_server_maps_to_remote_failure() {
    let err = client("http://127.0.0.1:9")
        .extend_webrtc_stream(DEVICE, "media-1", None)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::RemoteCallFailed { .. }));
}

#[tokio::test]
async fn test_orchestrator_over_http_client() {
    let (base_url, recorded) = spawn_mock(StatusCode::OK).await;
    let camera = Camera::new(
        CameraId::from("d1"),
        DEVICE,
        json!({
            "type": "sdm.devices.types.CAMERA",
            "traits": {
                "sdm.devices.traits.CameraLiveStream": { "supportedProtocols": ["RTSP"] }
            }
        }),
    );
    let repository = Arc::new(InMemoryRepository::with_cameras(vec![camera]));
    let events = Arc::new(nestmtx_bridge::BroadcastEventPublisher::new(8));
    let orchestrator = StreamSessionOrchestrator::new(
        Arc::new(client(&base_url)),
        repository,
        Arc::new(ProcessTeardown::new()),
        events,
        Arc::new(nestmtx_bridge::PrometheusReporter::new()),
        OrchestratorSettings::default(),
    );

    let result = orchestrator
        .start(&CameraId::from("d1"), None, StartOptions::default())
        .await
        .unwrap();

    assert_eq!(result.state, SessionState::Active);
    assert_eq!(
        result.stream_url(),
        Some("rtsps://stream.example/live?auth=x")
    );
    assert_eq!(recorded.lock().unwrap().len(), 1);
}
