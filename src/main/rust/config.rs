use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::application::services::{BusyPolicy, OrchestratorSettings};
use crate::domain::services::{EndpointPorts, EndpointResolver, PublishTarget};
use crate::domain::value_objects::StreamDefaults;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyPolicyArg {
    /// Wait for the in-flight call on the same camera
    Queue,
    /// Reject with a busy error
    FailFast,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "nestmtx-bridge",
    version = "0.1.0",
    about = "Bridges cloud camera live streams to a local media server"
)]
pub struct Config {
    /// JSON file listing the cameras to bridge
    #[arg(long, env = "CAMERAS_FILE", default_value = "/app/config/cameras.json")]
    pub cameras_file: PathBuf,

    /// Device command API base URL
    #[arg(
        long,
        env = "SDM_API_URL",
        default_value = "https://smartdevicemanagement.googleapis.com"
    )]
    pub sdm_api_url: String,

    /// OAuth access token for the device command API
    #[arg(long, env = "SDM_ACCESS_TOKEN", default_value = "", hide_env_values = true)]
    pub sdm_access_token: String,

    /// Timeout in seconds for each remote command
    #[arg(long, env = "COMMAND_TIMEOUT_SECS", default_value = "30")]
    pub command_timeout_secs: u64,

    /// Seconds between stream extensions
    #[arg(long, env = "KEEPALIVE_INTERVAL_SECS", default_value = "240")]
    pub keepalive_interval_secs: u64,

    /// Behaviour when a lifecycle call arrives while another runs for the same camera
    #[arg(long, env = "BUSY_POLICY", value_enum, default_value = "queue")]
    pub busy_policy: BusyPolicyArg,

    /// Host advertised in public playback URLs
    #[arg(long, env = "MEDIAMTX_PUBLIC_HOST")]
    pub public_host: Option<String>,

    #[arg(long, env = "RTSP_TCP_PORT", default_value = "8554", allow_negative_numbers = true)]
    pub rtsp_tcp_port: i32,

    #[arg(long, env = "RTSP_UDP_RTP_PORT", default_value = "8000", allow_negative_numbers = true)]
    pub rtsp_udp_rtp_port: i32,

    #[arg(long, env = "RTSP_UDP_RTCP_PORT", default_value = "8001", allow_negative_numbers = true)]
    pub rtsp_udp_rtcp_port: i32,

    #[arg(long, env = "RTMP_PORT", default_value = "1935", allow_negative_numbers = true)]
    pub rtmp_port: i32,

    #[arg(long, env = "HLS_PORT", default_value = "8888", allow_negative_numbers = true)]
    pub hls_port: i32,

    #[arg(long, env = "WEB_RTC_PORT", default_value = "8889", allow_negative_numbers = true)]
    pub webrtc_port: i32,

    #[arg(long, env = "SRT_PORT", default_value = "8890", allow_negative_numbers = true)]
    pub srt_port: i32,

    /// Local media engine WHIP base URL
    #[arg(long, env = "MEDIA_ENGINE_URL", default_value = "http://127.0.0.1:8889")]
    pub media_engine_url: String,

    /// Base URL transcoding helpers publish into
    #[arg(long, env = "PUBLISH_URL")]
    pub publish_url: Option<String>,

    #[arg(long, env = "PUBLISH_USER")]
    pub publish_user: Option<String>,

    #[arg(long, env = "PUBLISH_PASSWORD", hide_env_values = true)]
    pub publish_password: Option<String>,

    #[arg(long, env = "WEBRTC_DEFAULT_WIDTH", default_value = "1920")]
    pub webrtc_default_width: u32,

    #[arg(long, env = "WEBRTC_DEFAULT_HEIGHT", default_value = "1080")]
    pub webrtc_default_height: u32,

    #[arg(long, env = "WEBRTC_DEFAULT_FPS", default_value = "30")]
    pub webrtc_default_fps: u32,

    /// Default WebRTC bitrate in kbps, estimated from the dimensions when unset
    #[arg(long, env = "WEBRTC_DEFAULT_BITRATE")]
    pub webrtc_default_bitrate: Option<u32>,

    /// Metrics server port
    #[arg(long, env = "METRICS_PORT", default_value = "9003")]
    pub metrics_port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        Self::validate_port(self.metrics_port, "metrics")?;

        if !self.sdm_api_url.starts_with("http://") && !self.sdm_api_url.starts_with("https://") {
            anyhow::bail!("SDM API URL must start with http:// or https://");
        }

        if self.command_timeout_secs == 0 {
            anyhow::bail!("Command timeout cannot be 0");
        }

        if self.keepalive_interval_secs == 0 {
            anyhow::bail!("Keep-alive interval cannot be 0");
        }

        if self.webrtc_default_width == 0
            || self.webrtc_default_height == 0
            || self.webrtc_default_fps == 0
        {
            anyhow::bail!("WebRTC default width, height and fps must be positive");
        }

        let published = self.endpoint_ports();
        let enabled = [
            published.rtsp_tcp,
            published.rtsp_udp_rtp,
            published.rtsp_udp_rtcp,
            published.rtmp,
            published.hls,
            published.webrtc,
            published.srt,
        ];
        if enabled.contains(&i32::from(self.metrics_port)) {
            anyhow::bail!(
                "Metrics port {} collides with a media server port",
                self.metrics_port
            );
        }

        if let Some(host) = &self.public_host {
            if host.contains("://") || host.contains('/') {
                anyhow::bail!(
                    "Public host must be a bare host name or address, got {}",
                    host
                );
            }
        }

        if let Some(url) = &self.publish_url {
            PublishTarget::new(url.clone()).map_err(|e| anyhow::anyhow!("{}", e))?;
        }

        Ok(())
    }

    fn validate_port(port: u16, name: &str) -> anyhow::Result<()> {
        if port == 0 {
            anyhow::bail!("Invalid {} port: port cannot be 0", name);
        }
        if port < MIN_USER_PORT {
            anyhow::bail!(
                "Invalid {} port: {} is a privileged port (< {}). Use a port >= {}",
                name,
                port,
                MIN_USER_PORT,
                MIN_USER_PORT
            );
        }
        Ok(())
    }

    pub fn endpoint_ports(&self) -> EndpointPorts {
        EndpointPorts {
            rtsp_tcp: self.rtsp_tcp_port,
            rtsp_udp_rtp: self.rtsp_udp_rtp_port,
            rtsp_udp_rtcp: self.rtsp_udp_rtcp_port,
            rtmp: self.rtmp_port,
            hls: self.hls_port,
            webrtc: self.webrtc_port,
            srt: self.srt_port,
        }
    }

    pub fn to_endpoint_resolver(&self) -> EndpointResolver {
        EndpointResolver::new(self.public_host.clone(), self.endpoint_ports())
    }

    pub fn to_stream_defaults(&self) -> StreamDefaults {
        StreamDefaults::new(
            self.webrtc_default_width,
            self.webrtc_default_height,
            self.webrtc_default_fps,
        )
        .with_bitrate_k(self.webrtc_default_bitrate)
    }

    pub fn to_orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            busy_policy: match self.busy_policy {
                BusyPolicyArg::Queue => BusyPolicy::Queue,
                BusyPolicyArg::FailFast => BusyPolicy::FailFast,
            },
            command_timeout: self.command_timeout(),
        }
    }

    pub fn to_publish_target(&self) -> crate::domain::errors::Result<Option<PublishTarget>> {
        self.publish_url
            .clone()
            .map(|url| {
                PublishTarget::new(url).map(|target| {
                    target.with_credentials(self.publish_user.clone(), self.publish_password.clone())
                })
            })
            .transpose()
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }
}
