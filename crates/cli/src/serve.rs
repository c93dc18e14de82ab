//! Daemon mode – line-delimited JSON requests over a Unix socket.
//!
//! Connections and the lines on them are served one at a time; each request
//! is answered before the next line is read.

use anyhow::{Context, Result};
use engine::config::GaugeConfig;
use engine::types::*;
use engine::{reply_pair, AppContext, QueryDispatcher, ResponseChannel};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

pub async fn run_daemon(socket_path: PathBuf, config: &GaugeConfig, ctx: &AppContext) -> Result<()> {
    // Remove stale socket if it exists
    let _ = std::fs::remove_file(&socket_path);

    let listener = UnixListener::bind(&socket_path)
        .with_context(|| format!("cannot bind socket {}", socket_path.display()))?;

    let dispatcher = QueryDispatcher::new();
    let channel = ResponseChannel::new(config.channel.name.clone(), &dispatcher, ctx);
    tracing::info!(
        socket = %socket_path.display(),
        channel = channel.name(),
        "gaugectl daemon listening"
    );

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let (reader, mut writer) = stream.into_split();
                let mut lines = BufReader::new(reader).lines();

                loop {
                    let line = match lines.next_line().await {
                        Ok(Some(line)) => line,
                        Ok(None) => break,
                        Err(e) => {
                            tracing::debug!(error = %e, "connection read error, closing");
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    let response = handle_line(&line, &channel).await;
                    let mut resp_json = match serde_json::to_string(&response) {
                        Ok(j) => j,
                        Err(e) => {
                            tracing::error!(error = %e, "cannot encode response");
                            continue;
                        }
                    };
                    resp_json.push('\n');
                    if writer.write_all(resp_json.as_bytes()).await.is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "accept error");
            }
        }
    }
}

async fn handle_line(line: &str, channel: &ResponseChannel<'_>) -> DaemonResponse {
    let req: DaemonRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            return DaemonResponse {
                id: "unknown".into(),
                response: ResponseEnvelope::error(
                    ErrorCode::InvalidRequest,
                    format!("invalid JSON request: {}", e),
                ),
            };
        }
    };

    let (reply, rx) = reply_pair();
    channel.handle_envelope(&req.envelope, reply);
    let response = rx.await.unwrap_or_else(|_| {
        ResponseEnvelope::error(ErrorCode::InternalError, "channel dropped the reply")
    });

    DaemonResponse {
        id: req.id,
        response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::platform::FixedPowerSupply;

    #[tokio::test]
    async fn test_handle_line_routes_by_method() {
        let ctx = AppContext::simulated(FixedPowerSupply::capacity(73), Some(29));
        let dispatcher = QueryDispatcher::new();
        let channel = ResponseChannel::new("flutter-course/battery", &dispatcher, &ctx);

        let r = handle_line(r#"{"id":"1","method":"getBatteryLevel"}"#, &channel).await;
        assert_eq!(r.id, "1");
        assert_eq!(
            r.response,
            ResponseEnvelope::Ok {
                value: serde_json::json!(73)
            }
        );

        let r = handle_line(r#"{"id":"2","method":"setBatteryLevel"}"#, &channel).await;
        assert_eq!(r.id, "2");
        assert_eq!(r.response, ResponseEnvelope::NotImplemented);
    }

    #[tokio::test]
    async fn test_handle_line_rejects_garbage() {
        let ctx = AppContext::headless();
        let dispatcher = QueryDispatcher::new();
        let channel = ResponseChannel::new("flutter-course/battery", &dispatcher, &ctx);

        let r = handle_line("{nope", &channel).await;
        assert_eq!(r.id, "unknown");
        assert_eq!(r.response.kind(), ResponseKind::Error);
    }

    async fn connect(socket: &std::path::Path) -> tokio::net::UnixStream {
        loop {
            match tokio::net::UnixStream::connect(socket).await {
                Ok(s) => return s,
                Err(_) => tokio::time::sleep(std::time::Duration::from_millis(10)).await,
            }
        }
    }

    async fn call(socket: &std::path::Path, line: &[u8]) -> Option<String> {
        let (reader, mut writer) = connect(socket).await.into_split();
        writer.write_all(line).await.unwrap();
        BufReader::new(reader).lines().next_line().await.ok().flatten()
    }

    #[tokio::test]
    async fn test_daemon_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("gauge.sock");
        let config = GaugeConfig::default();

        let server = {
            let socket = socket.clone();
            async move {
                let ctx = AppContext::simulated(FixedPowerSupply::broadcast(Some(45), Some(100)), Some(19));
                run_daemon(socket, &config, &ctx).await
            }
        };

        let client = async {
            let line = call(&socket, b"{\"id\":\"a\",\"method\":\"getBatteryLevel\"}\n")
                .await
                .unwrap();
            serde_json::from_str::<DaemonResponse>(&line).unwrap()
        };

        let resp = tokio::select! {
            r = server => panic!("daemon exited: {:?}", r.err()),
            resp = client => resp,
        };
        assert_eq!(resp.id, "a");
        assert_eq!(
            resp.response,
            ResponseEnvelope::Ok {
                value: serde_json::json!(45)
            }
        );
    }

    #[tokio::test]
    async fn test_daemon_survives_non_utf8_line() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("gauge.sock");
        let config = GaugeConfig::default();

        let server = {
            let socket = socket.clone();
            async move {
                let ctx = AppContext::simulated(FixedPowerSupply::capacity(73), Some(29));
                run_daemon(socket, &config, &ctx).await
            }
        };

        let clients = async {
            // The bad connection is closed without a reply.
            let bad = call(&socket, b"\xff\xfe\n").await;
            let good = call(&socket, b"{\"id\":\"b\",\"method\":\"getBatteryLevel\"}\n")
                .await
                .unwrap();
            (bad, serde_json::from_str::<DaemonResponse>(&good).unwrap())
        };

        let (bad, good) = tokio::select! {
            r = server => panic!("daemon exited: {:?}", r.err()),
            out = clients => out,
        };
        assert_eq!(bad, None);
        assert_eq!(good.id, "b");
        assert_eq!(
            good.response,
            ResponseEnvelope::Ok {
                value: serde_json::json!(73)
            }
        );
    }
}
