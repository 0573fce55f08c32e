use diag_core::config::ServerConfig;
use diag_core::error::{DiagError, Result};
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

/// Outcome of an analytics request that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalyticsFetch {
    /// HTTP 200 with a decoded JSON document.
    Found(Value),
    /// HTTP 404: no recorded session for the user.
    NoSession,
    /// Any other status, with the raw response body.
    Failed { status: u16, body: String },
}

/// Body of a current-pose probe response.
#[derive(Debug, Clone, PartialEq)]
pub enum PoseBody {
    Json(Value),
    Text(String),
}

/// Result of timing one `GET /api/current_pose` request.
#[derive(Debug, Clone)]
pub struct PoseProbe {
    pub status: u16,
    pub elapsed: Duration,
    pub body: PoseBody,
}

impl PoseProbe {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Console lines: status, latency, then the payload or an error notice.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("✅ Response status: {}", self.status),
            format!("⏱️  Response time: {:.2}s", self.elapsed.as_secs_f64()),
        ];

        if !self.is_success() {
            lines.push("❌ API error response".to_string());
            return lines;
        }

        lines.push("📄 Response data:".to_string());
        match &self.body {
            PoseBody::Json(value) => {
                let pretty = serde_json::to_string_pretty(value)
                    .unwrap_or_else(|_| value.to_string());
                lines.extend(pretty.lines().map(str::to_string));
            }
            PoseBody::Text(text) => lines.push(text.clone()),
        }
        lines
    }
}

/// HTTP client for the FlowState server endpoints under test.
pub struct DiagClient {
    client: reqwest::Client,
    base: Url,
    pose_timeout: Duration,
}

impl DiagClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base = config.parsed_base_url()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("flowstate-diag/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base,
            pose_timeout: config.pose_timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base URL, percent-encoding each one.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DiagError::Config(format!("base URL '{}' cannot take a path", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Fetch analytics for the user's most recent session.
    pub async fn fetch_analytics(&self, user_id: &str) -> Result<AnalyticsFetch> {
        let url = self.endpoint(&["api", "user", user_id, "analytics"])?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Analytics response");

        match status.as_u16() {
            200 => Ok(AnalyticsFetch::Found(response.json::<Value>().await?)),
            404 => Ok(AnalyticsFetch::NoSession),
            code => {
                let body = response.text().await?;
                tracing::warn!(status = code, "Analytics request failed");
                Ok(AnalyticsFetch::Failed { status: code, body })
            }
        }
    }

    /// Time a request to the current-pose endpoint.
    pub async fn probe_current_pose(&self) -> Result<PoseProbe> {
        let url = self.endpoint(&["api", "current_pose"])?;
        tracing::debug!("GET {}", url);

        let start = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .timeout(self.pose_timeout)
            .send()
            .await
            .map_err(|e| connect_error(&url, e))?;
        let elapsed = start.elapsed();

        let status = response.status().as_u16();
        let text = response.text().await?;
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => PoseBody::Json(value),
            Err(_) => PoseBody::Text(text),
        };

        Ok(PoseProbe {
            status,
            elapsed,
            body,
        })
    }
}

fn connect_error(url: &Url, err: reqwest::Error) -> DiagError {
    if err.is_connect() {
        DiagError::Unreachable {
            url: url.to_string(),
            source: err,
        }
    } else {
        DiagError::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn analytics(Path(user): Path<String>) -> axum::response::Response {
        match user.as_str() {
            "default_user" => Json(json!({
                "poseStatistics": {
                    "palm": { "count": 15, "averageConfidence": 0.92, "percentage": 75.0 }
                }
            }))
            .into_response(),
            "jane doe" => Json(json!({ "user": user })).into_response(),
            "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "database offline").into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn current_pose() -> impl IntoResponse {
        Json(json!({ "pose": "fist", "confidence": 0.88 }))
    }

    /// Serve a stub FlowState API on an ephemeral port.
    async fn spawn_stub() -> ServerConfig {
        let app = Router::new()
            .route("/api/user/{user}/analytics", get(analytics))
            .route("/api/current_pose", get(current_pose));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        ServerConfig {
            base_url: format!("http://{}", addr),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = DiagClient::new(&ServerConfig::default()).unwrap();
        let url = client.endpoint(&["api", "user", "jane doe", "analytics"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5001/api/user/jane%20doe/analytics");
    }

    #[test]
    fn test_endpoint_respects_base_path() {
        let config = ServerConfig {
            base_url: "http://example.com/flow/".into(),
            ..ServerConfig::default()
        };
        let client = DiagClient::new(&config).unwrap();
        let url = client.endpoint(&["api", "current_pose"]).unwrap();
        assert_eq!(url.as_str(), "http://example.com/flow/api/current_pose");
    }

    #[tokio::test]
    async fn test_fetch_found() {
        let client = DiagClient::new(&spawn_stub().await).unwrap();
        match client.fetch_analytics("default_user").await.unwrap() {
            AnalyticsFetch::Found(doc) => {
                assert_eq!(doc["poseStatistics"]["palm"]["count"], 15);
            }
            other => panic!("expected document, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_encoded_user() {
        let client = DiagClient::new(&spawn_stub().await).unwrap();
        let fetched = client.fetch_analytics("jane doe").await.unwrap();
        assert_eq!(fetched, AnalyticsFetch::Found(json!({ "user": "jane doe" })));
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let client = DiagClient::new(&spawn_stub().await).unwrap();
        let fetched = client.fetch_analytics("nobody").await.unwrap();
        assert_eq!(fetched, AnalyticsFetch::NoSession);
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let client = DiagClient::new(&spawn_stub().await).unwrap();
        let fetched = client.fetch_analytics("broken").await.unwrap();
        assert_eq!(
            fetched,
            AnalyticsFetch::Failed {
                status: 500,
                body: "database offline".into()
            }
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // Reserve a port, then free it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = ServerConfig {
            base_url: format!("http://{}", addr),
            ..ServerConfig::default()
        };
        let client = DiagClient::new(&config).unwrap();
        let err = client.fetch_analytics("default_user").await.unwrap_err();
        assert!(matches!(err, DiagError::Unreachable { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn test_probe_current_pose() {
        let client = DiagClient::new(&spawn_stub().await).unwrap();
        let probe = client.probe_current_pose().await.unwrap();
        assert_eq!(probe.status, 200);
        assert_eq!(probe.body, PoseBody::Json(json!({ "pose": "fist", "confidence": 0.88 })));

        let lines = probe.lines();
        assert_eq!(lines[0], "✅ Response status: 200");
        assert!(lines[1].starts_with("⏱️  Response time: "));
        assert!(lines[1].ends_with('s'));
        assert!(lines.iter().any(|l| l.contains("\"pose\": \"fist\"")));
    }

    #[test]
    fn test_pose_probe_error_lines() {
        let probe = PoseProbe {
            status: 503,
            elapsed: Duration::from_millis(1250),
            body: PoseBody::Text("unavailable".into()),
        };
        assert_eq!(
            probe.lines(),
            vec![
                "✅ Response status: 503".to_string(),
                "⏱️  Response time: 1.25s".to_string(),
                "❌ API error response".to_string(),
            ]
        );
    }

    #[test]
    fn test_pose_probe_text_body() {
        let probe = PoseProbe {
            status: 200,
            elapsed: Duration::from_millis(40),
            body: PoseBody::Text("ok".into()),
        };
        assert_eq!(probe.lines().last().map(String::as_str), Some("ok"));
    }
}
