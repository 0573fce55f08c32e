use anyhow::{Context, Result};
use diag_analytics::reports::rule;
use diag_analytics::ReportRenderer;
use diag_core::config::{CameraConfig, DiagConfig, ServerConfig};
use diag_core::DiagError;
use diag_probe::{open_camera, AnalyticsFetch, CameraProbe, DiagClient};
use serde_json::Value;
use std::path::Path;

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn banner(title: &str) -> Vec<String> {
    vec![rule('='), title.to_string(), rule('='), String::new()]
}

fn footer() -> Vec<String> {
    vec![String::new(), rule('=')]
}

/// Render a saved analytics document.
pub fn analytics_from_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    let mut lines = banner("🧪 Testing Pose Detection in Analytics");
    lines.push(format!("✅ Analytics loaded from {}", path.display()));
    lines.push(String::new());
    lines.extend(ReportRenderer::render_value(&value)?);
    lines.extend(footer());
    Ok(lines)
}

/// Fetch the configured user's analytics and render the outcome.
///
/// Connection failures, transport errors and non-200 responses become
/// operator guidance; a malformed document is an error.
pub async fn analytics_from_server(config: &DiagConfig) -> Result<Vec<String>> {
    let client = DiagClient::new(&config.server)?;
    let user_id = &config.server.user_id;

    let mut lines = banner("🧪 Testing Pose Detection in Analytics");
    match client.fetch_analytics(user_id).await {
        Ok(AnalyticsFetch::Found(value)) => {
            lines.push("✅ Analytics API Response Received".to_string());
            lines.push(String::new());
            lines.extend(ReportRenderer::render_value(&value)?);
        }
        Ok(AnalyticsFetch::NoSession) => {
            lines.extend(no_session_lines(user_id, client.base_url().as_str()));
        }
        Ok(AnalyticsFetch::Failed { status, body }) => {
            lines.push(format!("❌ Error: HTTP {}", status));
            lines.push(body);
        }
        Err(DiagError::Unreachable { url, .. }) => {
            tracing::debug!("Unreachable: {}", url);
            lines.extend(unreachable_lines(&config.server));
        }
        Err(DiagError::Http(e)) => {
            tracing::warn!("Analytics request failed: {}", e);
            lines.push(format!("❌ Unexpected error: {}", e));
        }
        Err(e) => return Err(e.into()),
    }
    lines.extend(footer());
    Ok(lines)
}

/// Probe the current-pose endpoint; every failure is reported inline.
pub async fn pose_probe(config: &DiagConfig) -> Result<Vec<String>> {
    let client = DiagClient::new(&config.server)?;

    let mut lines = vec![String::new(), "Testing API response...".to_string()];
    match client.probe_current_pose().await {
        Ok(probe) => lines.extend(probe.lines()),
        Err(DiagError::Unreachable { .. }) => lines.extend(unreachable_lines(&config.server)),
        Err(e) => lines.push(format!("❌ API Error: {}", e)),
    }
    Ok(lines)
}

/// Open the configured device and read frames from it.
pub fn camera_probe(config: &CameraConfig) -> Result<Vec<String>> {
    let mut lines = vec!["Testing camera directly...".to_string()];

    let mut source = match open_camera(config.device) {
        Ok(source) => source,
        Err(DiagError::Camera(reason)) => {
            tracing::warn!("{}", reason);
            lines.push(format!("   {}", reason));
            None
        }
        Err(e) => return Err(e.into()),
    };

    let probe = CameraProbe::new(config.frames, config.interval());
    let report = probe.run(source.as_deref_mut());
    tracing::info!(
        opened = report.opened,
        frames_read = report.frames_read(),
        "Camera probe finished"
    );
    lines.extend(report.lines());
    Ok(lines)
}

fn no_session_lines(user_id: &str, base_url: &str) -> Vec<String> {
    vec![
        format!("❌ No sessions found for {}", user_id),
        String::new(),
        "📹 To record a session:".to_string(),
        format!("   1. Open {} in browser", base_url),
        "   2. Show your hand to the camera".to_string(),
        "   3. Make different poses (palm, 1, 2, 3, fist)".to_string(),
        "   4. Wait for auto-stop or move hand away".to_string(),
        "   5. Run this check again".to_string(),
    ]
}

fn unreachable_lines(server: &ServerConfig) -> Vec<String> {
    let mut lines = vec![
        format!("❌ Cannot connect to FlowState server at {}", server.base_url),
        String::new(),
        "Make sure the server is running:".to_string(),
    ];
    lines.extend(server.start_hint.iter().map(|step| format!("  {}", step)));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_session_lines_name_user_and_url() {
        let lines = no_session_lines("default_user", "http://localhost:5001/");
        assert_eq!(lines[0], "❌ No sessions found for default_user");
        assert!(lines.contains(&"   1. Open http://localhost:5001/ in browser".to_string()));
    }

    #[test]
    fn test_unreachable_lines_include_start_hint() {
        let server = ServerConfig::default();
        let lines = unreachable_lines(&server);
        assert!(lines[0].contains("http://localhost:5001"));
        assert!(lines.contains(&"  cd FlowState/".to_string()));
        assert!(lines.contains(&"  python3 app_with_data.py".to_string()));
    }

    #[test]
    fn test_analytics_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("analytics.json");
        std::fs::write(
            &path,
            r#"{"poseStatistics": {"fist": {"count": 5, "averageConfidence": 0.81, "percentage": 25.0},
                                  "palm": {"count": 15, "averageConfidence": 0.92, "percentage": 75.0}}}"#,
        )
        .unwrap();

        let lines = analytics_from_file(&path).unwrap();
        let palm = lines.iter().position(|l| l.contains("PALM")).unwrap();
        let fist = lines.iter().position(|l| l.contains("FIST")).unwrap();
        assert!(palm < fist);
        assert!(lines.contains(&"Total pose detections: 20".to_string()));
        assert_eq!(lines.last().unwrap(), &rule('='));
    }

    #[test]
    fn test_analytics_from_missing_file_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = analytics_from_file(&tmp.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("cannot read"), "got: {err}");
    }

    #[cfg(not(feature = "opencv"))]
    #[test]
    fn test_camera_probe_without_backend_reports_unavailable() {
        let lines = camera_probe(&CameraConfig::default()).unwrap();
        assert_eq!(lines[0], "Testing camera directly...");
        assert_eq!(lines.last().unwrap(), "❌ Camera not available");
    }

    /// Serve `body` as a 200 text response for every analytics request.
    async fn spawn_text_server(body: &'static str) -> DiagConfig {
        use axum::routing::get;

        let app = axum::Router::new()
            .route("/api/user/{user}/analytics", get(move || async move { body }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut config = DiagConfig::default();
        config.server.base_url = format!("http://{}", addr);
        config
    }

    #[tokio::test]
    async fn test_non_json_body_reported_inline() {
        let config = spawn_text_server("<html>oops</html>").await;
        let lines = analytics_from_server(&config).await.unwrap();
        assert!(lines.iter().any(|l| l.starts_with("❌ Unexpected error: ")));
        assert_eq!(lines.last().unwrap(), &rule('='));
    }

    #[tokio::test]
    async fn test_malformed_fetched_document_is_error() {
        let config = spawn_text_server(r#"{"poseStatistics": {"palm": {"count": -1}}}"#).await;
        let err = analytics_from_server(&config).await.unwrap_err();
        assert!(err.to_string().contains("Malformed analytics document"), "got: {err}");
    }

    #[tokio::test]
    async fn test_unreachable_server_prints_guidance() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = DiagConfig::default();
        config.server.base_url = format!("http://{}", addr);

        let lines = analytics_from_server(&config).await.unwrap();
        assert!(lines.iter().any(|l| l.starts_with("❌ Cannot connect")));

        let lines = pose_probe(&config).await.unwrap();
        assert!(lines.iter().any(|l| l.starts_with("❌ Cannot connect")));
    }
}
