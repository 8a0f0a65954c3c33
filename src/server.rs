//! Minimal HTTP front for a monitoring store: `GET /?ajax=1` answers with the
//! wire document, plain `GET /` with an HTML page that embeds the same
//! document for a browser dashboard to pick up.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use color_eyre::eyre::WrapErr;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dashboard::AlertDisplay;
use crate::source::wire::WirePayload;
use crate::source::DataSource;
use crate::util::{format_dust, format_gas, format_temperature};

#[derive(Clone)]
pub struct ServerState {
    source: Arc<dyn DataSource>,
    alert_limit: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    ajax: Option<String>,
}

pub fn router(source: Arc<dyn DataSource>, alert_limit: usize) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .with_state(ServerState {
            source,
            alert_limit,
        })
}

pub async fn serve(
    source: Arc<dyn DataSource>,
    alert_limit: usize,
    bind: SocketAddr,
) -> color_eyre::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .wrap_err_with(|| format!("failed to bind {bind}"))?;
    info!(%bind, source = %source.describe(), "serving dashboard");
    axum::serve(listener, router(source, alert_limit)).await?;
    Ok(())
}

async fn dashboard_handler(
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> Response {
    let ajax = query.ajax.is_some();
    debug!(ajax, "dashboard request");

    // Store access blocks; keep it off the async workers.
    let source = Arc::clone(&state.source);
    let limit = state.alert_limit;
    let snapshot = match tokio::task::spawn_blocking(move || source.snapshot(limit)).await {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(err)) => {
            warn!(error = %err, "snapshot query failed");
            return unavailable(ajax, &err.to_string());
        }
        Err(err) => {
            warn!(error = %err, "snapshot task did not complete");
            return unavailable(ajax, "internal error");
        }
    };

    let payload = WirePayload::from_snapshot(&snapshot);
    if ajax {
        return Json(payload).into_response();
    }
    match render_page(&payload) {
        Ok(page) => Html(page).into_response(),
        Err(err) => {
            warn!(error = %err, "failed to encode page state");
            unavailable(false, "internal error")
        }
    }
}

fn unavailable(ajax: bool, message: &str) -> Response {
    if ajax {
        let body = serde_json::json!({ "error": message });
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    } else {
        let page = format!(
            "<!doctype html>\n<html>\n<head><title>Mine Environmental Monitoring</title></head>\n\
             <body><h1>Monitoring data unavailable</h1><pre>{}</pre></body>\n</html>\n",
            html_escape(message)
        );
        (StatusCode::SERVICE_UNAVAILABLE, Html(page)).into_response()
    }
}

fn render_page(payload: &WirePayload) -> Result<String, serde_json::Error> {
    // A literal "</" would end the script element early.
    let state = serde_json::to_string(payload)?.replace("</", "<\\/");

    let mut rows = String::new();
    for reading in payload.sensor_data.values() {
        let name = reading
            .location_name
            .clone()
            .unwrap_or_else(|| format!("Location {}", reading.location_id));
        rows.push_str(&format!(
            "      <tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&name),
            format_temperature(reading.temperature),
            format_gas(reading.co2),
            html_escape(&format_dust(reading.pm25)),
        ));
    }

    let mut alerts = String::new();
    for alert in payload.alerts.iter().map(AlertDisplay::from_alert) {
        alerts.push_str(&format!(
            "    <div class=\"alert {}\"><span>{}</span> <time>{}</time> <button>{}</button></div>\n",
            alert.class,
            html_escape(&alert.message),
            html_escape(&alert.time),
            alert.action,
        ));
    }
    if alerts.is_empty() {
        alerts.push_str("    <p>No recent alerts</p>\n");
    }

    Ok(format!(
        r#"<!doctype html>
<html>
<head>
  <meta charset="utf-8">
  <title>Mine Environmental Monitoring</title>
</head>
<body>
  <h1>Mine Environmental Monitoring</h1>
  <table>
    <thead><tr><th>Location</th><th>Temperature</th><th>Gas</th><th>Dust</th></tr></thead>
    <tbody>
{rows}    </tbody>
  </table>
  <h2>Recent Alerts</h2>
  <section id="alerts">
{alerts}  </section>
  <script id="dashboard-state" type="application/json">{state}</script>
</body>
</html>
"#
    ))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::sqlite::tests::seeded;
    use crate::source::{wire, Alert, Location, ReadingMap, SourceError};

    struct DownSource;

    impl DataSource for DownSource {
        fn describe(&self) -> String {
            "down".into()
        }

        fn locations(&self) -> Result<Vec<Location>, SourceError> {
            Err(SourceError::Transport("connection refused".into()))
        }

        fn latest_readings(&self) -> Result<ReadingMap, SourceError> {
            Err(SourceError::Transport("connection refused".into()))
        }

        fn recent_alerts(&self, _limit: usize) -> Result<Vec<Alert>, SourceError> {
            Err(SourceError::Transport("connection refused".into()))
        }
    }

    fn state(source: Arc<dyn DataSource>) -> State<ServerState> {
        State(ServerState {
            source,
            alert_limit: 3,
        })
    }

    async fn body_text(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn ajax_returns_wire_document() {
        let query = Query(PageQuery {
            ajax: Some("1".into()),
        });
        let resp = dashboard_handler(state(Arc::new(seeded())), query).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let payload = wire::decode(&body_text(resp).await).unwrap();
        assert_eq!(payload.sensor_data.len(), 2);
        assert_eq!(payload.alerts.len(), 3);
        assert_eq!(payload.alerts[0].alert_type, "gas");
    }

    #[tokio::test]
    async fn page_embeds_state() {
        let resp = dashboard_handler(state(Arc::new(seeded())), Query(PageQuery::default())).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_text(resp).await;
        assert!(body.contains(r#"<script id="dashboard-state" type="application/json">"#));
        assert!(body.contains("\"sensorData\""));
        assert!(body.contains("<td>Level 1 North</td>"));
        assert!(body.contains("<td>1200ppm</td>"));
    }

    #[tokio::test]
    async fn page_lists_alerts_by_severity_class() {
        let resp = dashboard_handler(state(Arc::new(seeded())), Query(PageQuery::default())).await;
        let body = body_text(resp).await;
        assert!(body.contains(
            r#"<div class="alert alert-danger"><span>Gas alert at Level 1 North (Value: 1200)</span>"#
        ));
        assert!(body.contains("<button>Emergency</button>"));
        assert_eq!(body.matches(r#"class="alert alert-warning""#).count(), 2);
    }

    #[test]
    fn page_without_alerts_says_so() {
        let page = render_page(&WirePayload::default()).unwrap();
        assert!(page.contains("<p>No recent alerts</p>"));
    }

    #[tokio::test]
    async fn failing_store_is_unavailable() {
        let query = Query(PageQuery {
            ajax: Some(String::new()),
        });
        let resp = dashboard_handler(state(Arc::new(DownSource)), query).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(body_text(resp).await.contains("connection refused"));
    }

    #[test]
    fn script_close_is_escaped() {
        let mut payload = WirePayload::default();
        payload.alerts.push(Alert {
            severity: crate::source::Severity::Warning,
            alert_type: "</script><b>".into(),
            value: None,
            location_name: "A & B".into(),
            timestamp: chrono::DateTime::from_timestamp(0, 0).unwrap(),
        });
        let page = render_page(&payload).unwrap();
        assert!(!page.contains("</script><b>"));
        assert!(page.contains("<\\/script><b>"));
        assert!(page.contains("&lt;/script&gt;&lt;b&gt; alert at A &amp; B"));
    }
}
