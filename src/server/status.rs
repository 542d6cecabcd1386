//! HTML status page with Handlebars template engine

use chrono::SecondsFormat;
use handlebars::Handlebars;
use serde::Serialize;

use crate::models::TargetStatus;

/// Default status page template
///
/// Double-stash expressions are HTML-escaped, so URLs and error strings
/// cannot inject markup.
const STATUS_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Uptime Status</title>
</head>
<body>
<h1>Uptime Monitor</h1>
<table border="1">
<tr><th>ID</th><th>URL</th><th>Last Check</th><th>Status Code</th><th>Latency (ms)</th><th>OK</th><th>Error</th></tr>
{{#each rows}}
<tr><td>{{id}}</td><td>{{url}}</td><td>{{last_check}}</td><td>{{status_code}}</td><td>{{latency_ms}}</td><td>{{ok}}</td><td>{{error}}</td></tr>
{{/each}}
</table>
</body>
</html>
"#;

/// One table row, pre-formatted for display
#[derive(Debug, Serialize)]
struct StatusRow {
    id: i64,
    url: String,
    last_check: String,
    status_code: String,
    latency_ms: String,
    ok: String,
    error: String,
}

impl From<&TargetStatus> for StatusRow {
    fn from(status: &TargetStatus) -> Self {
        let check = status.last_check.as_ref();

        Self {
            id: status.target.id,
            url: status.target.url.clone(),
            last_check: check
                .map(|c| c.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_else(|| "never".to_string()),
            status_code: check
                .and_then(|c| c.status_code)
                .map(|s| s.to_string())
                .unwrap_or_default(),
            latency_ms: check
                .and_then(|c| c.latency_ms)
                .map(|ms| format!("{ms:.2}"))
                .unwrap_or_default(),
            ok: check.map(|c| c.ok.to_string()).unwrap_or_default(),
            error: check.and_then(|c| c.error.clone()).unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct StatusData {
    rows: Vec<StatusRow>,
}

/// Renders the status table
pub struct StatusPage {
    handlebars: Handlebars<'static>,
}

impl StatusPage {
    const TEMPLATE_NAME: &'static str = "status";

    /// Create a renderer with the built-in template
    pub fn new() -> Result<Self, String> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string(Self::TEMPLATE_NAME, STATUS_TEMPLATE)
            .map_err(|e| format!("Failed to register status template: {e}"))?;

        Ok(Self { handlebars })
    }

    /// Render one row per target
    pub fn render(&self, statuses: &[TargetStatus]) -> Result<String, String> {
        let data = StatusData {
            rows: statuses.iter().map(StatusRow::from).collect(),
        };

        self.handlebars
            .render(Self::TEMPLATE_NAME, &data)
            .map_err(|e| format!("Failed to render status page: {e}"))
    }
}
