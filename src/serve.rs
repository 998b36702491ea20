//! HTTP server for interactive dashboard mode
//!
//! `trendlens serve ./base.xlsx` → starts server, opens browser, recomputes
//! a view every time a selector changes

use crate::config::DashboardConfig;
use crate::data::{DataStore, Table};
use crate::filter::{Selection, Selections};
use crate::report::{html, Dashboard};
use crate::view::{InfluencerView, TrendOverview};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server};

const UNAVAILABLE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Trendlens | Data unavailable</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; background: #f8f9fa; color: #333; display: flex; align-items: center; justify-content: center; min-height: 100vh; margin: 0; }
        .box { background: white; border-top: 4px solid #d62728; border-radius: 12px; padding: 2rem 2.5rem; max-width: 640px; box-shadow: 0 4px 6px rgba(0,0,0,0.05); }
        h1 { font-size: 1.4rem; margin-bottom: 1rem; }
        code { background: #f0f2f6; padding: 2px 6px; border-radius: 4px; }
    </style>
</head>
<body>
    <div class="box">
        <h1>Could not load the dataset</h1>
        <p><code>{{SOURCE}}</code></p>
        <p>{{ERROR}}</p>
        <p>Fix the file and reload this page.</p>
    </div>
</body>
</html>
"#;

#[derive(Serialize)]
struct ApiResponse<T> {
    ok: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }
}

impl ApiResponse<()> {
    fn failure(error: String) -> Self {
        Self { ok: false, data: None, error: Some(error) }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    source: String,
    rows: Option<usize>,
}

/// Dataset and settings shared by every request
struct Session {
    store: DataStore,
    config: DashboardConfig,
    source: String,
}

impl Session {
    fn table(&mut self) -> Result<Arc<Table>, String> {
        self.store.load().map_err(|e| e.to_string())
    }
}

/// Start server, open browser, serve the dashboard
pub fn start(port: u16, path: PathBuf, config: DashboardConfig) -> std::io::Result<()> {
    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let url = format!("http://localhost:{}", port);
    let source = path.canonicalize().unwrap_or_else(|_| path.clone()).display().to_string();

    let mut session = Session {
        store: DataStore::new(path, config.data.clone()),
        config,
        source,
    };

    // Load up front so a broken file shows in the terminal too
    if let Err(e) = session.table() {
        tracing::warn!(source = %session.source, error = %e, "dataset not loaded yet");
    }

    tracing::info!(%url, source = %session.source, "dashboard server started");
    eprintln!("\n\x1b[1;34mTrendlens\x1b[0m");
    eprintln!("   {}", url);
    eprintln!("   Dataset: {}\n", session.source);

    if let Err(e) = open::that(&url) {
        tracing::debug!(error = %e, "could not open browser");
    }

    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, &mut session) {
            tracing::warn!(error = %e, "request failed");
        }
    }

    Ok(())
}

fn handle_request(request: Request, session: &mut Session) -> std::io::Result<()> {
    let url = request.url().to_string();
    let mut parts = url.splitn(2, '?');
    let path = parts.next().unwrap_or("/").to_string();
    let query = parts.next().unwrap_or("").to_string();
    let method = request.method().clone();

    tracing::debug!(%method, %path, %query, "request");

    match (&method, path.as_str()) {
        (&Method::Get, "/") => match session.table() {
            Ok(table) => {
                let dashboard =
                    Dashboard::build(&table, &session.source, &Selections::default(), &session.config);
                let page = html::render(&dashboard, true)?;
                respond(request, page, "text/html", 200)
            }
            Err(e) => {
                let page = UNAVAILABLE_HTML
                    .replace("{{SOURCE}}", &escape_html(&session.source))
                    .replace("{{ERROR}}", &escape_html(&e));
                respond(request, page, "text/html", 503)
            }
        },

        (&Method::Get, "/api/trends") => {
            let selections = parse_selections(&query);
            let result = session
                .table()
                .map(|table| TrendOverview::build(&table, &selections, &session.config));
            respond_api(request, result)
        }

        (&Method::Get, "/api/influencers") => {
            let selections = parse_selections(&query);
            let result = session
                .table()
                .map(|table| InfluencerView::build(&table, &selections, &session.config));
            respond_api(request, result)
        }

        (&Method::Get, "/api/health") => {
            let rows = session.table().ok().map(|t| t.len());
            let health = Health {
                status: if rows.is_some() { "ok" } else { "unavailable" },
                source: session.source.clone(),
                rows,
            };
            let json = serde_json::to_string(&ApiResponse::success(health))?;
            respond(request, json, "application/json", 200)
        }

        // 404
        _ => {
            let response = Response::from_string("Not found").with_status_code(404);
            request.respond(response)
        }
    }
}

fn respond_api<T: Serialize>(request: Request, result: Result<T, String>) -> std::io::Result<()> {
    match result {
        Ok(data) => {
            let json = serde_json::to_string(&ApiResponse::success(data))?;
            respond(request, json, "application/json", 200)
        }
        Err(e) => {
            tracing::warn!(error = %e, "dataset unavailable");
            let json = serde_json::to_string(&ApiResponse::failure(e))?;
            respond(request, json, "application/json", 500)
        }
    }
}

fn respond(request: Request, body: String, content_type: &str, status: u16) -> std::io::Result<()> {
    let mut response = Response::from_string(body).with_status_code(status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
        response = response.with_header(header);
    }
    request.respond(response)
}

/// Build selections from repeated query keys.
///
/// A key that is absent leaves its stage at `All`. A present key restricts
/// the stage to the non-empty values given, so `macro=` alone means nothing
/// is selected.
pub fn parse_selections(query: &str) -> Selections {
    let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(query).unwrap_or_else(|e| {
        tracing::warn!(%query, error = %e, "malformed query string ignored");
        Vec::new()
    });

    let mut channel: Option<Vec<String>> = None;
    let mut macro_trend: Option<Vec<String>> = None;
    let mut micro_trend: Option<Vec<String>> = None;
    let mut influencer = None;

    for (key, value) in pairs {
        let slot = match key.as_str() {
            "channel" => &mut channel,
            "macro" => &mut macro_trend,
            "micro" => &mut micro_trend,
            "influencer" => {
                if !value.is_empty() {
                    influencer = Some(value);
                }
                continue;
            }
            _ => {
                tracing::debug!(%key, "unknown query key");
                continue;
            }
        };
        let picked = slot.get_or_insert_with(Vec::new);
        if !value.is_empty() {
            picked.push(value);
        }
    }

    let selection = |picked: Option<Vec<String>>| picked.map(Selection::Only).unwrap_or_default();

    Selections {
        channel: selection(channel),
        macro_trend: selection(macro_trend),
        micro_trend: selection(micro_trend),
        influencer,
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
