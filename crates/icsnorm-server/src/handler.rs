//! HTTP routes.
//!
//! `GET /calendar.ics` runs the pipeline for one source and answers with the
//! normalized document, or `304` when the client already holds it.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, IF_NONE_MATCH};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use icsnorm_core::{TzStrategy, matches_if_none_match};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::ServerConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::pipeline::{NormalizeRequest, NormalizedOutput, Pipeline};

/// Media type of produced documents.
pub const CALENDAR_CONTENT_TYPE: &str = "text/calendar; charset=UTF-8";

const DOCS: &str = "\
GET /calendar.ics

  source        URL (http/https) or local path of the iCalendar source (required)
  start         window start, ISO-8601; default now - 7 days
  end           window end, ISO-8601; default now + 90 days
  tzid          output zone, IANA identifier; default from config
  default_tzid  zone for times without one; default from config
  tz_strategy   tzid | utc | floating; default from config

Responses carry a strong ETag. Send it back in If-None-Match to get 304.
";

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(pipeline: Pipeline, config: ServerConfig) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }
}

/// Builds the application router.
///
/// `/docs` is only mounted in the dev environment.
pub fn router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(root))
        .route("/calendar.ics", get(calendar_ics));
    if state.config.environment.is_dev() {
        router = router.route("/docs", get(docs));
    }
    router.with_state(state)
}

/// Raw query parameters. Empty values count as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarQuery {
    pub source: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub tzid: Option<String>,
    pub default_tzid: Option<String>,
    pub tz_strategy: Option<String>,
}

impl CalendarQuery {
    /// Resolves the query against configured defaults.
    pub fn into_request(self, config: &ServerConfig) -> ServiceResult<NormalizeRequest> {
        let source =
            present(self.source).ok_or_else(|| ServiceError::input("source", "missing"))?;
        let start = present(self.start)
            .map(|s| parse_instant(&s))
            .transpose()
            .map_err(|e| ServiceError::input("start/end", e))?;
        let end = present(self.end)
            .map(|s| parse_instant(&s))
            .transpose()
            .map_err(|e| ServiceError::input("start/end", e))?;
        let strategy = match present(self.tz_strategy) {
            Some(s) => s
                .parse::<TzStrategy>()
                .map_err(|e| ServiceError::input("tz_strategy", e))?,
            None => config.tz_strategy,
        };

        Ok(NormalizeRequest::new(source)
            .with_window(start, end)
            .with_tzid(present(self.tzid).unwrap_or_else(|| config.tzid.clone()))
            .with_default_tzid(
                present(self.default_tzid).unwrap_or_else(|| config.default_tzid.clone()),
            )
            .with_strategy(strategy))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parses an ISO-8601 instant into UTC.
///
/// Values without an offset are read as UTC; a bare date is midnight UTC.
pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(format!("not an ISO-8601 date or date-time: {:?}", value))
}

#[derive(Serialize)]
struct RootBody {
    ok: bool,
    msg: &'static str,
}

async fn root() -> Json<RootBody> {
    Json(RootBody {
        ok: true,
        msg: "Use /calendar.ics?source=<url>",
    })
}

async fn docs() -> &'static str {
    DOCS
}

#[instrument(name = "calendar_ics", skip_all)]
async fn calendar_ics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CalendarQuery>,
) -> Result<Response, ServiceError> {
    let request = query.into_request(&state.config)?;
    debug!(source = %request.source, strategy = %request.strategy, "Normalizing");
    let output = state.pipeline.run(&request).await?;
    Ok(respond(output, &headers, &state.config.cache_control()))
}

fn respond(output: NormalizedOutput, headers: &HeaderMap, cache_control: &str) -> Response {
    let etag = header_value(&output.etag);
    let cache_control = header_value(cache_control);

    let not_modified = headers
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|token| matches_if_none_match(token, &output.etag));
    if not_modified {
        debug!(etag = %output.etag, "Client copy is current");
        return (
            StatusCode::NOT_MODIFIED,
            [(ETAG, etag), (CACHE_CONTROL, cache_control)],
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static(CALENDAR_CONTENT_TYPE)),
            (ETAG, etag),
            (CACHE_CONTROL, cache_control),
        ],
        output.body,
    )
        .into_response()
}

// ETags are quoted hex and cache-control is ASCII, so this only drops
// values that could never be sent anyway.
fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static(""))
}
