//! Normalization pipeline.
//!
//! One request flows through: validate parameters, fetch the source, parse,
//! expand over the window, build canonical events, serialize, fingerprint.
//! The fetch is async; the CPU-bound stages run on the blocking pool.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use icsnorm_core::{NormalizedDocument, TimeWindow, TzStrategy, fingerprint, parse_zone};
use icsnorm_providers::{
    DocumentFetcher, DocumentParser, IcsParser, OccurrenceExpander, RecurrenceExpander,
    SourceFetcher, build_all,
};
use tracing::{debug, info};

use crate::config::{DEFAULT_FALLBACK_TZID, DEFAULT_TZID, ServerConfig};
use crate::error::{ServerResult, ServiceError, ServiceResult};

/// Parameters of one normalization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeRequest {
    /// URL or local path of the source calendar.
    pub source: String,
    /// Window start; defaults to seven days before now.
    pub start: Option<DateTime<Utc>>,
    /// Window end; defaults to ninety days after now.
    pub end: Option<DateTime<Utc>>,
    /// Output zone identifier.
    pub tzid: String,
    /// Zone attached to naive source times.
    pub default_tzid: String,
    pub strategy: TzStrategy,
}

impl NormalizeRequest {
    /// Creates a request for `source` with default zones and strategy.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            start: None,
            end: None,
            tzid: DEFAULT_TZID.to_string(),
            default_tzid: DEFAULT_FALLBACK_TZID.to_string(),
            strategy: TzStrategy::default(),
        }
    }

    /// Builder method to set the window bounds.
    pub fn with_window(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    /// Builder method to set the output zone.
    pub fn with_tzid(mut self, tzid: impl Into<String>) -> Self {
        self.tzid = tzid.into();
        self
    }

    /// Builder method to set the fallback zone for naive times.
    pub fn with_default_tzid(mut self, tzid: impl Into<String>) -> Self {
        self.default_tzid = tzid.into();
        self
    }

    /// Builder method to set the rendering strategy.
    pub fn with_strategy(mut self, strategy: TzStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// A serialized document and its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedOutput {
    pub body: Vec<u8>,
    /// Strong ETag of `body`.
    pub etag: String,
    /// Number of events written.
    pub event_count: usize,
}

/// Drives the collaborators for each request.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn DocumentFetcher>,
    parser: Arc<dyn DocumentParser>,
    expander: Arc<dyn OccurrenceExpander>,
    fetch_timeout: Duration,
    document_name: String,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("fetch_timeout", &self.fetch_timeout)
            .field("document_name", &self.document_name)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline from explicit collaborators.
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        parser: Arc<dyn DocumentParser>,
        expander: Arc<dyn OccurrenceExpander>,
    ) -> Self {
        let defaults = ServerConfig::default();
        Self {
            fetcher,
            parser,
            expander,
            fetch_timeout: defaults.fetch_timeout(),
            document_name: defaults.document_name,
        }
    }

    /// Creates the standard pipeline (HTTP/file fetch, RFC 5545 parser,
    /// RRULE expander) configured from `config`.
    pub fn from_config(config: &ServerConfig) -> ServerResult<Self> {
        let pipeline = Self::new(
            Arc::new(SourceFetcher::new()?),
            Arc::new(IcsParser::new()),
            Arc::new(RecurrenceExpander::new()),
        )
        .with_fetch_timeout(config.fetch_timeout())
        .with_document_name(config.document_name.clone());
        Ok(pipeline)
    }

    /// Builder method to set the fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Builder method to set the document name.
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = name.into();
        self
    }

    /// Runs a request against the current time.
    pub async fn run(&self, request: &NormalizeRequest) -> ServiceResult<NormalizedOutput> {
        self.run_at(request, Utc::now()).await
    }

    /// Runs a request with `now` anchoring the default window.
    ///
    /// Parameters are validated before anything is fetched.
    pub async fn run_at(
        &self,
        request: &NormalizeRequest,
        now: DateTime<Utc>,
    ) -> ServiceResult<NormalizedOutput> {
        let target = parse_zone(&request.tzid).map_err(|e| ServiceError::input("tzid", e))?;
        let fallback =
            parse_zone(&request.default_tzid).map_err(|e| ServiceError::input("default_tzid", e))?;
        let window = TimeWindow::resolve(request.start, request.end, now)
            .map_err(|e| ServiceError::input("start/end", e))?;

        let bytes = self.fetcher.fetch(&request.source, self.fetch_timeout).await?;

        let parser = Arc::clone(&self.parser);
        let expander = Arc::clone(&self.expander);
        let name = self.document_name.clone();
        let strategy = request.strategy;

        let (body, event_count) = tokio::task::spawn_blocking(move || -> ServiceResult<_> {
            let calendar = parser.parse(&bytes)?;
            let occurrences = expander.expand(&calendar, &window)?;
            let events = build_all(&occurrences, target, fallback)?;
            let document = NormalizedDocument::new(name, target, events);
            let count = document.emittable_events().count();
            Ok((document.to_ics(strategy), count))
        })
        .await
        .map_err(|e| ServiceError::internal(format!("normalization task failed: {}", e)))??;

        let etag = fingerprint(&body);
        debug!(bytes = body.len(), %etag, "Serialized document");
        info!(
            source = %request.source,
            events = event_count,
            tzid = target.name(),
            strategy = %strategy,
            "Normalized calendar"
        );

        Ok(NormalizedOutput {
            body,
            etag,
            event_count,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use icsnorm_providers::{
        BoxFuture, ParsedCalendar, ProviderError, ProviderResult, RawOccurrence,
    };
    use std::sync::Mutex;

    pub(crate) const SAMPLE: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:E1\r\n\
SUMMARY:Standup\r\n\
DTSTART:20240110T090000Z\r\n\
DTEND:20240110T093000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    /// Serves fixed bytes, or fails like an unreachable upstream.
    pub(crate) struct StaticFetcher(pub Option<&'static str>);

    impl DocumentFetcher for StaticFetcher {
        fn fetch<'a>(
            &'a self,
            source: &'a str,
            _timeout: Duration,
        ) -> BoxFuture<'a, ProviderResult<Vec<u8>>> {
            let result = match self.0 {
                Some(body) => Ok(body.as_bytes().to_vec()),
                None => Err(ProviderError::network("connection refused").with_source_ref(source)),
            };
            Box::pin(async move { result })
        }
    }

    /// Records the window it was asked to expand.
    #[derive(Default)]
    struct RecordingExpander {
        windows: Mutex<Vec<TimeWindow>>,
    }

    impl OccurrenceExpander for RecordingExpander {
        fn expand(
            &self,
            _calendar: &ParsedCalendar,
            window: &TimeWindow,
        ) -> ProviderResult<Vec<RawOccurrence>> {
            self.windows.lock().unwrap().push(*window);
            Ok(Vec::new())
        }
    }

    pub(crate) fn static_pipeline(body: Option<&'static str>) -> Pipeline {
        Pipeline::new(
            Arc::new(StaticFetcher(body)),
            Arc::new(IcsParser::new()),
            Arc::new(RecurrenceExpander::new()),
        )
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()
    }

    fn wide_request() -> NormalizeRequest {
        NormalizeRequest::new("memory").with_window(
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
        )
    }

    #[tokio::test]
    async fn default_window_is_seven_days_back_ninety_ahead() {
        let expander = Arc::new(RecordingExpander::default());
        let pipeline = Pipeline::new(
            Arc::new(StaticFetcher(Some(SAMPLE))),
            Arc::new(IcsParser::new()),
            expander.clone(),
        );

        pipeline
            .run_at(&NormalizeRequest::new("memory"), fixed_now())
            .await
            .unwrap();

        let windows = expander.windows.lock().unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].start, Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap());
        assert_eq!(windows[0].end, Utc.with_ymd_and_hms(2024, 4, 9, 12, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn renders_and_fingerprints() {
        let pipeline = static_pipeline(Some(SAMPLE));
        let output = pipeline.run_at(&wide_request(), fixed_now()).await.unwrap();

        let text = String::from_utf8(output.body.clone()).unwrap();
        assert!(text.contains("DTSTART;TZID=Europe/Paris:20240110T100000\r\n"));
        assert_eq!(output.event_count, 1);
        assert_eq!(output.etag, fingerprint(&output.body));

        let again = pipeline.run_at(&wide_request(), fixed_now()).await.unwrap();
        assert_eq!(again, output);
    }

    #[tokio::test]
    async fn strategy_changes_output() {
        let pipeline = static_pipeline(Some(SAMPLE));
        let utc = pipeline
            .run_at(&wide_request().with_strategy(TzStrategy::Utc), fixed_now())
            .await
            .unwrap();
        let text = String::from_utf8(utc.body).unwrap();
        assert!(text.contains("DTSTART:20240110T090000Z\r\n"));
        assert!(!text.contains("VTIMEZONE"));
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn unknown_zone_is_input_error() {
            let pipeline = static_pipeline(None);
            let err = pipeline
                .run_at(&wide_request().with_tzid("Mars/Olympus"), fixed_now())
                .await
                .unwrap_err();
            // rejected before the failing fetch is attempted
            assert!(matches!(err, ServiceError::Input { param: "tzid", .. }));
        }

        #[tokio::test]
        async fn inverted_window_is_input_error() {
            let pipeline = static_pipeline(Some(SAMPLE));
            let request = NormalizeRequest::new("memory").with_window(
                Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
                Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            );
            let err = pipeline.run_at(&request, fixed_now()).await.unwrap_err();
            assert!(matches!(err, ServiceError::Input { param: "start/end", .. }));
        }

        #[tokio::test]
        async fn fetch_failure_is_upstream_error() {
            let pipeline = static_pipeline(None);
            let err = pipeline.run_at(&wide_request(), fixed_now()).await.unwrap_err();
            assert!(matches!(err, ServiceError::Upstream(_)));
        }

        #[tokio::test]
        async fn garbage_is_parse_error() {
            let pipeline = static_pipeline(Some("<html>maintenance</html>"));
            let err = pipeline.run_at(&wide_request(), fixed_now()).await.unwrap_err();
            assert!(matches!(err, ServiceError::Parse(_)));
        }
    }
}
