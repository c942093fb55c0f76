use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use serde_json::Value;
use std::fmt::Debug;
use std::time::Duration;

use crate::config::Credentials;
use crate::endpoint::Endpoint;
use crate::error::AqsError;
use crate::model::DailyQuery;
use crate::query::QueryTemplate;

/// Request ceiling advertised by the AQS service.
const MAX_REQUESTS_PER_MINUTE: u64 = 100;
/// Round-trip time assumed already spent on the wire, credited against the pause.
const ASSUMED_LATENCY_MS: u64 = 100;

/// Minimum pause before each request: the 100-per-minute ceiling spread
/// evenly, minus the assumed request latency.
pub const DEFAULT_THROTTLE: Duration =
    Duration::from_millis(60_000 / MAX_REQUESTS_PER_MINUTE - ASSUMED_LATENCY_MS);

/// Fields every call must carry.
const CREDENTIAL_FIELDS: [&str; 2] = ["email", "key"];
/// Fields a daily-summary or monitors call must carry. Geographic fields are
/// not in this list: the box endpoints need none of state/county, and the
/// template itself reports whichever selector its URL does require.
const DAILY_FIELDS: [&str; 5] = ["email", "key", "param", "bdate", "edate"];

/// Minimal HTTP seam: fetch one URL, return the response body.
///
/// Production uses [`HttpTransport`]; tests substitute a canned transport that
/// records the URLs it was asked for.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn get(&self, url: &str) -> Result<String, AqsError>;
}

#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            http: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, AqsError> {
        let res = self.http.get(url).send().await.map_err(|source| AqsError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| AqsError::Request {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(AqsError::Http {
                url: url.to_string(),
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

/// Rate-limited client for the EPA AQS API.
///
/// Every call is an independent request: pause, validate, substitute the
/// endpoint template, GET, decode. There is no retry and no backoff; a failed
/// call is fail-stop for that one request and the caller decides policy. The
/// only state carried between calls is the base [`QueryTemplate`] the caller
/// chose to install, which is never mutated.
#[derive(Debug)]
pub struct AqsClient {
    credentials: Credentials,
    transport: Box<dyn Transport>,
    throttle: Duration,
    base: QueryTemplate,
}

impl AqsClient {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            transport: Box::new(HttpTransport::new()),
            throttle: DEFAULT_THROTTLE,
            base: QueryTemplate::new(),
        }
    }

    /// Installs a base template merged under every call's own parameters.
    pub fn with_base_template(mut self, base: QueryTemplate) -> Self {
        self.base = base;
        self
    }

    /// Overrides the pause before each request. Callers answering to a
    /// different ceiling (or tests) pick their own interval.
    pub fn with_throttle(mut self, interval: Duration) -> Self {
        self.throttle = interval;
        self
    }

    pub fn with_transport(mut self, transport: Box<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Calls one of the lookup endpoints (sign-up, classes, parameters,
    /// sites, monitors) and returns the parsed body.
    ///
    /// Missing email/key raises before any network I/O, naming the field;
    /// client credentials take precedence over template values.
    pub async fn list_info(
        &self,
        endpoint: Endpoint,
        overrides: &QueryTemplate,
    ) -> Result<Value, AqsError> {
        // The pause comes first, before validation, so the ceiling holds no
        // matter how the call ends.
        tokio::time::sleep(self.throttle).await;

        let params = self.merged_params(overrides);
        self.request(endpoint, &params, &CREDENTIAL_FIELDS).await
    }

    /// Calls a daily-summary (or monitors) endpoint for one query and returns
    /// the parsed body.
    ///
    /// Requires non-empty email, key, parameter codes and both date bounds on
    /// top of whatever the endpoint template itself asks for. A non-success
    /// status inside the body is returned as `Ok`; callers inspect the header.
    pub async fn daily_summary(
        &self,
        endpoint: Endpoint,
        query: &DailyQuery,
        overrides: &QueryTemplate,
    ) -> Result<Value, AqsError> {
        tokio::time::sleep(self.throttle).await;

        let params = query.overlay(self.merged_params(overrides))?;
        self.request(endpoint, &params, &DAILY_FIELDS).await
    }

    fn merged_params(&self, overrides: &QueryTemplate) -> QueryTemplate {
        self.base
            .merged(overrides)
            .set("email", self.credentials.email.clone())
            .set("key", self.credentials.key.clone())
    }

    async fn request(
        &self,
        endpoint: Endpoint,
        params: &QueryTemplate,
        required: &[&str],
    ) -> Result<Value, AqsError> {
        for field in required {
            params.require(field)?;
        }
        let url = endpoint.render(params)?;

        let body = match self.transport.get(&url).await {
            Ok(body) => body,
            Err(err) => {
                warn!("{endpoint}: {err}");
                return Err(err);
            }
        };

        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(source) => {
                let err = AqsError::Decode { url, source };
                warn!("{endpoint}: {err}");
                Err(err)
            }
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Area, daily_records, is_success};
    use crate::series::{YearlyAqi, mean_aqi};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    const DAILY_FIXTURE: &str = r#"{
        "Header": [{"status": "Success", "rows": 3}],
        "Data": [
            {"sample_duration": "24 HOUR", "observation_count": 1, "arithmetic_mean": 4.0, "aqi": 10},
            {"sample_duration": "24 HOUR", "observation_count": 1, "arithmetic_mean": 6.0, "aqi": null},
            {"sample_duration": "24 HOUR", "observation_count": 1, "arithmetic_mean": 9.0, "aqi": 20}
        ]
    }"#;

    const CLASSES_FIXTURE: &str = r#"{
        "Header": [{"status": "Success", "rows": 2}],
        "Data": [
            {"code": "AQI POLLUTANTS", "value_represented": "Pollutants with an AQI"},
            {"code": "CRITERIA", "value_represented": "Criteria Pollutants"}
        ]
    }"#;

    /// Serves a fixed body and records every URL it is asked for.
    #[derive(Debug)]
    struct StubTransport {
        body: String,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl StubTransport {
        fn new(body: &str) -> (Self, Arc<Mutex<Vec<String>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            let stub = Self {
                body: body.to_string(),
                calls: Arc::clone(&calls),
            };
            (stub, calls)
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn get(&self, url: &str) -> Result<String, AqsError> {
            self.calls.lock().unwrap().push(url.to_string());
            Ok(self.body.clone())
        }
    }

    fn creds() -> Credentials {
        Credentials {
            email: "me@example.org".into(),
            key: "secret".into(),
        }
    }

    fn client(body: &str) -> (AqsClient, Arc<Mutex<Vec<String>>>) {
        let (stub, calls) = StubTransport::new(body);
        let client = AqsClient::new(creds())
            .with_transport(Box::new(stub))
            .with_throttle(Duration::from_millis(1));
        (client, calls)
    }

    #[tokio::test]
    async fn missing_key_raises_before_any_network_io() {
        let (stub, calls) = StubTransport::new(CLASSES_FIXTURE);
        let client = AqsClient::new(Credentials {
            email: "me@example.org".into(),
            key: String::new(),
        })
        .with_transport(Box::new(stub))
        .with_throttle(Duration::from_millis(1));

        let err = client
            .list_info(Endpoint::ListClasses, &QueryTemplate::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AqsError::MissingField(ref f) if f == "key"));
        assert_eq!(calls.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn client_credentials_take_precedence_over_template_values() {
        let (client, calls) = client(CLASSES_FIXTURE);
        let overrides = QueryTemplate::new()
            .set("email", "stale@example.org")
            .set("key", "stale");

        client
            .list_info(Endpoint::ListClasses, &overrides)
            .await
            .expect("stubbed call");

        let urls = calls.lock().unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].contains("email=me@example.org"));
        assert!(urls[0].contains("key=secret"));
    }

    #[tokio::test]
    async fn county_fips_splits_into_state_and_county() {
        let (client, calls) = client(DAILY_FIXTURE);
        let query = DailyQuery::new("81102,88101,88502", "19850501", "19851031")
            .with_area(Area::CountyFips("46103".into()));

        client
            .daily_summary(Endpoint::DailyByCounty, &query, &QueryTemplate::new())
            .await
            .expect("stubbed call");

        let urls = calls.lock().unwrap();
        assert!(urls[0].contains("state=46&county=103"));
        assert!(urls[0].contains("bdate=19850501&edate=19851031"));
    }

    #[tokio::test]
    async fn daily_summary_requires_param_codes() {
        let (client, calls) = client(DAILY_FIXTURE);
        let query = DailyQuery::new("", "19850501", "19851031")
            .with_area(Area::CountyFips("46103".into()));

        let err = client
            .daily_summary(Endpoint::DailyByCounty, &query, &QueryTemplate::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AqsError::MissingField(ref f) if f == "param"));
        assert_eq!(calls.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn throttle_floor_holds_even_when_calls_fail() {
        let interval = Duration::from_millis(30);
        let (stub, _calls) = StubTransport::new(CLASSES_FIXTURE);
        let client = AqsClient::new(creds())
            .with_transport(Box::new(stub))
            .with_throttle(interval);

        let bad_query = DailyQuery::new("", "19850501", "19851031");

        let start = Instant::now();
        client
            .list_info(Endpoint::ListClasses, &QueryTemplate::new())
            .await
            .expect("stubbed call");
        client
            .daily_summary(Endpoint::DailyByCounty, &bad_query, &QueryTemplate::new())
            .await
            .expect_err("empty param codes");
        client
            .list_info(Endpoint::ListClasses, &QueryTemplate::new())
            .await
            .expect("stubbed call");

        assert!(start.elapsed() >= interval * 3);
    }

    #[tokio::test]
    async fn identical_calls_parse_identically() {
        let (client, _calls) = client(CLASSES_FIXTURE);

        let first = client
            .list_info(Endpoint::ListClasses, &QueryTemplate::new())
            .await
            .expect("stubbed call");
        let second = client
            .list_info(Endpoint::ListClasses, &QueryTemplate::new())
            .await
            .expect("stubbed call");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn undecodable_body_is_a_decode_error() {
        let (client, _calls) = client("<html>gateway timeout</html>");

        let err = client
            .list_info(Endpoint::ListClasses, &QueryTemplate::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AqsError::Decode { .. }));
    }

    #[tokio::test]
    async fn non_success_status_is_returned_not_raised() {
        let (client, _calls) =
            client(r#"{"Header": [{"status": "Failed", "error": ["bad request"]}]}"#);

        let body = client
            .list_info(Endpoint::ListClasses, &QueryTemplate::new())
            .await
            .expect("API-level failures are the caller's branch");

        assert!(!is_success(&body));
    }

    #[tokio::test]
    async fn yearly_mean_from_stubbed_daily_summaries() {
        let (client, _calls) = client(DAILY_FIXTURE);
        let query = DailyQuery::for_year("81102,88101,88502", 1985, "0501", "1031")
            .expect("valid window")
            .with_area(Area::StateCounty {
                state: "46".into(),
                county: "103".into(),
            });

        let body = client
            .daily_summary(Endpoint::DailyByCounty, &query, &QueryTemplate::new())
            .await
            .expect("stubbed call");
        assert!(is_success(&body));

        let records = daily_records(&body).expect("decode");
        let row = YearlyAqi {
            year: 1985,
            mean_aqi: mean_aqi(&records).expect("two non-null observations"),
        };

        assert_eq!(
            row,
            YearlyAqi {
                year: 1985,
                mean_aqi: 15.0
            }
        );
    }
}
