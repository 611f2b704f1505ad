//! Temperature sources: one fetcher per value.
//!
//! Provides a `TemperatureSource` trait with two implementations:
//! - **InsideClient**: local sensor whose body is the temperature itself
//! - **OutsideClient**: Open-Meteo forecast API, `current.temperature_2m`
//!
//! Both are stateless and never retry. Every call is bounded by the client
//! timeout; a timeout surfaces as `SourceError::Fetch`.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

use crate::config::SourcesConfig;
use crate::error::SourceError;

// ============================================================================
// TemperatureSource trait
// ============================================================================

/// Fetch a single temperature value (degrees Celsius) from one endpoint.
#[async_trait]
pub trait TemperatureSource: Send + Sync {
    async fn fetch(&self) -> Result<f64, SourceError>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

const INSIDE: &str = "inside";
const OUTSIDE: &str = "outside";

fn build_client(timeout: Duration, source_name: &str) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SourceError::fetch(source_name, format!("failed to build client: {}", e)))
}

/// Send the prepared GET and reject non-success statuses.
async fn get_ok(client: &Client, url: &str, source_name: &str) -> Result<Response, SourceError> {
    let response = client.get(url).send().await.map_err(|e| {
        let message = if e.is_timeout() {
            format!("request timed out: {}", e)
        } else {
            e.to_string()
        };
        SourceError::fetch(source_name, message)
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::fetch(
            source_name,
            status
                .canonical_reason()
                .map(|r| format!("{} {}", status.as_u16(), r))
                .unwrap_or_else(|| status.as_u16().to_string()),
        ));
    }

    Ok(response)
}

fn finite(value: f64, source_name: &str) -> Result<f64, SourceError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SourceError::parse(source_name, "temperature is not a finite number"))
    }
}

// ============================================================================
// InsideClient
// ============================================================================

/// Local sensor. Accepts a JSON number, a JSON string holding a number, or
/// plain numeric text.
#[derive(Debug, Clone)]
pub struct InsideClient {
    client: Client,
    url: String,
}

impl InsideClient {
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        Self::with_url(
            config.inside_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_url(url: String, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout, INSIDE)?,
            url,
        })
    }
}

/// Interpret a sensor body as a single temperature.
pub fn parse_inside_body(body: &str) -> Option<f64> {
    let trimmed = body.trim();
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Number(n)) => n.as_f64(),
        Ok(serde_json::Value::String(s)) => s.trim().parse().ok(),
        Ok(_) => None,
        Err(_) => trimmed.parse().ok(),
    }
}

#[async_trait]
impl TemperatureSource for InsideClient {
    async fn fetch(&self) -> Result<f64, SourceError> {
        let response = get_ok(&self.client, &self.url, self.name()).await?;
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::fetch(self.name(), e.to_string()))?;

        let value = parse_inside_body(&body).ok_or_else(|| {
            SourceError::parse(self.name(), format!("body is not a number: {:?}", body))
        })?;
        finite(value, self.name())
    }

    fn name(&self) -> &str {
        INSIDE
    }
}

// ============================================================================
// OutsideClient
// ============================================================================

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentWeather>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: Option<f64>,
}

/// Open-Meteo current-weather client for a fixed coordinate pair.
#[derive(Debug, Clone)]
pub struct OutsideClient {
    client: Client,
    base_url: String,
    latitude: f64,
    longitude: f64,
}

impl OutsideClient {
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        Self::with_base_url(
            config.outside_base_url.clone(),
            config.latitude,
            config.longitude,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Create a client against a custom base URL (for testing / self-hosted mirrors)
    pub fn with_base_url(
        base_url: String,
        latitude: f64,
        longitude: f64,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout, OUTSIDE)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            latitude,
            longitude,
        })
    }

    pub fn forecast_url(&self) -> String {
        format!(
            "{}/v1/forecast?latitude={}&longitude={}&current=temperature_2m",
            self.base_url, self.latitude, self.longitude
        )
    }
}

#[async_trait]
impl TemperatureSource for OutsideClient {
    async fn fetch(&self) -> Result<f64, SourceError> {
        let response = get_ok(&self.client, &self.forecast_url(), self.name()).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| SourceError::fetch(self.name(), e.to_string()))?;

        let forecast: ForecastResponse = serde_json::from_slice(&body)
            .map_err(|e| SourceError::parse(self.name(), format!("invalid JSON body: {}", e)))?;

        let value = forecast
            .current
            .and_then(|c| c.temperature_2m)
            .ok_or_else(|| SourceError::parse(self.name(), "missing current.temperature_2m"))?;
        finite(value, self.name())
    }

    fn name(&self) -> &str {
        OUTSIDE
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn outside_client(server: &MockServer) -> OutsideClient {
        OutsideClient::with_base_url(server.uri(), 42.7, 23.32, TIMEOUT)
            .expect("Failed to create client")
    }

    fn inside_client(server: &MockServer) -> InsideClient {
        InsideClient::with_url(format!("{}/temperaturec", server.uri()), TIMEOUT)
            .expect("Failed to create client")
    }

    #[test]
    fn test_parse_inside_body_variants() {
        assert_eq!(parse_inside_body("21.5"), Some(21.5));
        assert_eq!(parse_inside_body(" 21.5\n"), Some(21.5));
        assert_eq!(parse_inside_body("\"19.25\""), Some(19.25));
        assert_eq!(parse_inside_body("-4"), Some(-4.0));
        assert_eq!(parse_inside_body("{\"t\": 1}"), None);
        assert_eq!(parse_inside_body("warm"), None);
        assert_eq!(parse_inside_body(""), None);
    }

    #[tokio::test]
    async fn test_inside_returns_numeric_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/temperaturec"))
            .respond_with(ResponseTemplate::new(200).set_body_string("22.75"))
            .mount(&server)
            .await;

        let value = inside_client(&server).fetch().await.unwrap();
        assert_eq!(value, 22.75);
    }

    #[tokio::test]
    async fn test_inside_non_success_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        match inside_client(&server).fetch().await {
            Err(SourceError::Fetch { source_name, message }) => {
                assert_eq!(source_name, "inside");
                assert!(message.contains("503"), "message was {}", message);
            }
            other => panic!("Expected Fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inside_garbage_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = inside_client(&server).fetch().await.unwrap_err();
        assert!(err.is_parse(), "Expected Parse error, got {:?}", err);
    }

    #[tokio::test]
    async fn test_inside_unreachable_is_fetch_error() {
        // Nothing listens on port 9 of localhost in a test sandbox.
        let client = InsideClient::with_url("http://127.0.0.1:9/".to_string(), TIMEOUT).unwrap();
        let err = client.fetch().await.unwrap_err();
        assert!(matches!(err, SourceError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_errors_are_labelled_with_client_name() {
        let inside = InsideClient::with_url("http://127.0.0.1:9/".to_string(), TIMEOUT).unwrap();
        let outside =
            OutsideClient::with_base_url("http://127.0.0.1:9".to_string(), 0.0, 0.0, TIMEOUT)
                .unwrap();

        let sources: [&dyn TemperatureSource; 2] = [&inside, &outside];
        for source in sources {
            match source.fetch().await {
                Err(SourceError::Fetch { source_name, .. }) => {
                    assert_eq!(source_name, source.name());
                }
                other => panic!("Expected Fetch error, got {:?}", other),
            }
        }

        let err = outside.fetch().await.unwrap_err();
        assert!(
            err.to_string().starts_with("Error fetching outside temperature"),
            "{}",
            err
        );
        assert_eq!(inside.name(), INSIDE);
        assert_eq!(outside.name(), OUTSIDE);
    }

    #[tokio::test]
    async fn test_inside_timeout_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("20.0")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = InsideClient::with_url(server.uri(), Duration::from_millis(100)).unwrap();
        let err = client.fetch().await.unwrap_err();
        assert!(matches!(err, SourceError::Fetch { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_outside_reads_current_temperature() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "42.7"))
            .and(query_param("longitude", "23.32"))
            .and(query_param("current", "temperature_2m"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 42.7,
                "longitude": 23.32,
                "current_units": { "temperature_2m": "°C" },
                "current": { "time": "2024-03-01T12:00", "temperature_2m": 14.3 }
            })))
            .mount(&server)
            .await;

        let value = outside_client(&server).fetch().await.unwrap();
        assert_eq!(value, 14.3);
    }

    #[tokio::test]
    async fn test_outside_500_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = outside_client(&server).fetch().await.unwrap_err();
        assert!(matches!(err, SourceError::Fetch { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_outside_missing_field_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current": { "time": "2024-03-01T12:00" }
            })))
            .mount(&server)
            .await;

        match outside_client(&server).fetch().await {
            Err(SourceError::Parse { source_name, message }) => {
                assert_eq!(source_name, "outside");
                assert!(message.contains("temperature_2m"));
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_outside_missing_current_block_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": true, "reason": "Latitude must be in range"
            })))
            .mount(&server)
            .await;

        let err = outside_client(&server).fetch().await.unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_forecast_url_shape() {
        let client = OutsideClient::with_base_url(
            "https://api.open-meteo.com/".to_string(),
            42.5,
            -8.25,
            TIMEOUT,
        )
        .unwrap();
        assert_eq!(
            client.forecast_url(),
            "https://api.open-meteo.com/v1/forecast?latitude=42.5&longitude=-8.25&current=temperature_2m"
        );
    }

    #[tokio::test]
    async fn test_sources_usable_as_trait_objects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("18"))
            .mount(&server)
            .await;

        let source: Box<dyn TemperatureSource> = Box::new(inside_client(&server));
        assert_eq!(source.fetch().await.unwrap(), 18.0);
        assert_eq!(source.name(), "inside");
    }
}
