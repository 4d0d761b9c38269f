//! Current-conditions lookup against a wttr.in-compatible JSON endpoint.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("city name is empty")]
    EmptyCity,
    #[error("request failed: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("unexpected response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            WeatherError::Timeout
        } else {
            WeatherError::Network(e.to_string())
        }
    }
}

/// Anything that can answer "what is the weather in this city right now".
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherReport, WeatherError>;
}

/// Current conditions for one city. Missing fields hold `"N/A"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherReport {
    pub city: String,
    pub temp_c: String,
    pub condition: String,
    pub humidity: String,
    pub wind_kmph: String,
    pub feels_like_c: String,
}

impl WeatherReport {
    /// Extract the first `current_condition` entry of a `format=j1` body.
    pub fn from_json(city: &str, body: &serde_json::Value) -> Result<Self, WeatherError> {
        let current = body["current_condition"]
            .as_array()
            .and_then(|conditions| conditions.first())
            .ok_or_else(|| WeatherError::Parse("missing current_condition".to_string()))?;

        Ok(Self {
            city: city.to_string(),
            temp_c: field_text(&current["temp_C"]),
            condition: field_text(&current["weatherDesc"][0]["value"]),
            humidity: field_text(&current["humidity"]),
            wind_kmph: field_text(&current["windspeedKmph"]),
            feels_like_c: field_text(&current["FeelsLikeC"]),
        })
    }
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "🌤️ Weather in {}: {}°C, {}, Humidity: {}%, Wind: {} km/h, Feels like: {}°C",
            self.city,
            self.temp_c,
            self.condition,
            self.humidity,
            self.wind_kmph,
            self.feels_like_c
        )
    }
}

fn field_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// HTTP weather client.
pub struct WeatherClient {
    base_url: String,
    http: reqwest::Client,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }

    /// URL for the JSON, metric, English rendition of a city's weather.
    pub fn url_for(&self, city: &str) -> String {
        format!(
            "{}/{}?format=j1&m&lang=en",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(city.trim())
        )
    }
}

#[async_trait]
impl WeatherLookup for WeatherClient {
    async fn current(&self, city: &str) -> Result<WeatherReport, WeatherError> {
        if city.trim().is_empty() {
            return Err(WeatherError::EmptyCity);
        }

        let url = self.url_for(city);
        debug!(%city, "weather lookup");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        WeatherReport::from_json(city, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_body() -> serde_json::Value {
        serde_json::json!({
            "current_condition": [{
                "temp_C": "18",
                "weatherDesc": [{ "value": "Clear" }],
                "humidity": "40",
                "windspeedKmph": "10",
                "FeelsLikeC": "17"
            }]
        })
    }

    #[test]
    fn formats_all_fields_and_city() {
        let report = WeatherReport::from_json("Paris", &sample_body()).unwrap();
        let text = report.to_string();
        for needle in ["Paris", "18", "Clear", "40", "10", "17"] {
            assert!(text.contains(needle), "missing {needle} in {text}");
        }
        assert_eq!(
            text,
            "🌤️ Weather in Paris: 18°C, Clear, Humidity: 40%, Wind: 10 km/h, Feels like: 17°C"
        );
    }

    #[test]
    fn absent_fields_render_not_available() {
        let body = serde_json::json!({ "current_condition": [{ "temp_C": "5" }] });
        let report = WeatherReport::from_json("Oslo", &body).unwrap();
        assert_eq!(report.temp_c, "5");
        assert_eq!(report.condition, "N/A");
        assert_eq!(report.humidity, "N/A");
        assert_eq!(report.wind_kmph, "N/A");
        assert_eq!(report.feels_like_c, "N/A");
    }

    #[test]
    fn numeric_fields_are_accepted() {
        let body = serde_json::json!({ "current_condition": [{ "temp_C": 21, "humidity": 55 }] });
        let report = WeatherReport::from_json("Lima", &body).unwrap();
        assert_eq!(report.temp_c, "21");
        assert_eq!(report.humidity, "55");
    }

    #[test]
    fn missing_current_condition_is_parse_error() {
        let err = WeatherReport::from_json("Nowhere", &serde_json::json!({})).unwrap_err();
        assert!(matches!(err, WeatherError::Parse(_)));
    }

    #[test]
    fn url_escapes_city_and_requests_metric_json() {
        let client = WeatherClient::new("https://wttr.in/", Duration::from_secs(6)).unwrap();
        assert_eq!(
            client.url_for(" São Paulo "),
            "https://wttr.in/S%C3%A3o%20Paulo?format=j1&m&lang=en"
        );
    }

    #[tokio::test]
    async fn empty_city_fails_without_request() {
        let client = WeatherClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let err = client.current("   ").await.unwrap_err();
        assert!(matches!(err, WeatherError::EmptyCity));
    }
}
