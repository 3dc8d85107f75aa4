//! Conversions from external infrastructure errors into domain errors.

use calfeed_core::GatewayError;
use calfeed_domain::CalFeedError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CalFeedError);

impl From<InfraError> for CalFeedError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CalFeedError> for InfraError {
    fn from(value: CalFeedError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCalFeedError {
    fn into_calfeed(self) -> CalFeedError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CalFeedError */
/* -------------------------------------------------------------------------- */

impl IntoCalFeedError for HttpError {
    fn into_calfeed(self) -> CalFeedError {
        if self.is_timeout() {
            return CalFeedError::Timeout("HTTP request timed out".into());
        }

        if self.is_connect() {
            return CalFeedError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => CalFeedError::Auth(message),
                404 => CalFeedError::NotFound(message),
                429 => CalFeedError::RateLimited(message),
                400..=499 => CalFeedError::InvalidInput(message),
                _ => CalFeedError::Upstream(message),
            };
        }

        if self.is_decode() {
            return CalFeedError::Parse(self.to_string());
        }

        CalFeedError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_calfeed())
    }
}

/// Gateway view of a transport-level reqwest failure
pub fn gateway_error(err: &HttpError) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(err.to_string())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → CalFeedError */
/* -------------------------------------------------------------------------- */

impl IntoCalFeedError for std::io::Error {
    fn into_calfeed(self) -> CalFeedError {
        match self.kind() {
            std::io::ErrorKind::NotFound => CalFeedError::NotFound(self.to_string()),
            _ => CalFeedError::Cache(format!("I/O failure: {self}")),
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(value.into_calfeed())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json / toml → CalFeedError */
/* -------------------------------------------------------------------------- */

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(CalFeedError::Parse(value.to_string()))
    }
}

impl From<toml::de::Error> for InfraError {
    fn from(value: toml::de::Error) -> Self {
        InfraError(CalFeedError::Config(format!("invalid TOML: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn status_error(status: StatusCode) -> HttpError {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err()
    }

    #[tokio::test]
    async fn http_status_401_maps_to_auth_error() {
        let mapped: CalFeedError =
            InfraError::from(status_error(StatusCode::UNAUTHORIZED).await).into();
        match mapped {
            CalFeedError::Auth(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn http_status_429_maps_to_rate_limited() {
        let mapped: CalFeedError =
            InfraError::from(status_error(StatusCode::TOO_MANY_REQUESTS).await).into();
        assert!(matches!(mapped, CalFeedError::RateLimited(_)));
    }

    #[test]
    fn missing_file_maps_to_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "cache.json");
        let mapped: CalFeedError = InfraError::from(err).into();
        assert!(matches!(mapped, CalFeedError::NotFound(_)));
    }

    #[test]
    fn bad_toml_maps_to_config_error() {
        let err = toml::from_str::<toml::Value>("feeds = [").unwrap_err();
        let mapped: CalFeedError = InfraError::from(err).into();
        assert!(matches!(mapped, CalFeedError::Config(_)));
    }
}
