//! HTTP backend for the remote auth method service.
//!
//! Endpoints:
//!
//! - `POST   {addr}/v1/auth-methods`
//! - `GET    {addr}/v1/auth-methods/{id}`
//! - `PATCH  {addr}/v1/auth-methods/{id}` (`?automatic_versioning=true` when
//!   the service should resolve the version)
//! - `DELETE {addr}/v1/auth-methods/{id}`
//!
//! Error bodies look like `{"kind": "NotFound", "message": "..."}`; the
//! message is surfaced verbatim.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::traits::AuthMethodGateway;
use crate::types::{CreateRequest, Lookup, ResponseEnvelope, UpdateRequest};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    kind: Option<String>,
    message: Option<String>,
}

/// Gateway that talks to the remote service over HTTP.
pub struct HttpGateway {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl HttpGateway {
    /// Creates a gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Config` if the address is not an absolute
    /// http(s) URL or the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let base = Url::parse(&config.addr)
            .map_err(|e| GatewayError::Config(format!("invalid address {:?}: {e}", config.addr)))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(GatewayError::Config(format!(
                "address must be an http(s) URL, got {:?}",
                config.addr
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base,
            token: config.token,
        })
    }

    fn endpoint(&self, id: Option<&str>) -> Url {
        let mut url = self.base.clone();
        // `new` rejects cannot-be-a-base URLs, so segments are always available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["v1", "auth-methods"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut req = self.http.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req.header("Accept", "application/json")
    }

    async fn send(&self, req: RequestBuilder, op: &'static str) -> Result<Response, GatewayError> {
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(op, error = %e, "auth method request failed");
            GatewayError::transport(e.to_string())
        })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| GatewayError::transport(e.to_string()))?;
        tracing::debug!(op, status = status.as_u16(), "auth method response");
        Ok(Response { status, body })
    }
}

struct Response {
    status: StatusCode,
    body: String,
}

impl Response {
    /// Classifies the response: success with an optional JSON body, the
    /// not-found sentinel, or a rejection.
    fn into_lookup(self) -> Result<Lookup<Option<Value>>, GatewayError> {
        if self.status == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound);
        }
        if !self.status.is_success() {
            return Err(self.rejection());
        }
        self.into_body().map(Lookup::Found)
    }

    /// Parses the body of a successful response; an empty body is `None`.
    fn into_body(self) -> Result<Option<Value>, GatewayError> {
        if self.body.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&self.body)
            .map(Some)
            .map_err(|e| GatewayError::malformed(format!("response is not JSON: {e}")))
    }

    fn rejection(&self) -> GatewayError {
        let status = self.status.as_u16();
        match serde_json::from_str::<ErrorBody>(&self.body) {
            Ok(ErrorBody {
                kind,
                message: Some(message),
            }) => GatewayError::rejected(status, kind, message),
            _ => GatewayError::rejected(status, None, self.body.clone()),
        }
    }
}

fn envelope(body: Option<Value>) -> Result<Option<ResponseEnvelope>, GatewayError> {
    body.map(ResponseEnvelope::from_json).transpose()
}

#[async_trait]
impl AuthMethodGateway for HttpGateway {
    async fn create(
        &self,
        request: &CreateRequest,
    ) -> Result<Option<ResponseEnvelope>, GatewayError> {
        let req = self
            .request(Method::POST, self.endpoint(None))
            .json(&request.to_body());
        let resp = self.send(req, "create").await?;
        // The collection always exists, so a 404 here means the scope does not
        // and is a rejection like any other failure.
        if !resp.status.is_success() {
            return Err(resp.rejection());
        }
        envelope(resp.into_body()?)
    }

    async fn read(&self, id: &str) -> Result<Lookup<ResponseEnvelope>, GatewayError> {
        let req = self.request(Method::GET, self.endpoint(Some(id)));
        match self.send(req, "read").await?.into_lookup()? {
            Lookup::Found(Some(body)) => ResponseEnvelope::from_json(body).map(Lookup::Found),
            Lookup::Found(None) => Err(GatewayError::malformed("empty body on read")),
            Lookup::NotFound => Ok(Lookup::NotFound),
        }
    }

    async fn update(
        &self,
        request: &UpdateRequest,
    ) -> Result<Lookup<Option<ResponseEnvelope>>, GatewayError> {
        let mut url = self.endpoint(Some(&request.id));
        if request.is_automatic() {
            url.query_pairs_mut().append_pair("automatic_versioning", "true");
        }
        let req = self.request(Method::PATCH, url).json(&request.to_body());
        match self.send(req, "update").await?.into_lookup()? {
            Lookup::Found(body) => envelope(body).map(Lookup::Found),
            Lookup::NotFound => Ok(Lookup::NotFound),
        }
    }

    async fn delete(&self, id: &str) -> Result<Lookup<()>, GatewayError> {
        let req = self.request(Method::DELETE, self.endpoint(Some(id)));
        Ok(self.send(req, "delete").await?.into_lookup()?.map(|_| ()))
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_building() {
        let gateway = HttpGateway::new(GatewayConfig::new("https://auth.example.com")).unwrap();
        assert_eq!(
            gateway.endpoint(None).as_str(),
            "https://auth.example.com/v1/auth-methods"
        );
        assert_eq!(
            gateway.endpoint(Some("amoidc_1234")).as_str(),
            "https://auth.example.com/v1/auth-methods/amoidc_1234"
        );

        let gateway =
            HttpGateway::new(GatewayConfig::new("https://example.com/boundary/")).unwrap();
        assert_eq!(
            gateway.endpoint(None).as_str(),
            "https://example.com/boundary/v1/auth-methods"
        );
    }

    #[test]
    fn test_rejects_bad_addresses() {
        assert!(matches!(
            HttpGateway::new(GatewayConfig::new("not a url")),
            Err(GatewayError::Config(_))
        ));
        assert!(matches!(
            HttpGateway::new(GatewayConfig::new("ftp://example.com")),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_rejection_message_verbatim() {
        let resp = Response {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"kind":"InvalidArgument","message":"Error in provided request."}"#
                .to_string(),
        };
        assert_eq!(
            resp.rejection(),
            GatewayError::rejected(
                400,
                Some("InvalidArgument".to_string()),
                "Error in provided request."
            )
        );

        let resp = Response {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream unavailable".to_string(),
        };
        assert_eq!(
            resp.rejection(),
            GatewayError::rejected(502, None, "upstream unavailable")
        );
    }
}
