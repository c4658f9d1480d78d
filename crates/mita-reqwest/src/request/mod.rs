//! Request dispatch.
//!
//! All gateway calls funnel through [`ReqwestClient::dispatch`], which applies
//! the session headers, strips empty parameters and unwraps the response
//! envelope.

mod envelope;
mod method;
mod params;

use std::collections::HashMap;
use std::str::FromStr;

pub use envelope::ApiEnvelope;
pub use method::HttpMethod;
pub use params::{query_pairs, strip_empty};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::connect::{ReqwestClient, TRACING_TARGET};
use crate::error::{Error, Result};

impl ReqwestClient {
    /// Calls a base API endpoint and returns the unwrapped payload.
    ///
    /// `path` is appended to the configured API origin. `data` is sent as the
    /// JSON body for POST/PUT and as query parameters for GET/DELETE, with
    /// empty-string and `null` fields removed.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnsupportedMethod`] before any I/O when `method` is
    /// not GET, POST, PUT or DELETE; with [`Error::Timeout`] on timeouts; with
    /// [`Error::Status`] on non-200 responses and [`Error::Envelope`] when the
    /// envelope code is not a success code.
    pub async fn call<T>(
        &self,
        method: &str,
        path: &str,
        data: Option<Value>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.api_url(path);
        let envelope = self.request(method, &url, data, headers).await?;
        Ok(envelope.into_data()?)
    }

    /// Calls an absolute URL and returns the unwrapped payload.
    ///
    /// Behaves exactly like [`call`](Self::call) except that `url` is used
    /// verbatim.
    pub async fn call_direct<T>(
        &self,
        method: &str,
        url: &str,
        data: Option<Value>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let envelope = self.request(method, url, data, headers).await?;
        Ok(envelope.into_data()?)
    }

    /// Calls a base API endpoint and returns the whole envelope.
    pub async fn call_envelope<T>(
        &self,
        method: &str,
        path: &str,
        data: Option<Value>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        let url = self.api_url(path);
        let envelope = self.request(method, &url, data, headers).await?;
        Ok(envelope.into_typed()?)
    }

    /// Calls an absolute URL and returns the whole envelope.
    pub async fn call_direct_envelope<T>(
        &self,
        method: &str,
        url: &str,
        data: Option<Value>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        let envelope = self.request(method, url, data, headers).await?;
        Ok(envelope.into_typed()?)
    }

    async fn request(
        &self,
        method: &str,
        url: &str,
        data: Option<Value>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<ApiEnvelope<Value>> {
        let Ok(method) = HttpMethod::from_str(method) else {
            tracing::warn!(
                target: TRACING_TARGET,
                method,
                url,
                "Unsupported request method"
            );
            return Err(Error::UnsupportedMethod(method.to_owned()));
        };

        self.dispatch(method, url, data, headers).await
    }

    /// Sends one request and unwraps the envelope.
    pub(crate) async fn dispatch(
        &self,
        method: HttpMethod,
        url: &str,
        data: Option<Value>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<ApiEnvelope<Value>> {
        tracing::debug!(
            target: TRACING_TARGET,
            method = %method,
            url,
            "Dispatching request"
        );

        let data = data.map(strip_empty);
        let builder = self
            .http()
            .request(method.into(), url)
            .headers(self.request_headers(headers)?);

        let builder = if method.has_body() {
            let body = data.unwrap_or_else(|| Value::Object(Default::default()));
            builder.json(&body)
        } else {
            match data {
                Some(params) => builder.query(&query_pairs(&params)),
                None => builder,
            }
        };

        let response = builder.send().await.map_err(|err| {
            let err = Error::from_transport(err);
            tracing::warn!(
                target: TRACING_TARGET,
                method = %method,
                url,
                error = %err,
                timeout = err.is_timeout(),
                "Request failed"
            );
            err
        })?;

        let status = response.status();
        let body = response.text().await.map_err(Error::from_transport)?;

        if status != StatusCode::OK {
            if status == StatusCode::FORBIDDEN {
                tracing::warn!(target: TRACING_TARGET, url, "Permission denied");
            } else {
                tracing::warn!(
                    target: TRACING_TARGET,
                    url,
                    status = status.as_u16(),
                    "Request returned non-success status"
                );
            }
            return Err(Error::Status { status, body });
        }

        let raw: Value = serde_json::from_str(&body)?;
        let envelope: ApiEnvelope<Value> = serde_json::from_value(raw.clone())?;

        if !self.config().is_success_code(envelope.code) {
            tracing::debug!(
                target: TRACING_TARGET,
                url,
                code = envelope.code,
                request_id = envelope.request_id.as_deref(),
                "Request rejected by envelope code"
            );
            return Err(Error::Envelope {
                code: envelope.code,
                msg: envelope.msg,
                request_id: envelope.request_id,
                body: raw,
            });
        }

        tracing::debug!(
            target: TRACING_TARGET,
            url,
            code = envelope.code,
            "Request completed"
        );

        Ok(envelope)
    }

    /// Caller headers first, then session headers, which take precedence.
    fn request_headers(&self, extra: Option<&HashMap<String, String>>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (name, value) in extra.into_iter().flatten() {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidHeader(name.clone()))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }
        self.session().apply(&mut headers)?;
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::Router;
    use axum::extract::{Query, State};
    use axum::http::{HeaderMap as AxumHeaders, Method};
    use axum::routing::{any, get};
    use serde_json::json;

    use super::*;
    use crate::connect::{ReqwestConfig, SessionContext};

    async fn echo(
        method: Method,
        headers: AxumHeaders,
        Query(query): Query<HashMap<String, String>>,
        body: String,
    ) -> axum::Json<Value> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let body: Value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };

        axum::Json(json!({
            "code": 0,
            "msg": "",
            "requestId": "req-1",
            "data": {
                "method": method.as_str(),
                "authorization": header("authorization"),
                "language": header("accept-language"),
                "tenant": header("tenant-id"),
                "extra": header("x-extra"),
                "query": query,
                "body": body,
            }
        }))
    }

    async fn count(State(hits): State<Arc<AtomicUsize>>) -> axum::Json<Value> {
        hits.fetch_add(1, Ordering::SeqCst);
        axum::Json(json!({ "code": 0, "data": null }))
    }

    async fn spawn_server() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route("/echo", any(echo))
            .route("/count", any(count))
            .route(
                "/forbidden",
                get(|| async { (axum::http::StatusCode::FORBIDDEN, "no permission") }),
            )
            .route(
                "/rejected",
                get(|| async { axum::Json(json!({ "code": 500, "msg": "server busy" })) }),
            )
            .route(
                "/legacy",
                get(|| async { axum::Json(json!({ "code": 200, "data": { "ok": true } })) }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    axum::Json(json!({ "code": 0 }))
                }),
            )
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (format!("http://{addr}"), hits)
    }

    fn client_for(origin: &str) -> ReqwestClient {
        let session = SessionContext::default()
            .with_token("token-123")
            .with_language("en");
        let config = ReqwestConfig::new(origin)
            .with_timeout(1)
            .with_session(session);
        ReqwestClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_call_injects_session_headers() {
        let (origin, _) = spawn_server().await;
        let client = client_for(&origin);

        let extra = HashMap::from([
            ("x-extra".to_string(), "yes".to_string()),
            ("accept-language".to_string(), "fr".to_string()),
        ]);
        let data: Value = client.call("get", "/echo", None, Some(&extra)).await.unwrap();

        assert_eq!(data["method"], "GET");
        assert_eq!(data["authorization"], "Bearer token-123");
        assert_eq!(data["language"], "en");
        assert_eq!(data["tenant"], "1");
        assert_eq!(data["extra"], "yes");
    }

    #[tokio::test]
    async fn test_call_without_token_omits_authorization() {
        let (origin, _) = spawn_server().await;
        let client = ReqwestClient::new(ReqwestConfig::new(&origin)).unwrap();

        let data: Value = client.call("GET", "/echo", None, None).await.unwrap();
        assert_eq!(data["authorization"], Value::Null);
        assert_eq!(data["language"], "cn");
    }

    #[tokio::test]
    async fn test_post_strips_empty_body_fields() {
        let (origin, _) = spawn_server().await;
        let client = client_for(&origin);

        let body = json!({ "name": "a.glb", "desc": "", "tag": null, "size": 0 });
        let data: Value = client
            .call("POST", "/echo", Some(body), None)
            .await
            .unwrap();

        assert_eq!(data["method"], "POST");
        assert_eq!(data["body"], json!({ "name": "a.glb", "size": 0 }));
    }

    #[tokio::test]
    async fn test_put_without_data_sends_empty_object() {
        let (origin, _) = spawn_server().await;
        let client = client_for(&origin);

        let data: Value = client.call("put", "/echo", None, None).await.unwrap();
        assert_eq!(data["body"], json!({}));
    }

    #[tokio::test]
    async fn test_get_strips_empty_query_params() {
        let (origin, _) = spawn_server().await;
        let client = client_for(&origin);

        let params = json!({ "page": 2, "keyword": "", "owner": null, "sort": "desc" });
        let data: Value = client
            .call("DELETE", "/echo", Some(params), None)
            .await
            .unwrap();

        assert_eq!(data["method"], "DELETE");
        assert_eq!(data["query"], json!({ "page": "2", "sort": "desc" }));
        assert_eq!(data["body"], Value::Null);
    }

    #[tokio::test]
    async fn test_unsupported_method_never_reaches_server() {
        let (origin, hits) = spawn_server().await;
        let client = client_for(&origin);

        let err = client
            .call::<Value>("PATCH", "/count", Some(json!({ "a": 1 })), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::UnsupportedMethod(ref m) if m == "PATCH"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        let _: Value = client.call("GET", "/count", None, None).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_forbidden_status_is_rejected() {
        let (origin, _) = spawn_server().await;
        let client = client_for(&origin);

        let err = client
            .call::<Value>("GET", "/forbidden", None, None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert!(!err.is_timeout());
        assert_eq!(err.kind(), mita_core::ErrorKind::Authorization);
        let Error::Status { body, .. } = err else {
            panic!("expected status error");
        };
        assert_eq!(body, "no permission");
    }

    #[tokio::test]
    async fn test_envelope_code_is_rejected() {
        let (origin, _) = spawn_server().await;
        let client = client_for(&origin);

        let err = client
            .call::<Value>("GET", "/rejected", None, None)
            .await
            .unwrap_err();

        let Error::Envelope { code, msg, body, .. } = err else {
            panic!("expected envelope error");
        };
        assert_eq!(code, 500);
        assert_eq!(msg.as_deref(), Some("server busy"));
        assert_eq!(body["code"], 500);
    }

    #[tokio::test]
    async fn test_success_codes_are_configurable() {
        let (origin, _) = spawn_server().await;

        let lenient = client_for(&origin);
        let data: Value = lenient.call("GET", "/legacy", None, None).await.unwrap();
        assert_eq!(data["ok"], true);

        let strict =
            ReqwestClient::new(ReqwestConfig::new(&origin).with_success_codes([0])).unwrap();
        let err = strict
            .call::<Value>("GET", "/legacy", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Envelope { code: 200, .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_distinct() {
        let (origin, _) = spawn_server().await;
        let client = client_for(&origin);

        let err = client
            .call::<Value>("GET", "/slow", None, None)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "http timeout");
        assert_eq!(err.kind(), mita_core::ErrorKind::Timeout);
        assert!(err.status().is_none());
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(&format!("http://{addr}"));
        let err = client
            .call::<Value>("GET", "/echo", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert!(!err.is_timeout());
        assert_eq!(err.kind(), mita_core::ErrorKind::NetworkError);
    }

    #[tokio::test]
    async fn test_call_direct_uses_full_url() {
        let (origin, _) = spawn_server().await;
        let client = client_for("http://unused.invalid");

        let data: Value = client
            .call_direct("GET", &format!("{origin}/echo"), None, None)
            .await
            .unwrap();
        assert_eq!(data["tenant"], "1");
    }

    #[tokio::test]
    async fn test_call_envelope_keeps_metadata() {
        let (origin, _) = spawn_server().await;
        let client = client_for(&origin);

        let envelope: ApiEnvelope<Value> = client
            .call_envelope("GET", "/echo", None, None)
            .await
            .unwrap();
        assert_eq!(envelope.code, 0);
        assert_eq!(envelope.request_id.as_deref(), Some("req-1"));
        assert_eq!(envelope.data.unwrap()["method"], "GET");
    }
}
