use std::collections::HashMap;

use anyhow::Context;
use clap::Args;
use mita_reqwest::ReqwestClient;
use serde_json::Value;

/// Arguments of `mita request`.
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// HTTP method: GET, POST, PUT or DELETE
    pub method: String,

    /// Base API path, or an absolute URL with --direct
    pub path: String,

    /// JSON object sent as body (POST/PUT) or query (GET/DELETE)
    #[arg(long, short = 'd')]
    pub data: Option<String>,

    /// Extra header as `Name: value`; may be repeated
    #[arg(long = "header", short = 'H')]
    pub headers: Vec<String>,

    /// Treat PATH as an absolute URL
    #[arg(long)]
    pub direct: bool,

    /// Print the whole response envelope instead of its payload
    #[arg(long)]
    pub envelope: bool,
}

impl RequestArgs {
    /// Sends the request and returns the JSON to print.
    pub async fn run(self, gateway: &ReqwestClient) -> anyhow::Result<Value> {
        let data = self.parse_data()?;
        let headers = self.parse_headers()?;
        let headers = (!headers.is_empty()).then_some(&headers);
        let method = self.method.as_str();

        let result = match (self.direct, self.envelope) {
            (false, false) => gateway.call(method, &self.path, data, headers).await,
            (true, false) => gateway.call_direct(method, &self.path, data, headers).await,
            (false, true) => gateway
                .call_envelope::<Value>(method, &self.path, data, headers)
                .await
                .and_then(|envelope| Ok(serde_json::to_value(envelope)?)),
            (true, true) => gateway
                .call_direct_envelope::<Value>(method, &self.path, data, headers)
                .await
                .and_then(|envelope| Ok(serde_json::to_value(envelope)?)),
        };

        result
            .map_err(mita_core::Error::from)
            .with_context(|| format!("{} {} failed", self.method, self.path))
    }

    fn parse_data(&self) -> anyhow::Result<Option<Value>> {
        self.data
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .context("--data must be valid JSON")
    }

    fn parse_headers(&self) -> anyhow::Result<HashMap<String, String>> {
        self.headers
            .iter()
            .map(|header| {
                let (name, value) = header
                    .split_once(':')
                    .with_context(|| format!("header `{header}` must look like `Name: value`"))?;
                Ok((name.trim().to_owned(), value.trim().to_owned()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(data: Option<&str>, headers: &[&str]) -> RequestArgs {
        RequestArgs {
            method: "GET".into(),
            path: "/user/profile".into(),
            data: data.map(str::to_owned),
            headers: headers.iter().map(|h| (*h).to_owned()).collect(),
            direct: false,
            envelope: false,
        }
    }

    #[test]
    fn test_parses_data_and_headers() {
        let args = args(Some(r#"{"page": 1}"#), &["X-Trace: abc", "X-Empty:"]);
        assert_eq!(args.parse_data().unwrap(), Some(serde_json::json!({ "page": 1 })));

        let headers = args.parse_headers().unwrap();
        assert_eq!(headers["X-Trace"], "abc");
        assert_eq!(headers["X-Empty"], "");
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(args(Some("{oops"), &[]).parse_data().is_err());
        assert!(args(None, &["no-colon"]).parse_headers().is_err());
    }
}
