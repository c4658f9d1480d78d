//! Supported request methods.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// The request methods the gateway dispatches.
///
/// Parsing is case-insensitive; anything else is rejected before a request
/// is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    /// Parameters travel in the query string.
    Get,
    /// Parameters travel in the JSON body.
    Post,
    /// Parameters travel in the JSON body.
    Put,
    /// Parameters travel in the query string.
    Delete,
}

impl HttpMethod {
    /// Whether request data is sent as a JSON body rather than a query string.
    pub const fn has_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(HttpMethod::from_str("get").unwrap(), HttpMethod::Get);
        assert_eq!(HttpMethod::from_str("Post").unwrap(), HttpMethod::Post);
        assert_eq!(HttpMethod::from_str("PUT").unwrap(), HttpMethod::Put);
        assert_eq!(HttpMethod::from_str("delete").unwrap(), HttpMethod::Delete);
    }

    #[test]
    fn test_parse_rejects_other_methods() {
        for method in ["PATCH", "head", "OPTIONS", "", "GETS"] {
            assert!(HttpMethod::from_str(method).is_err(), "{method} parsed");
        }
    }

    #[test]
    fn test_body_methods() {
        assert!(HttpMethod::Post.has_body());
        assert!(HttpMethod::Put.has_body());
        assert!(!HttpMethod::Get.has_body());
        assert!(!HttpMethod::Delete.has_body());
    }

    #[test]
    fn test_display_uppercase() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
        assert_eq!(reqwest::Method::from(HttpMethod::Get), reqwest::Method::GET);
    }
}
