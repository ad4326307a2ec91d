//! Assembled request types.

use std::time::Duration;

use bytes::Bytes;
use slotmap::new_key_type;

new_key_type! {
    /// Identifies one outstanding request within its [`Session`](crate::Session).
    ///
    /// The ID is stable from [`Session::request`](crate::Session::request)
    /// until the request completes and its builder is released.
    pub struct RequestId;
}

/// HTTP request methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP DELETE method.
    Delete,
    /// HTTP PATCH method.
    Patch,
}

impl HttpMethod {
    /// Convert to the `http` crate's method type.
    pub fn as_http(self) -> http::Method {
        match self {
            Self::Get => http::Method::GET,
            Self::Post => http::Method::POST,
            Self::Put => http::Method::PUT,
            Self::Delete => http::Method::DELETE,
            Self::Patch => http::Method::PATCH,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
            Self::Delete => write!(f, "DELETE"),
            Self::Patch => write!(f, "PATCH"),
        }
    }
}

/// The body of an HTTP request.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    None,
    /// JSON body (serialized from a value).
    Json(serde_json::Value),
    /// Raw body, sent as-is.
    Raw(Bytes),
}

impl RequestBody {
    /// Encode the body to the bytes that go on the wire.
    ///
    /// Returns `None` for [`RequestBody::None`].
    pub fn to_bytes(&self) -> Option<Bytes> {
        match self {
            Self::None => None,
            Self::Json(value) => Some(Bytes::from(value.to_string())),
            Self::Raw(bytes) => Some(bytes.clone()),
        }
    }
}

/// A request ready to be handed to a transport.
///
/// Request filters receive `&mut Request` and may change any field before the
/// transport sees it. After dispatch the request is shared read-only with the
/// responses and errors it produces.
#[derive(Clone, Debug)]
pub struct Request {
    /// The ID of the builder that produced this request.
    pub id: RequestId,
    /// The HTTP method.
    pub method: HttpMethod,
    /// The resolved request URL, without query arguments.
    pub url: String,
    /// Request headers: session defaults merged with per-request headers.
    pub headers: http::HeaderMap,
    /// Query arguments in the order they were added.
    pub query: Vec<(String, String)>,
    /// Request body.
    pub body: RequestBody,
    /// Timeout to be enforced by the transport.
    pub timeout: Option<Duration>,
}

impl Request {
    /// Build the full URL with query arguments appended.
    pub fn full_url(&self) -> std::result::Result<url::Url, url::ParseError> {
        let mut url = url::Url::parse(&self.url)?;
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Get a header value as a string.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(url: &str, query: &[(&str, &str)]) -> Request {
        Request {
            id: RequestId::default(),
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: http::HeaderMap::new(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: RequestBody::None,
            timeout: None,
        }
    }

    #[test]
    fn full_url_appends_query_in_order() {
        let req = request(
            "https://api.example.com/users",
            &[("page", "2"), ("q", "a b"), ("page", "3")],
        );
        assert_eq!(
            req.full_url().unwrap().as_str(),
            "https://api.example.com/users?page=2&q=a+b&page=3"
        );
    }

    #[test]
    fn full_url_without_query_is_unchanged() {
        let req = request("https://api.example.com/users", &[]);
        assert_eq!(req.full_url().unwrap().as_str(), "https://api.example.com/users");
    }

    #[test]
    fn full_url_rejects_relative() {
        assert!(request("/users", &[]).full_url().is_err());
    }

    #[test]
    fn body_encoding() {
        assert_eq!(RequestBody::None.to_bytes(), None);
        let json = RequestBody::Json(serde_json::json!({"name": "a"}));
        assert_eq!(json.to_bytes().unwrap(), Bytes::from_static(br#"{"name":"a"}"#));
        let raw = RequestBody::Raw(Bytes::from_static(b"hello"));
        assert_eq!(raw.to_bytes().unwrap(), Bytes::from_static(b"hello"));
    }

    #[test]
    fn method_display() {
        assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
        assert_eq!(HttpMethod::Delete.as_http(), http::Method::DELETE);
    }
}
