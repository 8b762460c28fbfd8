use http::StatusCode;
use url::{Url, form_urlencoded};

use crate::socket::ClientSocket;

pub const CONTENT_TYPE_TEXT: &str = "text/plain;charset=utf-8";
pub const CONTENT_TYPE_HTML: &str = "text/html;charset=utf-8";
pub const CONTENT_TYPE_SVG: &str = "image/svg+xml";

/// Host independent view of an inbound request.
#[derive(Debug, Clone)]
pub struct Request {
    pathname: String,
    search_params: Vec<(String, String)>,
}

impl Request {
    /// Builds a request from an origin-form target (`/visit?page=foo`) or
    /// an absolute URL. An origin-form path is kept byte for byte.
    pub fn get(target: &str) -> Result<Self, url::ParseError> {
        if !target.starts_with('/') {
            let url = Url::parse(target)?;
            return Ok(Self::from_parts(url.path(), url.query()));
        }

        let target = target.split('#').next().unwrap_or(target);
        match target.split_once('?') {
            Some((path, query)) => Ok(Self::from_parts(path, Some(query))),
            None => Ok(Self::from_parts(target, None)),
        }
    }

    fn from_parts(path: &str, query: Option<&str>) -> Self {
        Self {
            pathname: path.to_string(),
            search_params: query
                .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                .unwrap_or_default(),
        }
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// First value of the query parameter `key`.
    pub fn search_param(&self, key: &str) -> Option<&str> {
        self.search_params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub cache_control: Option<&'static str>,
    pub body: String,
    pub web_socket: Option<ClientSocket>,
}

impl Response {
    fn empty(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            cache_control: None,
            body: String::new(),
            web_socket: None,
        }
    }

    fn with_body(content_type: &'static str, body: String) -> Self {
        Self {
            content_type: Some(content_type),
            body,
            ..Self::empty(StatusCode::OK)
        }
    }

    pub fn text(body: impl Into<String>) -> Self {
        Self::with_body(CONTENT_TYPE_TEXT, body.into())
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self::with_body(CONTENT_TYPE_HTML, body.into())
    }

    pub fn svg(body: impl Into<String>) -> Self {
        Self {
            cache_control: Some("no-cache"),
            ..Self::with_body(CONTENT_TYPE_SVG, body.into())
        }
    }

    pub fn not_found() -> Self {
        Self::empty(StatusCode::NOT_FOUND)
    }

    pub fn bad_request() -> Self {
        Self::empty(StatusCode::BAD_REQUEST)
    }

    pub fn internal_error() -> Self {
        Self::empty(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Upgrade response handing `client` over to the caller.
    pub fn switching_protocols(client: ClientSocket) -> Self {
        Self {
            web_socket: Some(client),
            ..Self::empty(StatusCode::SWITCHING_PROTOCOLS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_path_and_query() {
        let request = Request::get("/visit?page=foo&page=bar").unwrap();

        assert_eq!(request.pathname(), "/visit");
        assert_eq!(request.search_param("page"), Some("foo"));
        assert_eq!(request.search_param("missing"), None);
    }

    #[test]
    fn keeps_operator_paths_verbatim() {
        assert_eq!(Request::get("/+").unwrap().pathname(), "/+");
        assert_eq!(Request::get("/-").unwrap().pathname(), "/-");
    }

    #[test]
    fn double_slash_is_a_path_not_a_host() {
        assert_eq!(Request::get("//connect").unwrap().pathname(), "//connect");
        assert_eq!(Request::get("//+").unwrap().pathname(), "//+");

        let request = Request::get("//visit?page=foo").unwrap();
        assert_eq!(request.pathname(), "//visit");
        assert_eq!(request.search_param("page"), Some("foo"));
    }

    #[test]
    fn query_values_are_decoded() {
        let request = Request::get("/visit?page=a%20b+c").unwrap();
        assert_eq!(request.search_param("page"), Some("a b c"));
    }

    #[test]
    fn accepts_absolute_urls() {
        let request = Request::get("https://edge.example.com/connect").unwrap();
        assert_eq!(request.pathname(), "/connect");
    }

    #[test]
    fn error_responses_have_empty_bodies() {
        for response in [Response::not_found(), Response::bad_request()] {
            assert!(response.body.is_empty());
            assert!(response.content_type.is_none());
        }
    }
}
