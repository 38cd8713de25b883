#![forbid(unsafe_code)]

use poem::error::ResponseError;
use poem::http::StatusCode;
use poem::web::Html;
use poem::{IntoResponse, Response};
use poem_openapi::Object;
use thiserror::Error;

use crate::utils::upstream::UpstreamError;

/// Error enumerates the errors returned by this application.
#[derive(Error, Debug)]
pub enum Errors {
    /// Input parameter logging.
    #[error("groupie_server input parameters:\n{}", .0)]
    InputParms(String),

    /// Inaccessible logger configuration file.
    #[error("Unable to access the Log4rs configuration file: {}", .0)]
    Log4rsInitialization(String),

    #[error("Reading application configuration file: {}", .0)]
    ReadingConfigFile(String),

    #[error("Unable to parse TOML file: {}", .0)]
    TOMLParseError(String),

    #[error("Unable to load templates from {}: {}", .0, .1)]
    TemplateInit(String, String),
}

// ***************************************************************************
//                               Page Errors
// ***************************************************************************
/** Failures of the HTML routes.  Each one renders as a small status page. */
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Not Found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    #[error("Internal Server Error: {}", .0)]
    InternalError(String),

    #[error("Bad Gateway: {}", .0)]
    BadGateway(String),
}

impl PageError {
    /// Map an upstream failure on the detail route.  Bad data from the
    /// upstream service is reported as a gateway problem rather than ours.
    pub fn from_detail_fetch(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Status { status: 404, .. } => PageError::NotFound,
            UpstreamError::Status { .. } | UpstreamError::Decode { .. } => PageError::BadGateway(e.to_string()),
            UpstreamError::Transport { .. } | UpstreamError::Client(_) => PageError::InternalError(e.to_string()),
        }
    }

    fn title(&self) -> &'static str {
        match self {
            PageError::NotFound => "404 Not Found",
            PageError::MethodNotAllowed => "405 Method Not Allowed",
            PageError::InternalError(_) => "500 Internal Server Error",
            PageError::BadGateway(_) => "502 Bad Gateway",
        }
    }
}

// Any other upstream failure is ours to report.
impl From<UpstreamError> for PageError {
    fn from(e: UpstreamError) -> Self {
        PageError::InternalError(e.to_string())
    }
}

impl From<tera::Error> for PageError {
    fn from(e: tera::Error) -> Self {
        PageError::InternalError(format!("template rendering failed: {:?}", e))
    }
}

impl ResponseError for PageError {
    fn status(&self) -> StatusCode {
        match self {
            PageError::NotFound => StatusCode::NOT_FOUND,
            PageError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            PageError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PageError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }

    // Upstream details go to the log, never to the page.
    fn as_response(&self) -> Response {
        let title = self.title();
        let body = format!(
            "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title>\
             <link rel=\"stylesheet\" href=\"/HTML/style.css\"></head>\
             <body><main class=\"error\"><h1>{title}</h1><p><a href=\"/\">Back to artists</a></p></main></body></html>\n");
        Html(body).with_status(self.status()).into_response()
    }
}

// ***************************************************************************
//                               API Results
// ***************************************************************************
/** Body of every non-200 JSON API response. */
#[derive(Object, Debug)]
pub struct HttpResult {
    pub result_code: String,
    pub result_msg: String,
}

impl HttpResult {
    pub fn new(result_code: String, result_msg: String) -> Self {
        Self {result_code, result_msg}
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_fetch_mapping() {
        let url = "http://upstream/api/artists/9".to_string();
        let e = PageError::from_detail_fetch(UpstreamError::Status { url: url.clone(), status: 404 });
        assert!(matches!(e, PageError::NotFound));
        let e = PageError::from_detail_fetch(UpstreamError::Status { url: url.clone(), status: 503 });
        assert!(matches!(e, PageError::BadGateway(_)));
        let e = PageError::from_detail_fetch(UpstreamError::Decode { url: url.clone(), msg: "eof".to_string() });
        assert_eq!(e.status(), StatusCode::BAD_GATEWAY);
        let e = PageError::from_detail_fetch(UpstreamError::Transport { url, msg: "refused".to_string() });
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn response_hides_details() {
        let resp = PageError::InternalError("secret upstream url".to_string()).as_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
