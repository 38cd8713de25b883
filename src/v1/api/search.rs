#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::Request;
use poem_openapi::{param::Query, payload::Json, ApiResponse, Object, OpenApi};
use log::error;

use crate::pages::home::search_artists;
use crate::pages::AppState;
use crate::utils::errors::HttpResult;
use crate::utils::groupie_utils::{self, RequestDebug};
use crate::utils::matcher::SearchResult;

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
pub struct SearchApi {
    state: Arc<AppState>,
}

struct ReqSearch
{
    query: String,
}

#[derive(Object, Debug)]
pub struct ArtistSummary
{
    id: i32,
    name: String,
    image: String,
}

#[derive(Object, Debug)]
pub struct RespSearch
{
    result_code: String,
    result_msg: String,
    query: String,
    artists: Vec<ArtistSummary>,
    suggestions: Vec<String>,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqSearch {
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request parameters:");
        s.push_str("\n    query: ");
        s.push_str(&self.query);
        s
    }
}

// ------------------- HTTP Status Codes -------------------
#[derive(Debug, ApiResponse)]
enum SearchResponse {
    #[oai(status = 200)]
    Http200(Json<RespSearch>),
    #[oai(status = 500)]
    Http500(Json<HttpResult>),
}

fn make_http_200(resp: RespSearch) -> SearchResponse {
    SearchResponse::Http200(Json(resp))
}
fn make_http_500(msg: String) -> SearchResponse {
    SearchResponse::Http500(Json(HttpResult::new(500.to_string(), msg)))
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl SearchApi {
    #[oai(path = "/search", method = "get")]
    async fn search_api(&self, http_req: &Request, query: Query<Option<String>>) -> SearchResponse {
        let req = ReqSearch { query: query.0.unwrap_or_default() };
        groupie_utils::debug_request(http_req, &req);

        let opts = self.state.config.match_options();
        match search_artists(self.state.upstream.as_ref(), &req.query, &opts).await {
            Ok(r) => make_http_200(RespSearch::new(&req.query, r)),
            Err(e) => {
                let msg = "ERROR: ".to_owned() + e.to_string().as_str();
                error!("{}", msg);
                make_http_500(msg)
            }
        }
    }
}

// ***************************************************************************
//                          Request/Response Methods
// ***************************************************************************
impl SearchApi {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

impl RespSearch {
    fn new(query: &str, result: SearchResult) -> Self {
        let artists = result.artists.into_iter()
            .map(|a| ArtistSummary { id: a.id, name: a.name, image: a.image })
            .collect();
        Self {
            result_code: "0".to_string(),
            result_msg: "success".to_string(),
            query: query.to_string(),
            artists,
            suggestions: result.suggestions,
        }
    }
}
