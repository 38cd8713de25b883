#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::web::{Data, Html};
use poem::{handler, Request};
use serde::{Deserialize, Serialize};

use crate::pages::{check_method, log_page_error, AppState};
use crate::utils::errors::PageError;
use crate::utils::groupie_utils::{debug_request, RequestDebug};
use crate::utils::matcher::{search, MatchOptions, SearchResult};
use crate::utils::models::{enrich_all, EnrichedArtist};
use crate::utils::render::{render, INDEX_TEMPLATE};
use crate::utils::upstream::{UpstreamClient, UpstreamError};

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
#[derive(Debug, Default, Deserialize)]
pub struct HomeParams {
    #[serde(default)]
    pub query: String,
}

impl RequestDebug for HomeParams {
    fn get_request_info(&self) -> String {
        format!("  Request parameters:\n    query: {}", self.query)
    }
}

#[derive(Serialize)]
struct HomePage<'a> {
    title: &'a str,
    query: &'a str,
    artists: &'a [EnrichedArtist],
    suggestions: &'a [String],
}

// ***************************************************************************
//                                 Endpoint
// ***************************************************************************
// ---------------------------------------------------------------------------
// home:
// ---------------------------------------------------------------------------
/** GET / and /index.html with an optional query parameter. */
#[handler]
pub async fn home(http_req: &Request, state: Data<&Arc<AppState>>) -> poem::Result<Html<String>> {
    process(http_req, &state)
        .await
        .map_err(|e| log_page_error(http_req, e).into())
}

async fn process(http_req: &Request, state: &AppState) -> Result<Html<String>, PageError> {
    check_method(http_req)?;

    // A query string that does not decode is treated as no query at all.
    let params: HomeParams = http_req.params().unwrap_or_default();
    debug_request(http_req, &params);

    let result = search_artists(state.upstream.as_ref(), &params.query,
                                &state.config.match_options()).await?;

    let page = HomePage {
        title: &state.config.title,
        query: &params.query,
        artists: &result.artists,
        suggestions: &result.suggestions,
    };
    Ok(Html(render(&state.tera, INDEX_TEMPLATE, &page)?))
}

// ***************************************************************************
//                             Public Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// search_artists:
// ---------------------------------------------------------------------------
/** Fetch the artists and filter them by the query.
 *
 * Without a query only the artist list is fetched.  With one, the locations,
 * dates and relations indexes are fetched alongside it so every field can be
 * searched; the first failing fetch aborts the search.
 */
pub async fn search_artists(upstream: &dyn UpstreamClient, query: &str, opts: &MatchOptions)
-> Result<SearchResult, UpstreamError> {
    if query.is_empty() {
        let artists = upstream.artists().await?;
        return Ok(search(artists.into_iter().map(EnrichedArtist::from).collect(), "", opts));
    }

    let (artists, locations, dates, relations) = futures::try_join!(
        upstream.artists(),
        upstream.all_locations(),
        upstream.all_dates(),
        upstream.all_relations(),
    )?;
    Ok(search(enrich_all(artists, locations, dates, relations), query, opts))
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::stub::{queen_stub, StubUpstream};

    #[tokio::test]
    async fn search_uses_bulk_indexes() {
        // London is only known through the locations index.
        let stub = queen_stub().with_location(1, "london-uk");
        let r = search_artists(&stub, "london", &MatchOptions::default()).await.unwrap();
        assert_eq!(r.artists.len(), 1);
        assert_eq!(r.suggestions, vec!["Queen - location: london-uk"]);
    }

    #[tokio::test]
    async fn empty_query_skips_indexes() {
        let stub = queen_stub().failing_indexes();
        let r = search_artists(&stub, "", &MatchOptions::default()).await.unwrap();
        assert_eq!(r.artists.len(), 1);
        assert!(search_artists(&stub, "queen", &MatchOptions::default()).await.is_err());
    }

    #[tokio::test]
    async fn empty_upstream_list() {
        let stub = StubUpstream::default();
        let r = search_artists(&stub, "queen", &MatchOptions::default()).await.unwrap();
        assert!(r.artists.is_empty());
        assert!(r.suggestions.is_empty());
    }
}
