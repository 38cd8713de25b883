#![forbid(unsafe_code)]

use std::sync::Arc;

use poem::web::{Data, Html};
use poem::{handler, Request};
use serde::{Deserialize, Serialize};

use crate::pages::{check_method, log_page_error, AppState};
use crate::utils::errors::PageError;
use crate::utils::groupie_utils::{debug_request, RequestDebug};
use crate::utils::models::EnrichedArtist;
use crate::utils::render::{render, INFO_TEMPLATE};
use crate::utils::upstream::{UpstreamClient, UpstreamError};

// ***************************************************************************
//                          Request/Response Definitions
// ***************************************************************************
#[derive(Debug, Default, Deserialize)]
pub struct ArtistParams {
    #[serde(default)]
    pub id: String,
}

impl RequestDebug for ArtistParams {
    fn get_request_info(&self) -> String {
        format!("  Request parameters:\n    id: {}", self.id)
    }
}

#[derive(Serialize)]
struct InfoPage<'a> {
    title: &'a str,
    artist: &'a EnrichedArtist,
}

// ***************************************************************************
//                                 Endpoint
// ***************************************************************************
// ---------------------------------------------------------------------------
// artist:
// ---------------------------------------------------------------------------
/** GET /artist?id=<int> */
#[handler]
pub async fn artist(http_req: &Request, state: Data<&Arc<AppState>>) -> poem::Result<Html<String>> {
    process(http_req, &state)
        .await
        .map_err(|e| log_page_error(http_req, e).into())
}

async fn process(http_req: &Request, state: &AppState) -> Result<Html<String>, PageError> {
    check_method(http_req)?;

    let params: ArtistParams = http_req.params().unwrap_or_default();
    debug_request(http_req, &params);

    // Malformed and out of range ids both mean there is no such page.
    let id: i32 = params.id.trim().parse().map_err(|_| PageError::NotFound)?;
    if !state.config.artist_id_in_range(id) {
        return Err(PageError::NotFound);
    }

    let composite = fetch_composite(state.upstream.as_ref(), id)
        .await
        .map_err(PageError::from_detail_fetch)?;

    let page = InfoPage { title: &state.config.title, artist: &composite };
    Ok(Html(render(&state.tera, INFO_TEMPLATE, &page)?))
}

// ***************************************************************************
//                             Public Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// fetch_composite:
// ---------------------------------------------------------------------------
/** Fetch one artist, then its locations, dates and relations concurrently,
 * and merge the four into one record.
 */
pub async fn fetch_composite(upstream: &dyn UpstreamClient, id: i32)
-> Result<EnrichedArtist, UpstreamError> {
    let record = upstream.artist(id).await?;
    let (location, date, relation) = futures::try_join!(
        upstream.locations(id),
        upstream.dates(id),
        upstream.relation(id),
    )?;

    Ok(EnrichedArtist::from(record).with_info(Some(location), Some(date), Some(relation)))
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::stub::queen_stub;

    #[tokio::test]
    async fn composite_merges_auxiliary_records() {
        let stub = queen_stub()
            .with_location(1, "london-uk")
            .with_date(1, "*13-07-1985")
            .with_relation(1, "london-uk", "*13-07-1985");
        let a = fetch_composite(&stub, 1).await.unwrap();
        assert_eq!(a.name, "Queen");
        assert_eq!(a.locations, vec!["london-uk"]);
        assert_eq!(a.dates, vec!["*13-07-1985"]);
        assert_eq!(a.relations["london-uk"], vec!["*13-07-1985"]);
    }

    #[tokio::test]
    async fn empty_auxiliary_records_still_present() {
        // The stub answers unknown ids with empty records.
        let stub = queen_stub().with_location(1, "london-uk").without_inline();
        let a = fetch_composite(&stub, 1).await.unwrap();
        assert_eq!(a.locations.len(), 1);
        assert!(a.dates.is_empty());
        assert!(a.relations.is_empty());
    }

    #[tokio::test]
    async fn unknown_artist_is_status_404() {
        let stub = queen_stub();
        match fetch_composite(&stub, 7).await {
            Err(UpstreamError::Status { status, .. }) => assert_eq!(status, 404),
            other => panic!("expected 404, got {:?}", other.map(|a| a.name)),
        }
    }
}
