#![forbid(unsafe_code)]

use std::fmt;

use crate::utils::models::EnrichedArtist;

// ***************************************************************************
//                                Constants
// ***************************************************************************
pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

// ***************************************************************************
//                               Match Types
// ***************************************************************************
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {Name, Member, CreationDate, FirstAlbum, Location, ConcertDate}

impl MatchKind {
    pub fn label(&self) -> &'static str {
        match self {
            MatchKind::Name => "artist/band",
            MatchKind::Member => "member",
            MatchKind::CreationDate => "creation date",
            MatchKind::FirstAlbum => "first album",
            MatchKind::Location => "location",
            MatchKind::ConcertDate => "concert date",
        }
    }
}

// ---------------------------------------------------------------------------
// Match:
// ---------------------------------------------------------------------------
/** One field of one artist that matched the query. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub artist_name: String,
    pub kind: MatchKind,
    pub value: String,
}

impl Match {
    /// Description used for an artist when no query narrows it down.
    pub fn describe_artist(artist: &EnrichedArtist) -> String {
        format!("{} - {}", artist.name, MatchKind::Name.label())
    }
}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MatchKind::Name => write!(f, "{} - {}", self.artist_name, self.kind.label()),
            _ => write!(f, "{} - {}: {}", self.artist_name, self.kind.label(), self.value),
        }
    }
}

// ---------------------------------------------------------------------------
// MatchOptions:
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Also accept fields where at least half the query's characters line up
    /// position by position.
    pub fuzzy: bool,
    /// Maximum number of suggestions produced for a non-empty query.
    pub suggestion_limit: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self { fuzzy: false, suggestion_limit: DEFAULT_SUGGESTION_LIMIT }
    }
}

// ---------------------------------------------------------------------------
// SearchResult:
// ---------------------------------------------------------------------------
#[derive(Debug, Default)]
pub struct SearchResult {
    pub artists: Vec<EnrichedArtist>,
    pub suggestions: Vec<String>,
}

// ***************************************************************************
//                             Public Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// match_artist:
// ---------------------------------------------------------------------------
/** Return every field of the artist that matches the query.  The query must
 * already be lowercased; field values are lowercased here.  Fields are
 * checked in a fixed order: name, members, creation date, first album,
 * locations, concert dates.
 */
pub fn match_artist(artist: &EnrichedArtist, query: &str, opts: &MatchOptions) -> Vec<Match> {
    let mut out = vec!();
    if query.is_empty() {
        return out;
    }

    let mut check = |kind: MatchKind, value: &str| {
        if field_matches(value, query, opts.fuzzy) {
            out.push(Match {
                artist_name: artist.name.clone(),
                kind,
                value: value.to_string(),
            });
        }
    };

    check(MatchKind::Name, &artist.name);
    for member in &artist.members {
        check(MatchKind::Member, member);
    }

    // The label and the raw digits differ only for YYYYMMDD values; either
    // one matching is enough, reported once.
    let raw = artist.creation_date.to_string();
    if field_matches(&artist.creation_date_label, query, opts.fuzzy) {
        check(MatchKind::CreationDate, &artist.creation_date_label);
    } else if raw != artist.creation_date_label {
        check(MatchKind::CreationDate, &raw);
    }

    check(MatchKind::FirstAlbum, &artist.first_album);
    for location in &artist.locations {
        check(MatchKind::Location, location);
    }
    for date in &artist.dates {
        check(MatchKind::ConcertDate, date);
    }

    out
}

// ---------------------------------------------------------------------------
// is_match:
// ---------------------------------------------------------------------------
#[cfg(test)]
pub fn is_match(artist: &EnrichedArtist, query: &str, opts: &MatchOptions) -> bool {
    !match_artist(artist, query, opts).is_empty()
}

// ---------------------------------------------------------------------------
// search:
// ---------------------------------------------------------------------------
/** Filter the artists and build the suggestion list.
 *
 * An empty query keeps every artist and suggests every artist, uncapped.
 * Otherwise matching artists are kept in upstream order, and the suggestions
 * list the descriptions of artists whose name equals the query before all
 * other descriptions, truncated to the suggestion limit.
 */
pub fn search(artists: Vec<EnrichedArtist>, query: &str, opts: &MatchOptions) -> SearchResult {
    let query = query.to_lowercase();
    if query.is_empty() {
        let suggestions = artists.iter().map(Match::describe_artist).collect();
        return SearchResult { artists, suggestions };
    }

    let mut filtered = vec!();
    let mut exact = vec!();
    let mut partial = vec!();
    for artist in artists {
        let matches = match_artist(&artist, &query, opts);
        if matches.is_empty() {
            continue;
        }
        let descriptions = matches.iter().map(|m| m.to_string());
        if artist.name.to_lowercase() == query {
            exact.extend(descriptions);
        } else {
            partial.extend(descriptions);
        }
        filtered.push(artist);
    }

    let mut suggestions = exact;
    suggestions.append(&mut partial);
    suggestions.truncate(opts.suggestion_limit);

    SearchResult { artists: filtered, suggestions }
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// field_matches:
// ---------------------------------------------------------------------------
fn field_matches(value: &str, query: &str, fuzzy: bool) -> bool {
    let value = value.to_lowercase();
    value.contains(query) || (fuzzy && matches_half(&value, query))
}

// ---------------------------------------------------------------------------
// matches_half:
// ---------------------------------------------------------------------------
/** Align both strings by character index and count the positions holding
 * the same character.  Accept when that count is at least half the query
 * length.
 */
fn matches_half(value: &str, query: &str) -> bool {
    let query_len = query.chars().count();
    if query_len == 0 {
        return false;
    }
    let equal = value.chars().zip(query.chars()).filter(|(v, q)| v == q).count();
    equal * 2 >= query_len
}
