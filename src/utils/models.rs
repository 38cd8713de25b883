#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ***************************************************************************
//                             Upstream Records
// ***************************************************************************
// ---------------------------------------------------------------------------
// Linked:
// ---------------------------------------------------------------------------
/** The artists endpoint returns the auxiliary fields (locations, dates,
 * relations) as links to other endpoints, but some payloads carry the data
 * inline.  Both shapes decode into this enum.
 */
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Linked<T> {
    Inline(T),
    Link(String),
}

impl<T> Default for Linked<T> {
    fn default() -> Self {
        Linked::Link(String::new())
    }
}

impl<T: Clone + Default> Linked<T> {
    /// The inline data, or an empty value when only a link was sent.
    pub fn inline_or_default(&self) -> T {
        match self {
            Linked::Inline(v) => v.clone(),
            Linked::Link(_) => T::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Artist:
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Artist {
    pub id: i32,
    pub image: String,
    pub name: String,
    pub members: Vec<String>,
    pub creation_date: i64,
    pub first_album: String,
    pub locations: Linked<Vec<String>>,
    #[serde(alias = "concertDates")]
    pub dates: Linked<Vec<String>>,
    #[serde(alias = "relations")]
    pub dates_locations: Linked<BTreeMap<String, Vec<String>>>,
}

// ---------------------------------------------------------------------------
// Location:
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Location {
    pub id: i32,
    pub locations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Date:
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Date {
    pub id: i32,
    pub dates: Vec<String>,
}

// ---------------------------------------------------------------------------
// Relation:
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Relation {
    pub id: i32,
    pub dates_locations: BTreeMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Index:
// ---------------------------------------------------------------------------
/** Envelope used by the bulk endpoints (/locations, /dates, /relation). */
#[derive(Debug, Clone, Deserialize)]
pub struct Index<T> {
    pub index: Vec<T>,
}

// ***************************************************************************
//                             Composite Record
// ***************************************************************************
// ---------------------------------------------------------------------------
// EnrichedArtist:
// ---------------------------------------------------------------------------
/** An artist merged with its locations, dates and relations.  Always holds
 * exactly one of each, possibly empty.
 */
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnrichedArtist {
    pub id: i32,
    pub image: String,
    pub name: String,
    pub members: Vec<String>,
    pub creation_date: i64,
    pub creation_date_label: String,
    pub first_album: String,
    pub locations: Vec<String>,
    pub dates: Vec<String>,
    pub relations: BTreeMap<String, Vec<String>>,
}

impl EnrichedArtist {
    /// Attach the separately fetched records.  Records for a different
    /// artist id are ignored.
    pub fn with_info(mut self, location: Option<Location>, date: Option<Date>,
                     relation: Option<Relation>) -> Self {
        if let Some(l) = location.filter(|l| l.id == self.id) {
            self.locations = l.locations;
        }
        if let Some(d) = date.filter(|d| d.id == self.id) {
            self.dates = d.dates;
        }
        if let Some(r) = relation.filter(|r| r.id == self.id) {
            self.relations = r.dates_locations;
        }
        self
    }
}

impl From<Artist> for EnrichedArtist {
    fn from(a: Artist) -> Self {
        Self {
            creation_date_label: creation_date_label(a.creation_date),
            locations: a.locations.inline_or_default(),
            dates: a.dates.inline_or_default(),
            relations: a.dates_locations.inline_or_default(),
            id: a.id,
            image: a.image,
            name: a.name,
            members: a.members,
            creation_date: a.creation_date,
            first_album: a.first_album,
        }
    }
}

// ---------------------------------------------------------------------------
// enrich_all:
// ---------------------------------------------------------------------------
/** Join the artist list with the bulk index records by artist id. */
pub fn enrich_all(artists: Vec<Artist>, locations: Vec<Location>, dates: Vec<Date>,
                  relations: Vec<Relation>) -> Vec<EnrichedArtist> {
    let mut locations: BTreeMap<i32, Location> = locations.into_iter().map(|l| (l.id, l)).collect();
    let mut dates: BTreeMap<i32, Date> = dates.into_iter().map(|d| (d.id, d)).collect();
    let mut relations: BTreeMap<i32, Relation> = relations.into_iter().map(|r| (r.id, r)).collect();

    artists.into_iter()
        .map(|a| {
            let id = a.id;
            EnrichedArtist::from(a).with_info(locations.remove(&id), dates.remove(&id),
                                              relations.remove(&id))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// creation_date_label:
// ---------------------------------------------------------------------------
/** Render the numeric creation date.  8-digit values that form a real
 * calendar date (YYYYMMDD) become YYYY-MM-DD, anything else (usually just a
 * year) is printed as is.
 */
pub fn creation_date_label(value: i64) -> String {
    if (10_000_000..100_000_000).contains(&value) {
        let year = (value / 10_000) as i32;
        let month = (value / 100 % 100) as u32;
        let day = (value % 100) as u32;
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            return d.format("%Y-%m-%d").to_string();
        }
    }
    value.to_string()
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_artist_with_links() {
        let json = r#"{
            "id": 1,
            "image": "https://groupietrackers.herokuapp.com/api/images/queen.jpeg",
            "name": "Queen",
            "members": ["Freddie Mercury", "Brian May"],
            "creationDate": 1970,
            "firstAlbum": "14-12-1973",
            "locations": "https://groupietrackers.herokuapp.com/api/locations/1",
            "concertDates": "https://groupietrackers.herokuapp.com/api/dates/1",
            "relations": "https://groupietrackers.herokuapp.com/api/relation/1"
        }"#;
        let a: Artist = serde_json::from_str(json).unwrap();
        assert_eq!(a.name, "Queen");
        assert!(matches!(a.dates, Linked::Link(ref s) if s.ends_with("/dates/1")));

        let e = EnrichedArtist::from(a);
        assert!(e.locations.is_empty());
        assert!(e.relations.is_empty());
        assert_eq!(e.creation_date_label, "1970");
    }

    #[test]
    fn decode_artist_with_inline_data() {
        let json = r#"{"id":1,"name":"Queen","members":["Freddie"],"creationDate":19700101,
                       "firstAlbum":"1973-07-13","locations":["london"],"dates":["1970-01-01"]}"#;
        let e = EnrichedArtist::from(serde_json::from_str::<Artist>(json).unwrap());
        assert_eq!(e.locations, vec!["london"]);
        assert_eq!(e.dates, vec!["1970-01-01"]);
        assert_eq!(e.creation_date_label, "1970-01-01");
    }

    #[test]
    fn with_info_ignores_other_ids() {
        let a = Artist { id: 3, name: "Pink Floyd".to_string(), ..Default::default() };
        let e = EnrichedArtist::from(a).with_info(
            Some(Location { id: 3, locations: vec!["london-uk".to_string()] }),
            Some(Date { id: 4, dates: vec!["01-01-2000".to_string()] }),
            None);
        assert_eq!(e.locations, vec!["london-uk"]);
        assert!(e.dates.is_empty());
        assert!(e.relations.is_empty());
    }

    #[test]
    fn enrich_all_joins_by_id() {
        let artists = vec![
            Artist { id: 1, name: "Queen".to_string(), ..Default::default() },
            Artist { id: 2, name: "SOJA".to_string(), ..Default::default() },
        ];
        let mut rel = BTreeMap::new();
        rel.insert("playa_del_carmen-mexico".to_string(), vec!["05-12-2019".to_string()]);
        let out = enrich_all(artists,
                             vec![Location { id: 2, locations: vec!["playa_del_carmen-mexico".to_string()] }],
                             vec![],
                             vec![Relation { id: 2, dates_locations: rel }]);
        assert_eq!(out.len(), 2);
        assert!(out[0].locations.is_empty());
        assert_eq!(out[1].locations, vec!["playa_del_carmen-mexico"]);
        assert_eq!(out[1].relations.len(), 1);
    }

    #[test]
    fn creation_date_labels() {
        assert_eq!(creation_date_label(1970), "1970");
        assert_eq!(creation_date_label(20240229), "2024-02-29");
        assert_eq!(creation_date_label(20230229), "20230229");
        assert_eq!(creation_date_label(0), "0");
    }
}
