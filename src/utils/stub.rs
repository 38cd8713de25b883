#![forbid(unsafe_code)]

// In-memory upstream used by the handler tests.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::utils::models::{Artist, Date, Linked, Location, Relation};
use crate::utils::upstream::{UpstreamClient, UpstreamError};

#[derive(Debug, Clone, Default)]
pub struct StubUpstream {
    pub artists: Vec<Artist>,
    pub locations: Vec<Location>,
    pub dates: Vec<Date>,
    pub relations: Vec<Relation>,
    /// Every call fails with this upstream status.
    pub fail_status: Option<u16>,
    /// Every call fails to decode.
    pub fail_decode: bool,
    /// The bulk index calls fail with a transport error.
    pub fail_indexes: bool,
}

/// One artist, shaped like the payload the page tests are written around.
pub fn queen_stub() -> StubUpstream {
    let json = r#"{"id":1,"image":"https://example.invalid/queen.jpeg","name":"Queen",
                   "members":["Freddie"],"creationDate":19700101,"firstAlbum":"1973-07-13",
                   "locations":["london"],"dates":["1970-01-01"]}"#;
    let queen: Artist = serde_json::from_str(json).unwrap();
    StubUpstream { artists: vec![queen], ..Default::default() }
}

pub fn band(id: i32, name: &str) -> Artist {
    Artist {
        id,
        name: name.to_string(),
        image: format!("https://example.invalid/{}.jpeg", id),
        members: vec![format!("{} singer", name)],
        creation_date: 1990,
        first_album: "01-01-1991".to_string(),
        ..Default::default()
    }
}

impl StubUpstream {
    pub fn with_artist(mut self, a: Artist) -> Self {
        self.artists.push(a);
        self
    }

    pub fn with_location(mut self, id: i32, place: &str) -> Self {
        self.locations.push(Location { id, locations: vec![place.to_string()] });
        self
    }

    pub fn with_date(mut self, id: i32, date: &str) -> Self {
        self.dates.push(Date { id, dates: vec![date.to_string()] });
        self
    }

    pub fn with_relation(mut self, id: i32, place: &str, date: &str) -> Self {
        let mut m = BTreeMap::new();
        m.insert(place.to_string(), vec![date.to_string()]);
        self.relations.push(Relation { id, dates_locations: m });
        self
    }

    /// Replace inline auxiliary data with links, as the real service sends.
    pub fn without_inline(mut self) -> Self {
        for a in self.artists.iter_mut() {
            a.locations = Linked::Link(format!("/api/locations/{}", a.id));
            a.dates = Linked::Link(format!("/api/dates/{}", a.id));
            a.dates_locations = Linked::Link(format!("/api/relation/{}", a.id));
        }
        self
    }

    pub fn failing_indexes(mut self) -> Self {
        self.fail_indexes = true;
        self
    }

    fn check(&self, path: &str) -> Result<(), UpstreamError> {
        let url = format!("stub://{}", path);
        if let Some(status) = self.fail_status {
            return Err(UpstreamError::Status { url, status });
        }
        if self.fail_decode {
            return Err(UpstreamError::Decode { url, msg: "expected value at line 1 column 1".to_string() });
        }
        Ok(())
    }

    fn check_index(&self, path: &str) -> Result<(), UpstreamError> {
        self.check(path)?;
        if self.fail_indexes {
            return Err(UpstreamError::Transport { url: format!("stub://{}", path),
                                                  msg: "connection refused".to_string() });
        }
        Ok(())
    }
}

#[async_trait]
impl UpstreamClient for StubUpstream {
    async fn artists(&self) -> Result<Vec<Artist>, UpstreamError> {
        self.check("artists")?;
        Ok(self.artists.clone())
    }

    async fn artist(&self, id: i32) -> Result<Artist, UpstreamError> {
        self.check("artists/id")?;
        self.artists.iter().find(|a| a.id == id).cloned()
            .ok_or(UpstreamError::Status { url: format!("stub://artists/{}", id), status: 404 })
    }

    async fn locations(&self, id: i32) -> Result<Location, UpstreamError> {
        self.check("locations/id")?;
        Ok(self.locations.iter().find(|l| l.id == id).cloned()
            .unwrap_or(Location { id, locations: vec![] }))
    }

    async fn dates(&self, id: i32) -> Result<Date, UpstreamError> {
        self.check("dates/id")?;
        Ok(self.dates.iter().find(|d| d.id == id).cloned()
            .unwrap_or(Date { id, dates: vec![] }))
    }

    async fn relation(&self, id: i32) -> Result<Relation, UpstreamError> {
        self.check("relation/id")?;
        Ok(self.relations.iter().find(|r| r.id == id).cloned()
            .unwrap_or(Relation { id, dates_locations: BTreeMap::new() }))
    }

    async fn all_locations(&self) -> Result<Vec<Location>, UpstreamError> {
        self.check_index("locations")?;
        Ok(self.locations.clone())
    }

    async fn all_dates(&self) -> Result<Vec<Date>, UpstreamError> {
        self.check_index("dates")?;
        Ok(self.dates.clone())
    }

    async fn all_relations(&self) -> Result<Vec<Relation>, UpstreamError> {
        self.check_index("relation")?;
        Ok(self.relations.clone())
    }
}
