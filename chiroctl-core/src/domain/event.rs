//! Calendar events
//!
//! Times are local wall-clock times of the chapter; the work-year an event
//! belongs to follows from the date it starts on.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{optional_text, required_text, ValidationError};

const MAX_TITLE_LEN: usize = 200;
const MAX_LOCATION_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub work_year_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    /// Empty means the whole chapter
    pub group_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventForm {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    #[serde(default)]
    pub group_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: NaiveDateTime,
    pub ends_at: NaiveDateTime,
    pub group_ids: Vec<Uuid>,
}

impl EventForm {
    pub fn validate(&self) -> Result<NewEvent, ValidationError> {
        if self.ends_at < self.starts_at {
            return Err(ValidationError::OutOfRange {
                field: "end",
                reason: "must not be before the start",
            });
        }
        let mut group_ids = self.group_ids.clone();
        group_ids.sort();
        group_ids.dedup();
        Ok(NewEvent {
            title: required_text("title", &self.title, MAX_TITLE_LEN)?,
            description: optional_text(
                "description",
                self.description.as_deref(),
                MAX_DESCRIPTION_LEN,
            )?,
            location: optional_text("location", self.location.as_deref(), MAX_LOCATION_LEN)?,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            group_ids,
        })
    }
}

impl NewEvent {
    pub fn starts_on(&self) -> NaiveDate {
        self.starts_at.date()
    }
}

impl Event {
    pub fn from_new(id: Uuid, work_year_id: Uuid, new: &NewEvent) -> Self {
        Self {
            id,
            work_year_id,
            title: new.title.clone(),
            description: new.description.clone(),
            location: new.location.clone(),
            starts_at: new.starts_at,
            ends_at: new.ends_at,
            group_ids: new.group_ids.clone(),
        }
    }

    /// Whether the event concerns a group; chapter-wide events concern all.
    pub fn targets(&self, group_id: Uuid) -> bool {
        self.group_ids.is_empty() || self.group_ids.contains(&group_id)
    }
}

/// Filters for event listings
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct EventFilter {
    /// Events ending on or after this date
    pub from: Option<NaiveDate>,
    /// Events starting on or before this date
    pub to: Option<NaiveDate>,
    pub group_id: Option<Uuid>,
    pub work_year_id: Option<Uuid>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.from.map_or(true, |from| event.ends_at.date() >= from)
            && self.to.map_or(true, |to| event.starts_at.date() <= to)
            && self.group_id.map_or(true, |g| event.targets(g))
            && self.work_year_id.map_or(true, |wy| event.work_year_id == wy)
    }
}
