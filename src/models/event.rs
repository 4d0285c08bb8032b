use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub description: String,
    pub attendees: u32,
    pub max_attendees: u32,
    pub category: String,
    pub featured: bool,
    pub image: String,
    pub registration_limit: Option<u32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Where an event stands against its two thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CapacityStatus {
    Open,
    /// Venue is full, extra (backup) sign-ups are still taken.
    MaxReached,
    LimitReached,
}

impl Event {
    /// Sign-up cap: `registration_limit`, or the venue capacity when unset.
    pub fn effective_limit(&self) -> u32 {
        self.registration_limit.unwrap_or(self.max_attendees)
    }

    pub fn capacity_status(&self) -> CapacityStatus {
        if self.attendees >= self.effective_limit() {
            CapacityStatus::LimitReached
        } else if self.attendees >= self.max_attendees {
            CapacityStatus::MaxReached
        } else {
            CapacityStatus::Open
        }
    }

    pub fn accepts_registrations(&self) -> bool {
        self.capacity_status() != CapacityStatus::LimitReached
    }

    pub fn from_new(id: i64, new: NewEvent, now: DateTime<Utc>) -> Self {
        Event {
            id,
            title: new.title,
            date: new.date,
            time: new.time,
            location: new.location,
            description: new.description,
            attendees: new.attendees,
            max_attendees: new.max_attendees,
            category: new.category,
            featured: new.featured,
            image: new.image,
            registration_limit: new.registration_limit,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges `patch` into the event. `id` and `created_at` never change.
    pub fn apply(&mut self, patch: EventPatch, now: DateTime<Utc>) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.date {
            self.date = v;
        }
        if let Some(v) = patch.time {
            self.time = v;
        }
        if let Some(v) = patch.location {
            self.location = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if let Some(v) = patch.attendees {
            self.attendees = v;
        }
        if let Some(v) = patch.max_attendees {
            self.max_attendees = v;
        }
        if let Some(v) = patch.category {
            self.category = v;
        }
        if let Some(v) = patch.featured {
            self.featured = v;
        }
        if let Some(v) = patch.image {
            self.image = v;
        }
        if let Some(v) = patch.registration_limit {
            self.registration_limit = v;
        }
        if let Some(v) = patch.is_active {
            self.is_active = v;
        }
        self.updated_at = now;
    }
}

fn default_true() -> bool {
    true
}

// POST /api/events
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    pub date: NaiveDate,
    #[validate(length(min = 1, message = "time is required"))]
    pub time: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[serde(default)]
    pub attendees: u32,
    #[validate(range(min = 1, message = "maxAttendees must be at least 1"))]
    pub max_attendees: u32,
    #[validate(length(min = 1, message = "category is required"))]
    pub category: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub registration_limit: Option<u32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl NewEvent {
    /// Strips surrounding whitespace from the text fields.
    pub fn trimmed(self) -> Self {
        NewEvent {
            title: self.title.trim().to_string(),
            time: self.time.trim().to_string(),
            location: self.location.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            image: self.image.trim().to_string(),
            ..self
        }
    }
}

// Отличаем отсутствующее поле от явного null
fn explicit<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// PUT /api/events/{id}; unknown keys (id, createdAt, ...) are ignored
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "time must not be empty"))]
    pub time: Option<String>,
    #[validate(length(min = 1, message = "location must not be empty"))]
    pub location: Option<String>,
    #[validate(length(min = 1, message = "description must not be empty"))]
    pub description: Option<String>,
    pub attendees: Option<u32>,
    #[validate(range(min = 1, message = "maxAttendees must be at least 1"))]
    pub max_attendees: Option<u32>,
    #[validate(length(min = 1, message = "category must not be empty"))]
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub image: Option<String>,
    #[serde(default, deserialize_with = "explicit")]
    pub registration_limit: Option<Option<u32>>,
    pub is_active: Option<bool>,
}

fn trim_opt(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

impl EventPatch {
    pub fn trimmed(self) -> Self {
        EventPatch {
            title: trim_opt(self.title),
            time: trim_opt(self.time),
            location: trim_opt(self.location),
            description: trim_opt(self.description),
            category: trim_opt(self.category),
            image: trim_opt(self.image),
            ..self
        }
    }
}
