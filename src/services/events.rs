//! Event repository: CRUD and the listing views used by the site.
//!
//! `upcoming`/`past` compare the event date with today. `active`/`inactive`
//! look only at the admin-controlled `isActive` flag.

use chrono::{NaiveDate, Utc};
use std::cmp::Reverse;
use std::str::FromStr;
use tracing::info;
use validator::Validate;

use crate::error::ServiceError;
use crate::models::{Event, EventPatch, NewEvent};
use crate::storage::{Counter, SharedStore};

/// Listing selector for `GET /api/events?type=...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventView {
    All,
    Upcoming,
    Past,
    Active,
    Inactive,
}

impl FromStr for EventView {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(EventView::All),
            "upcoming" => Ok(EventView::Upcoming),
            "past" => Ok(EventView::Past),
            "active" => Ok(EventView::Active),
            "inactive" => Ok(EventView::Inactive),
            other => Err(ServiceError::Validation(format!(
                "type must be one of upcoming, past, active, inactive (got {other:?})"
            ))),
        }
    }
}

#[derive(Clone)]
pub struct EventRepository {
    store: SharedStore,
}

impl EventRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// All events, newest first.
    pub async fn list_all(&self) -> Result<Vec<Event>, ServiceError> {
        let mut events = self.store.events().await?;
        events.sort_by_key(|e| Reverse((e.created_at, e.id)));
        Ok(events)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Event>, ServiceError> {
        Ok(self.store.event(id).await?)
    }

    /// Like [`get`](Self::get) but a missing event is an error.
    pub async fn require(&self, id: i64) -> Result<Event, ServiceError> {
        self.get(id).await?.ok_or(ServiceError::EventNotFound(id))
    }

    pub async fn create(&self, new: NewEvent) -> Result<Event, ServiceError> {
        let new = new.trimmed();
        new.validate()?;
        let id = self.store.next_id(Counter::Event).await?;
        let event = Event::from_new(id, new, Utc::now());
        self.store.save_event(&event).await?;
        info!("Created event {} ({})", event.id, event.title);
        Ok(event)
    }

    pub async fn update(&self, id: i64, patch: EventPatch) -> Result<Option<Event>, ServiceError> {
        let patch = patch.trimmed();
        patch.validate()?;
        let Some(mut event) = self.store.event(id).await? else {
            return Ok(None);
        };
        event.apply(patch, Utc::now());
        self.store.save_event(&event).await?;
        info!("Updated event {}", id);
        Ok(Some(event))
    }

    /// Deletes the event and its registrations. Returns the number of
    /// registrations removed, or `None` if the event did not exist.
    /// HTTP deletes go through [`RegistrationWorkflow::delete_event`] so that
    /// no registration lands between the cascade and the event removal.
    ///
    /// [`RegistrationWorkflow::delete_event`]: crate::services::RegistrationWorkflow::delete_event
    pub async fn delete(&self, id: i64) -> Result<Option<usize>, ServiceError> {
        if self.store.event(id).await?.is_none() {
            return Ok(None);
        }

        // Сначала регистрации: при сбое посередине событие остаётся и удаление можно повторить
        let ids: Vec<i64> = self
            .store
            .registrations()
            .await?
            .into_iter()
            .filter(|r| r.event_id == id)
            .map(|r| r.id)
            .collect();
        let removed = self.store.remove_registrations(&ids).await?;
        self.store.remove_event(id).await?;

        info!("Deleted event {} with {} registrations", id, removed);
        Ok(Some(removed))
    }

    /// `date >= today`, soonest first.
    pub async fn list_upcoming(&self, today: NaiveDate) -> Result<Vec<Event>, ServiceError> {
        let mut events: Vec<Event> = self
            .store
            .events()
            .await?
            .into_iter()
            .filter(|e| e.date >= today)
            .collect();
        events.sort_by_key(|e| (e.date, e.id));
        Ok(events)
    }

    /// `date < today`, most recent first.
    pub async fn list_past(&self, today: NaiveDate) -> Result<Vec<Event>, ServiceError> {
        let mut events: Vec<Event> = self
            .store
            .events()
            .await?
            .into_iter()
            .filter(|e| e.date < today)
            .collect();
        events.sort_by_key(|e| Reverse((e.date, e.id)));
        Ok(events)
    }

    pub async fn list_active(&self) -> Result<Vec<Event>, ServiceError> {
        let mut events: Vec<Event> = self
            .store
            .events()
            .await?
            .into_iter()
            .filter(|e| e.is_active)
            .collect();
        events.sort_by_key(|e| (e.date, e.id));
        Ok(events)
    }

    pub async fn list_inactive(&self) -> Result<Vec<Event>, ServiceError> {
        let mut events: Vec<Event> = self
            .store
            .events()
            .await?
            .into_iter()
            .filter(|e| !e.is_active)
            .collect();
        events.sort_by_key(|e| Reverse((e.date, e.id)));
        Ok(events)
    }

    pub async fn list(
        &self,
        view: EventView,
        today: NaiveDate,
        limit: Option<usize>,
    ) -> Result<Vec<Event>, ServiceError> {
        let mut events = match view {
            EventView::All => self.list_all().await?,
            EventView::Upcoming => self.list_upcoming(today).await?,
            EventView::Past => self.list_past(today).await?,
            EventView::Active => self.list_active().await?,
            EventView::Inactive => self.list_inactive().await?,
        };
        if let Some(limit) = limit {
            events.truncate(limit);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_views() {
        assert_eq!("upcoming".parse::<EventView>().unwrap(), EventView::Upcoming);
        assert_eq!("inactive".parse::<EventView>().unwrap(), EventView::Inactive);
        assert!(matches!(
            "future".parse::<EventView>(),
            Err(ServiceError::Validation(_))
        ));
    }
}
