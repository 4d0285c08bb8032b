use chrono::Utc;
use std::cmp::Reverse;
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::models::{NewRegistration, Registration};
use crate::storage::{Counter, SharedStore};

/// Registration CRUD. Create and delete also adjust the parent event's
/// `attendees` with a read-modify-write. That update is not atomic with the
/// registration write itself.
#[derive(Clone)]
pub struct RegistrationRepository {
    store: SharedStore,
}

impl RegistrationRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// All registrations, latest first.
    pub async fn list_all(&self) -> Result<Vec<Registration>, ServiceError> {
        let mut registrations = self.store.registrations().await?;
        registrations.sort_by_key(|r| Reverse((r.registered_at, r.id)));
        Ok(registrations)
    }

    pub async fn list_by_event(&self, event_id: i64) -> Result<Vec<Registration>, ServiceError> {
        let mut registrations: Vec<Registration> = self
            .store
            .registrations()
            .await?
            .into_iter()
            .filter(|r| r.event_id == event_id)
            .collect();
        registrations.sort_by_key(|r| Reverse((r.registered_at, r.id)));
        Ok(registrations)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Registration>, ServiceError> {
        Ok(self.store.registration(id).await?)
    }

    pub async fn create(&self, new: NewRegistration) -> Result<Registration, ServiceError> {
        let id = self.store.next_id(Counter::Registration).await?;
        let registration = Registration::from_new(id, new, Utc::now());
        self.store.save_registration(&registration).await?;

        self.adjust_attendees(registration.event_id, |n| n.saturating_add(1)).await?;
        info!(
            "Registration {} created for event {}",
            registration.id, registration.event_id
        );
        Ok(registration)
    }

    /// Returns `false` if there was no such registration.
    pub async fn delete(&self, id: i64) -> Result<bool, ServiceError> {
        let Some(registration) = self.store.registration(id).await? else {
            return Ok(false);
        };
        self.store.remove_registrations(&[id]).await?;

        self.adjust_attendees(registration.event_id, |n| n.saturating_sub(1)).await?;
        info!("Registration {} deleted from event {}", id, registration.event_id);
        Ok(true)
    }

    async fn adjust_attendees(&self, event_id: i64, f: impl FnOnce(u32) -> u32) -> Result<(), ServiceError> {
        match self.store.event(event_id).await? {
            Some(mut event) => {
                event.attendees = f(event.attendees);
                self.store.save_event(&event).await?;
                Ok(())
            }
            None => {
                // eventId не проверяется на уровне хранилища
                warn!("Event {} not found while updating attendee count", event_id);
                Ok(())
            }
        }
    }
}
