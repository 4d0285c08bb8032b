//! Registration workflow: duplicate and capacity checks in front of
//! [`RegistrationRepository::create`].
//!
//! An event has two thresholds. Below `maxAttendees` registration is
//! normal. Between `maxAttendees` and `registrationLimit` it is still
//! accepted, as an extra (backup) place. At `registrationLimit` it is
//! closed. When no limit is set, `maxAttendees` is the limit.
//!
//! Check-then-create runs under a single async mutex, so it is serial
//! within one server process. Several processes sharing one Redis instance
//! can still race each other.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use validator::Validate;

use crate::error::ServiceError;
use crate::models::{CapacityStatus, Event, NewRegistration, Registration};
use crate::services::{EventRepository, RegistrationRepository};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    Email,
    Phone,
}

impl From<Conflict> for ServiceError {
    fn from(conflict: Conflict) -> Self {
        match conflict {
            Conflict::Email => ServiceError::DuplicateEmail,
            Conflict::Phone => ServiceError::DuplicatePhone,
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// First clash between `candidate` and registrations of the same event.
/// Email is compared case-insensitively, and is checked before phone.
pub fn find_conflict(existing: &[Registration], candidate: &NewRegistration) -> Option<Conflict> {
    let email = normalize_email(&candidate.email);
    let phone = candidate.phone.trim();
    let same_event: Vec<&Registration> = existing
        .iter()
        .filter(|r| r.event_id == candidate.event_id)
        .collect();

    if same_event.iter().any(|r| normalize_email(&r.email) == email) {
        return Some(Conflict::Email);
    }
    if same_event.iter().any(|r| r.phone.trim() == phone) {
        return Some(Conflict::Phone);
    }
    None
}

/// Capacity snapshot shown to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityView {
    pub event_id: i64,
    pub attendees: u32,
    pub max_attendees: u32,
    pub registration_limit: u32,
    pub status: CapacityStatus,
    pub accepts_registrations: bool,
    /// The next accepted registration would be a backup place.
    pub extra: bool,
    pub remaining: u32,
}

impl From<&Event> for CapacityView {
    fn from(event: &Event) -> Self {
        let limit = event.effective_limit();
        let status = event.capacity_status();
        CapacityView {
            event_id: event.id,
            attendees: event.attendees,
            max_attendees: event.max_attendees,
            registration_limit: limit,
            status,
            accepts_registrations: status != CapacityStatus::LimitReached,
            extra: status == CapacityStatus::MaxReached,
            remaining: limit.saturating_sub(event.attendees),
        }
    }
}

#[derive(Clone)]
pub struct RegistrationWorkflow {
    events: EventRepository,
    registrations: RegistrationRepository,
    gate: Arc<Mutex<()>>,
}

impl RegistrationWorkflow {
    pub fn new(events: EventRepository, registrations: RegistrationRepository) -> Self {
        Self {
            events,
            registrations,
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub async fn register(&self, candidate: NewRegistration) -> Result<Registration, ServiceError> {
        let candidate = candidate.trimmed();
        candidate.validate()?;

        let _guard = self.gate.lock().await;

        let event = self.events.require(candidate.event_id).await?;
        let existing = self.registrations.list_by_event(event.id).await?;

        if let Some(conflict) = find_conflict(&existing, &candidate) {
            warn!(
                "Duplicate {:?} rejected for event {}",
                conflict, event.id
            );
            return Err(conflict.into());
        }

        if !event.accepts_registrations() {
            warn!(
                "Registration refused for event {}: {} of {} places taken",
                event.id,
                event.attendees,
                event.effective_limit()
            );
            return Err(ServiceError::RegistrationClosed(event.id));
        }

        if event.capacity_status() == CapacityStatus::MaxReached {
            info!("Event {} is full, accepting extra registration", event.id);
        }

        self.registrations.create(candidate).await
    }

    /// Deletes a registration, decrementing the event's attendee count.
    pub async fn cancel(&self, id: i64) -> Result<(), ServiceError> {
        let _guard = self.gate.lock().await;
        if self.registrations.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::RegistrationNotFound(id))
        }
    }

    /// Cascade delete of an event, serialized with `register`.
    pub async fn delete_event(&self, event_id: i64) -> Result<Option<usize>, ServiceError> {
        let _guard = self.gate.lock().await;
        self.events.delete(event_id).await
    }

    pub async fn capacity(&self, event_id: i64) -> Result<CapacityView, ServiceError> {
        let event = self.events.require(event_id).await?;
        Ok(CapacityView::from(&event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn existing(event_id: i64, email: &str, phone: &str) -> Registration {
        Registration {
            id: 1,
            event_id,
            name: "Existing".into(),
            usn: "USN001".into(),
            email: email.into(),
            phone: phone.into(),
            branch_name: "ECE".into(),
            academic_year: "2".into(),
            registered_at: Utc::now(),
        }
    }

    fn candidate(event_id: i64, email: &str, phone: &str) -> NewRegistration {
        NewRegistration {
            event_id,
            name: "Candidate".into(),
            usn: "USN002".into(),
            email: email.into(),
            phone: phone.into(),
            branch_name: "CSE".into(),
            academic_year: "1".into(),
        }
    }

    #[test]
    fn email_checked_before_phone() {
        let regs = [existing(1, "a@x.edu", "111")];
        assert_eq!(find_conflict(&regs, &candidate(1, "A@X.edu", "111")), Some(Conflict::Email));
        assert_eq!(find_conflict(&regs, &candidate(1, "b@x.edu", "111")), Some(Conflict::Phone));
        assert_eq!(find_conflict(&regs, &candidate(1, "b@x.edu", "222")), None);
    }

    #[test]
    fn other_events_do_not_conflict() {
        let regs = [existing(2, "a@x.edu", "111")];
        assert_eq!(find_conflict(&regs, &candidate(1, "a@x.edu", "111")), None);
    }

    #[test]
    fn capacity_view_marks_extras() {
        let now = Utc::now();
        let event = Event {
            id: 3,
            title: "Robotics".into(),
            date: chrono::NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
            time: "14:00".into(),
            location: "Workshop".into(),
            description: "Build a bot".into(),
            attendees: 2,
            max_attendees: 2,
            category: "workshop".into(),
            featured: true,
            image: String::new(),
            registration_limit: Some(3),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let view = CapacityView::from(&event);
        assert_eq!(view.status, CapacityStatus::MaxReached);
        assert!(view.accepts_registrations);
        assert!(view.extra);
        assert_eq!(view.remaining, 1);
        assert_eq!(view.registration_limit, 3);
    }

    proptest! {
        #[test]
        fn email_case_never_bypasses_duplicate_check(
            local in "[a-z0-9]{1,12}",
            domain in "[a-z]{1,8}",
            mask in proptest::collection::vec(any::<bool>(), 0..24),
        ) {
            let email = format!("{local}@{domain}.edu");
            let shuffled: String = email
                .chars()
                .enumerate()
                .map(|(i, c)| if mask.get(i).copied().unwrap_or(false) { c.to_ascii_uppercase() } else { c })
                .collect();

            let regs = [existing(7, &email, "999")];
            prop_assert_eq!(find_conflict(&regs, &candidate(7, &shuffled, "000")), Some(Conflict::Email));
        }

        #[test]
        fn distinct_contacts_never_conflict(a in "[a-z]{1,10}", b in "[a-z]{1,10}", pa in "[0-9]{10}", pb in "[0-9]{10}") {
            prop_assume!(a != b && pa != pb);
            let regs = [existing(7, &format!("{a}@club.edu"), &pa)];
            prop_assert_eq!(find_conflict(&regs, &candidate(7, &format!("{b}@club.edu"), &pb)), None);
        }
    }
}
