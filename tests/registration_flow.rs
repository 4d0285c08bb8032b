use chrono::NaiveDate;
use fake::faker::name::en::Name;
use fake::Fake;
use std::sync::Arc;
use tempfile::TempDir;

use club_events::{
    config::Config,
    error::ServiceError,
    models::{CapacityStatus, EventPatch, NewEvent, NewRegistration},
    services::EventView,
    AppState,
};

async fn setup() -> (TempDir, Arc<AppState>) {
    let tmp = tempfile::tempdir().unwrap();
    let state = AppState::new(Config::file_backed(tmp.path().join("data")))
        .await
        .unwrap();
    (tmp, state)
}

fn new_event(title: &str, date: &str, max: u32, limit: Option<u32>) -> NewEvent {
    NewEvent {
        title: title.to_string(),
        date: date.parse().unwrap(),
        time: "17:30".to_string(),
        location: "Main auditorium".to_string(),
        description: "Club session".to_string(),
        attendees: 0,
        max_attendees: max,
        category: "workshop".to_string(),
        featured: false,
        image: "/images/session.png".to_string(),
        registration_limit: limit,
        is_active: true,
    }
}

fn student(event_id: i64, n: usize) -> NewRegistration {
    NewRegistration {
        event_id,
        name: Name().fake(),
        usn: format!("1CL22CS{n:03}"),
        email: format!("student{n}@college.edu"),
        phone: format!("98765{n:05}"),
        branch_name: "Computer Science".to_string(),
        academic_year: "2".to_string(),
    }
}

#[tokio::test]
async fn created_event_reads_back_unchanged() {
    let (_tmp, state) = setup().await;
    let input = new_event("Intro to Rust", "2099-03-14", 40, Some(45));

    let created = state.events.create(input.clone()).await.unwrap();
    let fetched = state.events.get(created.id).await.unwrap().unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.title, input.title);
    assert_eq!(fetched.date, input.date);
    assert_eq!(fetched.max_attendees, 40);
    assert_eq!(fetched.registration_limit, Some(45));
    assert_eq!(fetched.created_at, fetched.updated_at);
    assert!(fetched.id > 0);
}

#[tokio::test]
async fn ids_increase_per_entity() {
    let (_tmp, state) = setup().await;
    let a = state.events.create(new_event("A", "2099-01-01", 5, None)).await.unwrap();
    let b = state.events.create(new_event("B", "2099-01-02", 5, None)).await.unwrap();
    assert_eq!((a.id, b.id), (1, 2));

    let r = state.workflow.register(student(b.id, 1)).await.unwrap();
    assert_eq!(r.id, 1);
}

#[tokio::test]
async fn update_merges_and_keeps_id() {
    let (_tmp, state) = setup().await;
    let created = state.events.create(new_event("Old", "2099-01-01", 5, None)).await.unwrap();

    let patch = EventPatch {
        title: Some("New".to_string()),
        is_active: Some(false),
        ..Default::default()
    };
    let updated = state.events.update(created.id, patch).await.unwrap().unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.title, "New");
    assert!(!updated.is_active);
    assert_eq!(updated.location, created.location);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    assert!(state.events.update(999, EventPatch::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn registration_moves_attendee_count() {
    let (_tmp, state) = setup().await;
    let event = state.events.create(new_event("Meetup", "2099-01-01", 10, None)).await.unwrap();

    let first = state.workflow.register(student(event.id, 1)).await.unwrap();
    state.workflow.register(student(event.id, 2)).await.unwrap();
    assert_eq!(state.events.get(event.id).await.unwrap().unwrap().attendees, 2);

    state.workflow.cancel(first.id).await.unwrap();
    assert_eq!(state.events.get(event.id).await.unwrap().unwrap().attendees, 1);

    assert!(matches!(
        state.workflow.cancel(first.id).await,
        Err(ServiceError::RegistrationNotFound(_))
    ));
}

#[tokio::test]
async fn decrement_never_goes_below_zero() {
    let (_tmp, state) = setup().await;
    let event = state.events.create(new_event("Drift", "2099-01-01", 10, None)).await.unwrap();
    let reg = state.workflow.register(student(event.id, 1)).await.unwrap();

    // Counter drifted (manual admin edit)
    let patch = EventPatch { attendees: Some(0), ..Default::default() };
    state.events.update(event.id, patch).await.unwrap();

    assert!(state.registrations.delete(reg.id).await.unwrap());
    assert_eq!(state.events.get(event.id).await.unwrap().unwrap().attendees, 0);
}

#[tokio::test]
async fn deleting_event_cascades_to_its_registrations() {
    let (_tmp, state) = setup().await;
    let doomed = state.events.create(new_event("Doomed", "2099-01-01", 10, None)).await.unwrap();
    let kept = state.events.create(new_event("Kept", "2099-01-01", 10, None)).await.unwrap();

    for n in 0..3 {
        state.workflow.register(student(doomed.id, n)).await.unwrap();
    }
    state.workflow.register(student(kept.id, 10)).await.unwrap();

    assert_eq!(state.workflow.delete_event(doomed.id).await.unwrap(), Some(3));
    assert!(state.events.get(doomed.id).await.unwrap().is_none());
    assert!(state.registrations.list_by_event(doomed.id).await.unwrap().is_empty());
    assert_eq!(state.registrations.list_all().await.unwrap().len(), 1);

    assert_eq!(state.workflow.delete_event(doomed.id).await.unwrap(), None);
}

#[tokio::test]
async fn duplicate_email_is_case_insensitive() {
    let (_tmp, state) = setup().await;
    let event = state.events.create(new_event("Talk", "2099-01-01", 10, None)).await.unwrap();

    state.workflow.register(student(event.id, 1)).await.unwrap();

    let mut again = student(event.id, 2);
    again.email = "STUDENT1@College.EDU".to_string();
    let err = state.workflow.register(again).await.unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateEmail));
    assert_eq!(state.events.get(event.id).await.unwrap().unwrap().attendees, 1);
}

#[tokio::test]
async fn duplicate_phone_is_rejected() {
    let (_tmp, state) = setup().await;
    let event = state.events.create(new_event("Talk", "2099-01-01", 10, None)).await.unwrap();
    state.workflow.register(student(event.id, 1)).await.unwrap();

    let mut again = student(event.id, 2);
    again.phone = student(event.id, 1).phone;
    let err = state.workflow.register(again).await.unwrap_err();
    assert!(matches!(err, ServiceError::DuplicatePhone));
}

#[tokio::test]
async fn same_student_may_join_different_events() {
    let (_tmp, state) = setup().await;
    let a = state.events.create(new_event("A", "2099-01-01", 10, None)).await.unwrap();
    let b = state.events.create(new_event("B", "2099-01-01", 10, None)).await.unwrap();

    state.workflow.register(student(a.id, 1)).await.unwrap();
    state.workflow.register(student(b.id, 1)).await.unwrap();
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let (_tmp, state) = setup().await;
    let err = state.workflow.register(student(77, 1)).await.unwrap_err();
    assert!(matches!(err, ServiceError::EventNotFound(77)));
}

#[tokio::test]
async fn invalid_registration_is_a_validation_error() {
    let (_tmp, state) = setup().await;
    let event = state.events.create(new_event("A", "2099-01-01", 10, None)).await.unwrap();
    let mut bad = student(event.id, 1);
    bad.email = "nope".to_string();
    assert!(matches!(
        state.workflow.register(bad).await,
        Err(ServiceError::Validation(_))
    ));
}

#[tokio::test]
async fn capacity_thresholds_example() {
    let (_tmp, state) = setup().await;
    let event = state
        .events
        .create(new_event("Limited", "2099-01-01", 2, Some(3)))
        .await
        .unwrap();

    state.workflow.register(student(event.id, 1)).await.unwrap();
    state.workflow.register(student(event.id, 2)).await.unwrap();
    let view = state.workflow.capacity(event.id).await.unwrap();
    assert_eq!(view.attendees, 2);
    assert_eq!(view.status, CapacityStatus::MaxReached);
    assert!(view.accepts_registrations);

    state.workflow.register(student(event.id, 3)).await.unwrap();
    let view = state.workflow.capacity(event.id).await.unwrap();
    assert_eq!(view.attendees, 3);
    assert_eq!(view.status, CapacityStatus::LimitReached);

    let err = state.workflow.register(student(event.id, 4)).await.unwrap_err();
    assert!(matches!(err, ServiceError::RegistrationClosed(id) if id == event.id));
    assert_eq!(state.registrations.list_by_event(event.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn concurrent_duplicates_only_one_wins() {
    let (_tmp, state) = setup().await;
    let event = state.events.create(new_event("Rush", "2099-01-01", 50, None)).await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            let candidate = student(event.id, 1);
            tokio::spawn(async move { state.workflow.register(candidate).await })
        })
        .collect();

    let mut ok = 0;
    for h in handles {
        if h.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(state.events.get(event.id).await.unwrap().unwrap().attendees, 1);
}

#[tokio::test]
async fn registrations_racing_event_delete_leave_no_orphans() {
    let (_tmp, state) = setup().await;
    let event = state.events.create(new_event("Cancelled", "2099-01-01", 50, None)).await.unwrap();

    let mut handles: Vec<_> = (0..8)
        .map(|n| {
            let state = state.clone();
            let candidate = student(event.id, n);
            tokio::spawn(async move { state.workflow.register(candidate).await.map(|_| ()) })
        })
        .collect();
    let deleter = state.clone();
    let event_id = event.id;
    handles.insert(
        4,
        tokio::spawn(async move { deleter.workflow.delete_event(event_id).await.map(|_| ()) }),
    );

    for h in handles {
        match h.await.unwrap() {
            Ok(()) | Err(ServiceError::EventNotFound(_)) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert!(state.events.get(event.id).await.unwrap().is_none());
    assert!(state.registrations.list_by_event(event.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn upcoming_and_past_split_on_today() {
    let (_tmp, state) = setup().await;
    let today = NaiveDate::from_ymd_opt(2050, 6, 15).unwrap();
    for (title, date) in [
        ("far", "2099-01-01"),
        ("old", "2001-01-01"),
        ("today", "2050-06-15"),
        ("soon", "2050-07-01"),
        ("recent", "2050-06-14"),
    ] {
        state.events.create(new_event(title, date, 10, None)).await.unwrap();
    }

    let upcoming: Vec<String> = state
        .events
        .list_upcoming(today)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(upcoming, ["today", "soon", "far"]);

    let past: Vec<String> = state
        .events
        .list_past(today)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(past, ["recent", "old"]);

    let limited = state.events.list(EventView::Upcoming, today, Some(2)).await.unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn active_flag_views() {
    let (_tmp, state) = setup().await;
    let mut retired = new_event("retired", "2099-01-01", 10, None);
    retired.is_active = false;
    state.events.create(retired).await.unwrap();
    state.events.create(new_event("live", "2001-01-01", 10, None)).await.unwrap();

    let active = state.events.list_active().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].title, "live");

    let inactive = state.events.list_inactive().await.unwrap();
    assert_eq!(inactive.len(), 1);
    assert_eq!(inactive[0].title, "retired");
}

#[tokio::test]
async fn list_all_is_newest_first() {
    let (_tmp, state) = setup().await;
    let first = state.events.create(new_event("first", "2099-01-01", 10, None)).await.unwrap();
    let second = state.events.create(new_event("second", "2001-01-01", 10, None)).await.unwrap();

    let ids: Vec<i64> = state.events.list_all().await.unwrap().into_iter().map(|e| e.id).collect();
    assert_eq!(ids, [second.id, first.id]);

    let r1 = state.workflow.register(student(first.id, 1)).await.unwrap();
    let r2 = state.workflow.register(student(first.id, 2)).await.unwrap();
    let regs: Vec<i64> = state.registrations.list_all().await.unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(regs, [r2.id, r1.id]);
}

#[tokio::test]
async fn data_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("data");
    let event_id = {
        let state = AppState::new(Config::file_backed(&dir)).await.unwrap();
        let event = state.events.create(new_event("Persist", "2099-01-01", 10, None)).await.unwrap();
        state.workflow.register(student(event.id, 1)).await.unwrap();
        event.id
    };

    let state = AppState::new(Config::file_backed(&dir)).await.unwrap();
    let event = state.events.get(event_id).await.unwrap().unwrap();
    assert_eq!(event.attendees, 1);
    assert_eq!(state.registrations.list_by_event(event_id).await.unwrap().len(), 1);
}
