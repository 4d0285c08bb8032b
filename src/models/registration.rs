use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub usn: String,
    pub email: String,
    pub phone: String,
    pub branch_name: String,
    pub academic_year: String,
    pub registered_at: DateTime<Utc>,
}

impl Registration {
    pub fn from_new(id: i64, new: NewRegistration, now: DateTime<Utc>) -> Self {
        Registration {
            id,
            event_id: new.event_id,
            name: new.name,
            usn: new.usn,
            email: new.email,
            phone: new.phone,
            branch_name: new.branch_name,
            academic_year: new.academic_year,
            registered_at: now,
        }
    }
}

// POST /api/registrations
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewRegistration {
    #[validate(range(min = 1, message = "eventId must be > 0"))]
    pub event_id: i64,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "usn is required"))]
    pub usn: String,
    #[validate(email(message = "email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "branchName is required"))]
    pub branch_name: String,
    #[validate(length(min = 1, message = "academicYear is required"))]
    pub academic_year: String,
}

impl NewRegistration {
    /// Strips surrounding whitespace from every text field.
    pub fn trimmed(self) -> Self {
        NewRegistration {
            event_id: self.event_id,
            name: self.name.trim().to_string(),
            usn: self.usn.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            branch_name: self.branch_name.trim().to_string(),
            academic_year: self.academic_year.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> NewRegistration {
        serde_json::from_value(serde_json::json!({
            "eventId": 4,
            "name": "  Asha Rao ",
            "usn": "1XX21CS001",
            "email": " asha@example.edu ",
            "phone": " 9876543210",
            "branchName": "CSE",
            "academicYear": "3"
        }))
        .unwrap()
    }

    #[test]
    fn trims_before_validation() {
        let new = candidate().trimmed();
        assert_eq!(new.name, "Asha Rao");
        assert_eq!(new.email, "asha@example.edu");
        assert_eq!(new.phone, "9876543210");
        assert!(new.validate().is_ok());
    }

    #[test]
    fn rejects_blank_and_bad_email() {
        let mut new = candidate().trimmed();
        new.email = "not-an-email".into();
        new.usn = String::new();
        let errors = new.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("usn"));
    }
}
