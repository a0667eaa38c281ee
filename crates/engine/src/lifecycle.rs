//! Soft-deletion state shared by users, bills and bill references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a row is live or soft-deleted.
///
/// Deleted rows keep their data and the instant they were removed, so they
/// can be restored or still reserve unique values (names, emails).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "at", rename_all = "snake_case")]
pub enum Lifecycle {
    Active,
    Deleted(DateTime<Utc>),
}

impl Lifecycle {
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            None => Self::Active,
            Some(at) => Self::Deleted(at),
        }
    }

    pub fn deleted_at(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deleted(at) => Some(at),
        }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, Self::Deleted(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn lifecycle_round_trips_deleted_at() {
        let now = Utc::now();
        assert_eq!(Lifecycle::from_deleted_at(None), Lifecycle::Active);
        assert_eq!(
            Lifecycle::from_deleted_at(Some(now)),
            Lifecycle::Deleted(now)
        );
        assert_eq!(Lifecycle::Active.deleted_at(), None);
        assert_eq!(Lifecycle::Deleted(now).deleted_at(), Some(now));
    }

    #[test]
    fn lifecycle_predicates() {
        assert!(Lifecycle::Active.is_active());
        assert!(!Lifecycle::Active.is_deleted());
        assert!(Lifecycle::Deleted(Utc::now()).is_deleted());
    }

    #[test]
    fn lifecycle_serializes_tagged() {
        let active = serde_json::to_value(Lifecycle::Active).unwrap();
        assert_eq!(active, serde_json::json!({ "state": "active" }));

        let now = Utc::now();
        let deleted = serde_json::to_value(Lifecycle::Deleted(now)).unwrap();
        assert_eq!(deleted["state"], "deleted");
        assert!(deleted["at"].is_string());
        assert_eq!(
            serde_json::from_value::<Lifecycle>(deleted).unwrap(),
            Lifecycle::Deleted(now)
        );
    }
}
