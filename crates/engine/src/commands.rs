//! Command structs for engine operations.
//!
//! These types group parameters for write operations (bill and user
//! mutations), keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};

/// Create or update a bill. One shape serves both mutations.
#[derive(Clone, Debug)]
pub struct BillCmd {
    pub user_id: i64,
    pub amount: String,
    pub description: String,
    pub date: Option<DateTime<Utc>>,
    pub receiver: String,
    pub location: String,
    pub consumers: Vec<String>,
}

impl BillCmd {
    #[must_use]
    pub fn new(
        user_id: i64,
        amount: impl Into<String>,
        receiver: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            amount: amount.into(),
            description: String::new(),
            date: None,
            receiver: receiver.into(),
            location: location.into(),
            consumers: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn consumer(mut self, consumer: impl Into<String>) -> Self {
        self.consumers.push(consumer.into());
        self
    }

    #[must_use]
    pub fn consumers<I, S>(mut self, consumers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.consumers.extend(consumers.into_iter().map(Into::into));
        self
    }
}

/// Create or update a mirrored user account.
#[derive(Clone, Debug)]
pub struct UserCmd {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub role: String,
}

impl UserCmd {
    #[must_use]
    pub fn new(id: i64, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id,
            first_name: String::new(),
            last_name: String::new(),
            email: email.into(),
            password: password.into(),
            phone: String::new(),
            role: "user".to_string(),
        }
    }

    #[must_use]
    pub fn first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self
    }

    #[must_use]
    pub fn last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = last_name.into();
        self
    }

    #[must_use]
    pub fn phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }
}
