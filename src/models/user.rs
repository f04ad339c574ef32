use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// The User struct is the identity record embedded in a provider session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form profile data attached at signup (`first_name`, `last_name`).
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl User {
    /// Construct a user with only an id and email, as used by tests and fakes.
    pub fn new(id: Uuid, email: impl Into<String>) -> Self {
        User {
            id,
            email: Some(email.into()),
            user_metadata: Map::new(),
            created_at: None,
            email_confirmed_at: None,
        }
    }

    /// Look up a string field in `user_metadata`.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata.get(key).and_then(Value::as_str)
    }

    pub fn first_name(&self) -> Option<&str> {
        self.metadata_str("first_name")
    }

    pub fn last_name(&self) -> Option<&str> {
        self.metadata_str("last_name")
    }

    /// "First Last" when profile names are known, otherwise the email,
    /// otherwise the id.
    pub fn display_name(&self) -> String {
        match (self.first_name(), self.last_name()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            _ => self
                .email
                .clone()
                .unwrap_or_else(|| self.id.to_string()),
        }
    }

    pub fn is_email_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_provider_user_payload() {
        let payload = json!({
            "id": "6f1c8f5e-3c7a-4d43-9e2c-2b1f9a3c0d11",
            "aud": "authenticated",
            "role": "authenticated",
            "email": "rep@felony.fit",
            "email_confirmed_at": "2024-03-01T10:00:00.123456Z",
            "created_at": "2024-03-01T09:59:00Z",
            "user_metadata": {"first_name": "Max", "last_name": "Rep"},
            "app_metadata": {"provider": "email"}
        });

        let user: User = serde_json::from_value(payload).expect("user should parse");
        assert_eq!(user.email.as_deref(), Some("rep@felony.fit"));
        assert_eq!(user.first_name(), Some("Max"));
        assert_eq!(user.display_name(), "Max Rep");
        assert!(user.is_email_confirmed());
    }

    #[test]
    fn display_name_falls_back_to_email() {
        let user = User::new(Uuid::nil(), "nobody@felony.fit");
        assert_eq!(user.display_name(), "nobody@felony.fit");
        assert!(!user.is_email_confirmed());
    }
}
