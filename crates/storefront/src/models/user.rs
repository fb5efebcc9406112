//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vivahart_core::{Email, ProductId, UserId};

use super::{Address, Product};

/// The logged-in user as kept in the session.
///
/// Serialized as `{id, email, firstName, lastName}` under the `user`
/// storage key. The backend sometimes sends `_id` instead of `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend user id.
    #[serde(alias = "_id")]
    pub id: UserId,
    /// Login email.
    pub email: Email,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
}

impl User {
    /// "First Last", trimmed when either part is missing.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Full account profile shown on the profile page.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone_number: Option<String>,
    pub email_verified: bool,
    pub active: bool,
    pub role: String,
    /// Ids of every wishlisted product, populated or not.
    pub wishlist_ids: Vec<ProductId>,
    /// Wishlisted products the backend populated.
    pub wishlist: Vec<Product>,
    pub addresses: Vec<Address>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// "First Last".
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// The address flagged as default, if any.
    #[must_use]
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_storage_shape() {
        let user: User = serde_json::from_str(
            r#"{"_id":"u1","email":"asha@example.com","firstName":"Asha","lastName":"Rao"}"#,
        )
        .unwrap();
        assert_eq!(user.id.as_str(), "u1");
        assert_eq!(user.full_name(), "Asha Rao");

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["firstName"], "Asha");
    }

    #[test]
    fn test_full_name_missing_last() {
        let user: User =
            serde_json::from_str(r#"{"id":"u1","email":"a@b.in","firstName":"Asha"}"#).unwrap();
        assert_eq!(user.full_name(), "Asha");
    }
}
