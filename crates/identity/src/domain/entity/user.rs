use std::fmt;

use chrono::{DateTime, Utc};

/// Role stored per user and mirrored back into the provider's private
/// metadata. New users default to `User`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserRole {
    Admin,
    Vendor,
    #[default]
    User,
}

impl UserRole {
    /// Wire/storage form of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Vendor => "VENDOR",
            UserRole::User => "USER",
        }
    }
}

impl From<&str> for UserRole {
    fn from(value: &str) -> Self {
        match value.to_uppercase().as_str() {
            "ADMIN" => UserRole::Admin,
            "VENDOR" => UserRole::Vendor,
            _ => UserRole::User,
        }
    }
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        UserRole::from(value.as_str())
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// The provider's subject id, used as the local primary key.
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: String, email: String, full_name: String, avatar_url: Option<String>, role: UserRole) -> Self {
        Self {
            id,
            email,
            full_name,
            avatar_url,
            role,
            created_at: DateTime::default(), // UNIX_EPOCH (1970-01-01 UTC)
            updated_at: DateTime::default(), // UNIX_EPOCH (1970-01-01 UTC)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from("ADMIN"), UserRole::Admin);
        assert_eq!(UserRole::from("admin"), UserRole::Admin);
        assert_eq!(UserRole::from("Vendor"), UserRole::Vendor);
        assert_eq!(UserRole::from("USER"), UserRole::User);
        assert_eq!(UserRole::from("anything-else"), UserRole::User);
    }

    #[test]
    fn test_user_role_default() {
        assert_eq!(UserRole::default(), UserRole::User);
    }

    #[test]
    fn test_user_role_display_matches_storage_form() {
        assert_eq!(UserRole::Admin.to_string(), "ADMIN");
        assert_eq!(UserRole::Vendor.to_string(), "VENDOR");
        assert_eq!(UserRole::User.to_string(), "USER");
    }

    #[test]
    fn test_user_new() {
        let user = User::new(
            "user_2abc".to_string(),
            "jane@example.com".to_string(),
            "Jane Doe".to_string(),
            Some("https://img.example.com/jane.png".to_string()),
            UserRole::Vendor,
        );

        assert_eq!(user.id, "user_2abc");
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.full_name, "Jane Doe");
        assert_eq!(user.role, UserRole::Vendor);
        assert!(user.created_at <= Utc::now());
    }
}
