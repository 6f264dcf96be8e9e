//! Signed-in user profile and roles.

use crate::ids::UserId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Account role as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Customer,
    Staff,
    CustomerSupport,
    Admin,
    /// A role this client does not know about.
    Other(String),
}

impl Role {
    /// Parse a role name, case-insensitively.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_uppercase().as_str() {
            "CUSTOMER" | "USER" => Role::Customer,
            "STAFF" => Role::Staff,
            "CUSTOMER_SUPPORT" => Role::CustomerSupport,
            "ADMIN" => Role::Admin,
            other => Role::Other(other.to_string()),
        }
    }

    /// The backend's name for the role.
    pub fn as_str(&self) -> &str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Staff => "STAFF",
            Role::CustomerSupport => "CUSTOMER_SUPPORT",
            Role::Admin => "ADMIN",
            Role::Other(name) => name,
        }
    }

    /// Staff-side roles never see the customer chat widget.
    pub fn is_back_office(&self) -> bool {
        matches!(self, Role::Staff | Role::CustomerSupport | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Name(String),
            Object { name: String },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Name(name) | Raw::Object { name } => Role::from_name(&name),
        })
    }
}

/// The `/users/my-info` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "phone")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_role", alias = "roleName")]
    pub role: Role,
}

fn default_true() -> bool {
    true
}

fn default_role() -> Role {
    Role::Customer
}

impl UserProfile {
    /// Name to show in headers and chat bubbles.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.email.as_deref())
            .unwrap_or(self.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_string_or_object() {
        let role: Role = serde_json::from_str("\"CUSTOMER_SUPPORT\"").unwrap();
        assert_eq!(role, Role::CustomerSupport);

        let role: Role = serde_json::from_str(r#"{"name": "admin", "description": "x"}"#).unwrap();
        assert_eq!(role, Role::Admin);

        let role: Role = serde_json::from_str("\"AUDITOR\"").unwrap();
        assert_eq!(role, Role::Other("AUDITOR".to_string()));
    }

    #[test]
    fn test_back_office_roles() {
        assert!(!Role::Customer.is_back_office());
        assert!(Role::Staff.is_back_office());
        assert!(Role::CustomerSupport.is_back_office());
        assert!(Role::Admin.is_back_office());
    }

    #[test]
    fn test_profile_deserialize() {
        let json = r#"{
            "id": 12,
            "fullName": "Nguyen Van A",
            "email": "a@example.com",
            "phoneNumber": "0900000000",
            "role": {"name": "CUSTOMER"}
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.id.as_str(), "12");
        assert_eq!(profile.role, Role::Customer);
        assert!(profile.active);
        assert_eq!(profile.display_name(), "Nguyen Van A");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let json = r#"{"id": "u1", "fullName": "  ", "email": "x@y.vn"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.display_name(), "x@y.vn");
    }
}
