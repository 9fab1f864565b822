//! Session token claims and the principal derived from them

use serde::{Deserialize, Serialize};

/// Role carried by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The single statically configured credential
    Owner,
    /// A credential persisted in the admin store
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Claims serialized into a token payload
///
/// `iat` and `exp` are always set by the codec at signing time; any value the
/// caller puts there is overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(
        rename = "adminId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub admin_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Issued-at, seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Expiry, seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Claims for the static owner credential
    pub fn owner(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            role: Some(Role::Owner),
            ..Default::default()
        }
    }

    /// Claims for a stored admin credential
    pub fn admin(email: impl Into<String>, admin_id: i64) -> Self {
        Self {
            email: Some(email.into()),
            admin_id: Some(admin_id),
            role: Some(Role::Admin),
            ..Default::default()
        }
    }

    /// Build the principal, if the claims carry both email and role
    pub fn principal(&self) -> Option<Principal> {
        Some(Principal {
            email: self.email.clone()?,
            role: self.role?,
        })
    }
}

/// Identity attached to a request after its token verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_claims_wire_names() {
        let value = serde_json::to_value(Claims::owner("owner@example.com")).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "email": "owner@example.com", "role": "owner" })
        );
    }

    #[test]
    fn test_admin_claims_use_camel_case_id() {
        let value = serde_json::to_value(Claims::admin("a@example.com", 7)).unwrap();

        assert_eq!(value["adminId"], 7);
        assert_eq!(value["role"], "admin");
        assert!(value.get("admin_id").is_none());
    }

    #[test]
    fn test_claims_tolerate_missing_fields() {
        let claims: Claims = serde_json::from_str(r#"{"email":"x@example.com"}"#).unwrap();

        assert_eq!(claims.email.as_deref(), Some("x@example.com"));
        assert!(claims.exp.is_none());
        assert!(claims.principal().is_none());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_str::<Claims>(r#"{"role":"superuser"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_principal_from_claims() {
        let principal = Claims::admin("a@example.com", 3).principal().unwrap();

        assert_eq!(principal.email, "a@example.com");
        assert_eq!(principal.role, Role::Admin);
    }
}
