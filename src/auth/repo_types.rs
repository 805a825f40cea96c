use serde::Serialize;
use sqlx::FromRow;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub email: String,    // unique, compared as stored
    pub password: String, // Argon2 digest, never serialized
}

/// What `/api/me` is allowed to see of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PublicProfile {
    pub id: i64,
    pub name: String,
    pub surname: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_digest: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_profile_serializes_three_fields() {
        let profile = PublicProfile {
            id: 4,
            name: "Ada".into(),
            surname: "Lovelace".into(),
        };
        let json = serde_json::to_value(profile).unwrap();
        assert_eq!(json, serde_json::json!({"id": 4, "name": "Ada", "surname": "Lovelace"}));
    }
}
