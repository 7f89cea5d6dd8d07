//! Request and response bodies of the `/rest` endpoints.
//!
//! # Design
//! These types mirror the mock-server's JSON but are defined independently;
//! the integration tests catch drift between the two crates.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignInBody {
    pub username: String,
    pub password: String,
}

/// `{"success": true}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Success {
    pub success: bool,
}

/// Any JSON object; the fields are ignored.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateUserBody {
    pub username: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credits {
    pub credits: i64,
}

/// Credit top-up tier. Serialized as the bare number 1, 2 or 3.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(into = "u8", try_from = "u8")]
pub enum Multiplier {
    One,
    Two,
    Three,
}

impl From<Multiplier> for u8 {
    fn from(m: Multiplier) -> Self {
        match m {
            Multiplier::One => 1,
            Multiplier::Two => 2,
            Multiplier::Three => 3,
        }
    }
}

impl TryFrom<u8> for Multiplier {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Multiplier::One),
            2 => Ok(Multiplier::Two),
            3 => Ok(Multiplier::Three),
            other => Err(format!("multiplier must be 1, 2 or 3, got {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddCreditsBody {
    pub multiplier: Multiplier,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chat {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatPrompt {
    pub prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_uses_camel_case() {
        let user: User = serde_json::from_str(
            r#"{"username":"tim","firstName":"Tim","lastName":"Van Lerberg"}"#,
        )
        .unwrap();
        assert_eq!(user.first_name, "Tim");
        assert_eq!(user.credits, None);

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["lastName"], "Van Lerberg");
        assert!(json.get("credits").is_none());
    }

    #[test]
    fn multiplier_is_a_bare_number() {
        let body = AddCreditsBody {
            multiplier: Multiplier::Three,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"multiplier":3}"#);
    }

    #[test]
    fn multiplier_rejects_other_numbers() {
        let result: Result<AddCreditsBody, _> = serde_json::from_str(r#"{"multiplier":4}"#);
        assert!(result.is_err());
    }

    #[test]
    fn ack_ignores_fields() {
        let ack: Ack = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(ack, Ack {});
    }

    #[test]
    fn role_is_lowercase() {
        let message: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(Role::System.to_string(), "system");
    }
}
