use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Issued by the API login, sent in the `X-Medialog-Token` header.
    Api,
    /// Backs a browser session cookie.
    Application,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Api => "api",
            TokenKind::Application => "application",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct TokenKindParseError(pub String);

impl fmt::Display for TokenKindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown token kind: {}", self.0)
    }
}

impl std::error::Error for TokenKindParseError {}

impl FromStr for TokenKind {
    type Err = TokenKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(TokenKind::Api),
            "application" => Ok(TokenKind::Application),
            other => Err(TokenKindParseError(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub is_valid: bool,
    pub expires: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

impl Token {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires
    }
}
