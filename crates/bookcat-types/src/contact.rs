use std::str::FromStr;

use garde::Validate;
use serde::{Deserialize, Serialize};

/// Longest address that fits the author email column
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Contact address of an author.
///
/// Surrounding whitespace is dropped and the domain part is lowercased when
/// the value is built, so two spellings of one mailbox collide on the unique
/// email column. The local part is kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Validate, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(from = "String")]
#[garde(transparent)]
pub struct AuthorEmail(#[garde(email, length(max = 254))] String);

impl AuthorEmail {
    fn normalized(raw: &str) -> Self {
        let raw = raw.trim();
        let email = match raw.rsplit_once('@') {
            Some((local, domain)) => format!("{local}@{}", domain.to_ascii_lowercase()),
            None => raw.to_string(),
        };
        AuthorEmail(email)
    }

    pub fn domain(&self) -> Option<&str> {
        self.0.rsplit_once('@').map(|(_, domain)| domain)
    }
}

impl From<String> for AuthorEmail {
    fn from(value: String) -> Self {
        AuthorEmail::normalized(&value)
    }
}

impl FromStr for AuthorEmail {
    type Err = garde::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let email = AuthorEmail::normalized(s);
        email.validate()?;
        Ok(email)
    }
}

impl std::fmt::Display for AuthorEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AuthorEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
