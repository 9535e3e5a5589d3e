use std::fmt::Display;

use argon2::Config;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{clock, id::Id};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
/// Upper bound for passwords chosen through the change-password flow.
pub const MAX_NEW_PASSWORD_LENGTH: usize = 50;
/// Special characters accepted (and one of which is required) in new passwords.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Display for Role {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Admin => "admin",
                Self::User => "user",
            }
        )
    }
}

/// A registered account, as persisted in the data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Id,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user with a freshly minted id, hashing the given password.
    pub fn new(email: String, password: &str, role: Role) -> Result<Self> {
        Ok(Self {
            id: Id::new(),
            email,
            password_hash: hash_password(password)?,
            role,
            created_at: clock::now(),
        })
    }

    /// Check whether the given password is correct.
    ///
    /// A malformed stored hash counts as a mismatch.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> bool {
        argon2::verify_encoded(&self.password_hash, password.as_ref()).unwrap_or(false)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    // 16 bytes is the recommended salt length for argon2.
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    Ok(argon2::hash_encoded(
        password.as_bytes(),
        &salt,
        &Config::default(),
    )?)
}

/// Raw credentials, received from a user on registration or login. These are
/// never stored directly, since the password is in plaintext.
#[derive(Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> Result<()> {
        if !is_valid_email(&self.email) {
            return Err(Error::BadRequest(format!(
                "Invalid email address: {}",
                self.email
            )));
        }
        let len = self.password.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&len) {
            return Err(Error::BadRequest(format!(
                "Password must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(())
    }
}

/// Request to replace the caller's password.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

impl PasswordChange {
    pub fn validate(&self) -> Result<()> {
        if self.current_password.is_empty() {
            return Err(Error::BadRequest(
                "Current password is required".to_string(),
            ));
        }
        let len = self.new_password.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_NEW_PASSWORD_LENGTH).contains(&len) {
            return Err(Error::BadRequest(format!(
                "New password must be between {MIN_PASSWORD_LENGTH} and {MAX_NEW_PASSWORD_LENGTH} characters"
            )));
        }
        let password = &self.new_password;
        let strong = password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_uppercase())
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
        if !strong {
            return Err(Error::BadRequest(format!(
                "Password must contain at least one lowercase letter, one uppercase letter, one digit, and one of {PASSWORD_SPECIALS}"
            )));
        }
        Ok(())
    }
}

/// Loose structural check: `local@domain.tld` with no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map_or(false, |(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@b."));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b@c.com"));
    }

    #[test]
    fn credential_bounds() {
        assert!(Credentials::example().validate().is_ok());
        let short = Credentials {
            email: "a@b.com".into(),
            password: "short".into(),
        };
        assert!(matches!(short.validate(), Err(Error::BadRequest(_))));
        let bad_email = Credentials {
            email: "nope".into(),
            password: "longenough".into(),
        };
        assert!(matches!(bad_email.validate(), Err(Error::BadRequest(_))));
    }

    #[test]
    fn new_password_strength() {
        let change = |new: &str| PasswordChange {
            current_password: "whatever".into(),
            new_password: new.into(),
        };
        assert!(change("Str0ng!pw").validate().is_ok());
        assert!(change("weakpassword").validate().is_err());
        assert!(change("NoDigits!!").validate().is_err());
        assert!(change("n0upper!!").validate().is_err());
        assert!(change("N0SPECIAL1a").validate().is_err());
        assert!(change("Sh0r!").validate().is_err());
        assert!(change(&format!("A1!{}", "a".repeat(60))).validate().is_err());
    }

    #[test]
    fn hash_and_verify() {
        let user = User::new("a@b.com".into(), "Password1!", Role::User).unwrap();
        assert_ne!(user.password_hash, "Password1!");
        assert!(user.verify_password("Password1!"));
        assert!(!user.verify_password("password1!"));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        let mut user = User::example();
        user.password_hash = "not a hash".into();
        assert!(!user.verify_password("anything"));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = rocket::serde::json::serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"admin\"");
    }
}
