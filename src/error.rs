use argon2::Error as Argon2Error;
use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::{debug, error};
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder},
    serde::json::{json, Json},
    Request,
};
use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything an operation can fail with. The core only ever produces these
/// abstract kinds; the mapping to HTTP statuses lives in [`Error::status`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error("User not found")]
    UserNotFound,
    #[error("Survey not found")]
    SurveyNotFound,
    #[error("Email already registered")]
    AlreadyRegistered,
    #[error("User already voted")]
    AlreadyVoted,
    #[error("Cannot modify survey with existing votes ({votes} so far)")]
    SurveyLocked { votes: usize },
    #[error("Invalid optionId")]
    InvalidOption,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("{0}")]
    BadRequest(String),
    #[error("Server state is not configured")]
    Unconfigured,
}

impl Error {
    pub fn status(&self) -> Status {
        match self {
            Self::Storage(_) | Self::Argon2(_) | Self::Unconfigured => {
                Status::InternalServerError
            }
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature
                | JwtErrorKind::ImmatureSignature
                | JwtErrorKind::InvalidSignature
                | JwtErrorKind::InvalidToken => Status::Unauthorized,
                _ => Status::BadRequest,
            },
            Self::UserNotFound | Self::SurveyNotFound => Status::NotFound,
            Self::AlreadyRegistered | Self::AlreadyVoted | Self::SurveyLocked { .. } => {
                Status::Conflict
            }
            Self::InvalidOption | Self::BadRequest(_) => Status::BadRequest,
            Self::InvalidCredentials | Self::Unauthorized => Status::Unauthorized,
            Self::Forbidden => Status::Forbidden,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.class() == StatusClass::ServerError {
            error!("{self}");
        } else {
            debug!("{self}");
        }

        let body = match self {
            Self::SurveyLocked { votes } => json!({
                "error": "Cannot modify survey with existing votes",
                "totalVotes": votes,
            }),
            // Internal details stay in the log.
            Self::Storage(_) | Self::Argon2(_) | Self::Unconfigured => {
                json!({ "error": "Internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert_eq!(Error::SurveyNotFound.status(), Status::NotFound);
        assert_eq!(Error::UserNotFound.status(), Status::NotFound);
        assert_eq!(Error::AlreadyRegistered.status(), Status::Conflict);
        assert_eq!(Error::AlreadyVoted.status(), Status::Conflict);
        assert_eq!(Error::SurveyLocked { votes: 1 }.status(), Status::Conflict);
        assert_eq!(Error::InvalidOption.status(), Status::BadRequest);
        assert_eq!(Error::InvalidCredentials.status(), Status::Unauthorized);
        assert_eq!(Error::Forbidden.status(), Status::Forbidden);
        assert_eq!(Error::Unconfigured.status(), Status::InternalServerError);
    }
}
