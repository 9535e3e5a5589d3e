use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use rocket::{
    http::{Cookie, SameSite, Status},
    request::{FromRequest, Outcome},
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    id::Id,
    user::{Role, User},
};
use crate::store::Store;

use super::{access::Access, Caller};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token for a specific user, valid for routes whose
/// access level `A` admits that user's role.
#[derive(Serialize, Deserialize)]
pub struct AuthToken<A> {
    #[serde(rename = "sub")]
    id: Id,
    email: String,
    role: Role,
    #[serde(skip)]
    phantom: PhantomData<A>,
}

impl<A> AuthToken<A> {
    /// Create a new [`AuthToken`] for the given user.
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            phantom: PhantomData,
        }
    }

    /// The identity this token speaks for.
    pub fn caller(&self) -> Caller {
        Caller {
            id: self.id.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }

    /// Sign this token as a JWT.
    pub fn encode(&self, config: &Config) -> Result<String> {
        let claims = Claims {
            token: AuthToken::<A> {
                id: self.id.clone(),
                email: self.email.clone(),
                role: self.role,
                phantom: PhantomData,
            },
            expire_at: Utc::now() + config.auth_ttl(),
        };
        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?)
    }

    /// Verify and decode a JWT.
    pub fn decode(jwt: &str, config: &Config) -> Result<Self> {
        let token = jsonwebtoken::decode(
            jwt,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims<A>>| claims.claims.token)?;
        Ok(token)
    }

    /// Wrap a signed JWT in the auth cookie.
    pub fn cookie(jwt: String, config: &Config) -> Cookie<'static> {
        Cookie::build(AUTH_TOKEN_COOKIE, jwt)
            .max_age(time::Duration::seconds(config.auth_ttl().num_seconds()))
            .http_only(true)
            .same_site(SameSite::Strict)
            .finish()
    }
}

/// JWT claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims<A> {
    #[serde(flatten, bound = "")]
    token: AuthToken<A>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// The raw JWT from `Authorization: Bearer ...`, falling back to the cookie.
fn raw_token(req: &Request<'_>) -> Option<String> {
    if let Some(header) = req.headers().get_one("Authorization") {
        return header.strip_prefix("Bearer ").map(str::to_string);
    }
    req.cookies()
        .get(AUTH_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

#[rocket::async_trait]
impl<'r, A> FromRequest<'r> for AuthToken<A>
where
    A: Access + Send,
{
    type Error = Error;

    /// Get an [`AuthToken`] from the request, check that the user still
    /// exists, and that their role is admitted by `A`.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let rocket = req.rocket();
        let (config, store) = match (rocket.state::<Config>(), rocket.state::<Store>()) {
            (Some(config), Some(store)) => (config, store),
            _ => return Outcome::Failure((Status::InternalServerError, Error::Unconfigured)),
        };

        let jwt = match raw_token(req) {
            Some(jwt) => jwt,
            None => return Outcome::Failure((Status::Unauthorized, Error::Unauthorized)),
        };
        let token = match Self::decode(&jwt, config) {
            Ok(token) => token,
            Err(e) => return Outcome::Failure((Status::Unauthorized, e)),
        };

        // The role in the token could be stale; trust the stored user.
        match store.load().await {
            Ok(snapshot) => match snapshot.user_by_id(&token.id) {
                Some(user) if A::admits(user.role) => Outcome::Success(Self::new(user)),
                Some(_) => Outcome::Failure((Status::Forbidden, Error::Forbidden)),
                None => Outcome::Failure((Status::Unauthorized, Error::Unauthorized)),
            },
            Err(e) => Outcome::Failure((Status::InternalServerError, e.into())),
        }
    }
}
