mod access;
mod token;

pub use access::{Access, Admin, Member};
pub use token::{AuthToken, AUTH_TOKEN_COOKIE};

use crate::error::{Error, Result};
use crate::model::{
    id::Id,
    user::{Role, User},
};

/// The authenticated identity an operation runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Id,
    pub email: String,
    pub role: Role,
}

impl Caller {
    pub fn require_admin(&self) -> Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(Error::Forbidden)
        }
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}
