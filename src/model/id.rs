use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;

use data_encoding::BASE64URL_NOPAD;
use rand::RngCore;
use rocket::{
    http::{
        impl_from_uri_param_identity,
        uri::fmt::{Path, UriDisplay},
    },
    request::FromParam,
};
use serde::{Deserialize, Serialize};

/// Random bytes behind an internal [`Id`]; encodes to 12 URL-safe characters.
const ID_BYTES: usize = 9;
/// Random bytes behind a [`PublicId`]; encodes to 8 URL-safe characters.
const PUBLIC_ID_BYTES: usize = 6;

fn random_token(len: usize) -> String {
    let mut bytes = vec![0_u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64URL_NOPAD.encode(&bytes)
}

/// Opaque internal identifier for users, surveys, options and votes.
///
/// Ids read back from the data file are accepted verbatim, so any string is
/// a valid `Id`; freshly minted ones come from [`Id::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Mint a fresh, process-wide unique id.
    pub fn new() -> Self {
        Self(random_token(ID_BYTES))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

/// Short opaque identifier used in voter-facing links.
///
/// Public ids are shorter than internal ids, so the two spaces never overlap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(String);

impl PublicId {
    /// Mint a fresh, URL-safe public id.
    pub fn new() -> Self {
        Self(random_token(PUBLIC_ID_BYTES))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PublicId {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! string_id_impls {
    ($ty:ident) => {
        impl Deref for $ty {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $ty {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $ty {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl PartialEq<str> for $ty {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $ty {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl<'a> FromParam<'a> for $ty {
            type Error = Infallible;

            fn from_param(param: &'a str) -> Result<Self, Self::Error> {
                Ok(Self(param.to_string()))
            }
        }

        impl UriDisplay<Path> for $ty {
            fn fmt(
                &self,
                formatter: &mut rocket::http::uri::fmt::Formatter<'_, Path>,
            ) -> std::fmt::Result {
                formatter.write_value(&self.0)
            }
        }

        impl_from_uri_param_identity!([Path] $ty);
    };
}

string_id_impls!(Id);
string_id_impls!(PublicId);

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn minted_ids_are_url_safe() {
        let id = Id::new();
        assert_eq!(id.len(), 12);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let public = PublicId::new();
        assert_eq!(public.len(), 8);
        assert!(public
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn minted_ids_do_not_repeat() {
        let ids: HashSet<Id> = (0..1000).map(|_| Id::new()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = Id::from("abc123");
        let json = rocket::serde::json::serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc123\"");
        let back: Id = rocket::serde::json::serde_json::from_str(&json).unwrap();
        assert_eq!(back, "abc123");
    }
}
