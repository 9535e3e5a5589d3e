#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{ConfigFairing, StoreFairing};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod logging;
pub mod model;
pub mod ops;
pub mod store;
pub mod voting;

/// Assemble the server from `Rocket.toml` and `ROCKET_*` variables.
pub fn build() -> Rocket<Build> {
    assemble(rocket::build())
}

fn assemble(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(StoreFairing)
        .mount("/", api::routes())
        .register("/", api::catchers())
}

/// A server whose data file lives at `data_path`, with test secrets and the
/// test admin account, and without demo data.
#[cfg(test)]
pub(crate) fn rocket_for_data_path(data_path: &std::path::Path) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("data_path", data_path))
        .merge(("jwt_secret", config::TEST_JWT_SECRET))
        .merge(("auth_ttl", 3600))
        .merge(("admin_email", config::TEST_ADMIN_EMAIL))
        .merge(("admin_password", config::TEST_ADMIN_PASSWORD))
        .merge(("seed_demo_data", false));
    assemble(rocket::custom(figment))
}
