use std::path::PathBuf;

use chrono::Duration;
use log::{error, info};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::ops::seed::{ensure_admin_exists, seed_demo_data};
use crate::store::Store;

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    auth_ttl: u32,
    // secrets
    jwt_secret: String,
}

impl Config {
    /// Valid lifetime of auth tokens in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Secret key used to sign JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the data file and its initial contents.
#[derive(Deserialize)]
struct StoreConfig {
    data_path: PathBuf,
    admin_email: String,
    // secrets
    admin_password: String,
    #[serde(default)]
    seed_demo_data: bool,
}

/// A fairing that opens the data file, makes sure it is readable, ensures
/// the default admin exists (seeding demo data if asked to), and places the
/// [`Store`] into managed state.
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Data store",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<StoreConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load data store config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Opening data file {}...", config.data_path.display());
        let store = Store::new(config.data_path);

        // Fail fast on an unreadable or corrupt file.
        if let Err(e) = store.load().await {
            error!("Failed to open data file: {e}");
            return Err(rocket);
        }

        if let Err(e) =
            ensure_admin_exists(&store, &config.admin_email, &config.admin_password).await
        {
            error!("Failed to ensure admin exists: {e}");
            return Err(rocket);
        }
        if config.seed_demo_data {
            if let Err(e) = seed_demo_data(&store).await {
                error!("Failed to seed demo data: {e}");
                return Err(rocket);
            }
        }
        info!("...data store online!");

        // Manage the state.
        rocket = rocket.manage(store);
        Ok(rocket)
    }
}

#[cfg(test)]
pub const TEST_ADMIN_EMAIL: &str = "admin@example.com";
#[cfg(test)]
pub const TEST_ADMIN_PASSWORD: &str = "Admin123!";
#[cfg(test)]
pub const TEST_JWT_SECRET: &str = "test-secret";
