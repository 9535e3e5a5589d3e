use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    api::Body,
    config::Config,
    error::Result,
    model::{
        api::account::AuthResponse,
        auth::{AuthToken, Member, AUTH_TOKEN_COOKIE},
        user::{Credentials, User},
    },
    ops,
    store::Store,
};

pub fn routes() -> Vec<Route> {
    routes![register, login, logout]
}

/// Sign a token for the user and set it as the auth cookie.
fn sign_in(user: &User, cookies: &CookieJar<'_>, config: &Config) -> Result<AuthResponse> {
    let token = AuthToken::<Member>::new(user).encode(config)?;
    cookies.add(AuthToken::<Member>::cookie(token.clone(), config));
    Ok(AuthResponse::new(token, user))
}

#[post("/api/auth/register", data = "<credentials>")]
pub async fn register(
    credentials: Body<Credentials>,
    cookies: &CookieJar<'_>,
    store: &State<Store>,
    config: &State<Config>,
) -> Result<(Status, Json<AuthResponse>)> {
    let user = ops::users::register(store, credentials.0).await?;
    Ok((Status::Created, Json(sign_in(&user, cookies, config)?)))
}

#[post("/api/auth/login", data = "<credentials>")]
pub async fn login(
    credentials: Body<Credentials>,
    cookies: &CookieJar<'_>,
    store: &State<Store>,
    config: &State<Config>,
) -> Result<Json<AuthResponse>> {
    let user = ops::users::authenticate(store, &credentials.0).await?;
    Ok(Json(sign_in(&user, cookies, config)?))
}

#[delete("/api/auth")]
pub fn logout(cookies: &CookieJar<'_>) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}
