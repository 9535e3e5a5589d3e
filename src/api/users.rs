use rocket::{
    serde::json::{json, Json, Value},
    Route, State,
};

use crate::{
    api::Body,
    error::Result,
    model::{
        api::history::Profile,
        auth::{AuthToken, Member},
        user::PasswordChange,
    },
    ops,
    store::Store,
};

pub fn routes() -> Vec<Route> {
    routes![me, change_password]
}

#[get("/api/users/me")]
async fn me(token: AuthToken<Member>, store: &State<Store>) -> Result<Json<Profile>> {
    let profile = ops::users::profile(store, &token.caller()).await?;
    Ok(Json(profile))
}

#[put("/api/users/change-password", data = "<change>")]
async fn change_password(
    token: AuthToken<Member>,
    change: Body<PasswordChange>,
    store: &State<Store>,
) -> Result<Json<Value>> {
    ops::users::change_password(store, &token.caller(), change.0).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Password changed successfully",
    })))
}
