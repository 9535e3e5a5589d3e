use log::debug;
use rocket::{
    data::{self, Data, FromData},
    http::Status,
    outcome::Outcome,
    serde::json::{json, Error as JsonError, Json, Value},
    Catcher, Request, Route,
};
use serde::Deserialize;

use crate::error::Error;

mod auth;
mod surveys;
mod users;

pub fn routes() -> Vec<Route> {
    let mut routes = routes![health];
    routes.extend(auth::routes());
    routes.extend(users::routes());
    routes.extend(surveys::routes());
    routes
}

pub fn catchers() -> Vec<Catcher> {
    catchers![
        bad_request,
        unauthorized,
        forbidden,
        not_found,
        unprocessable_entity,
        internal_error
    ]
}

#[get("/api/health")]
fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// Why the request body was rejected, kept for the 400 catcher.
struct BodyRejection(Option<String>);

/// A JSON request body. Unlike [`Json`], a body that fails to parse is a
/// 400 whose error message says what was wrong with it.
pub struct Body<T>(pub T);

#[rocket::async_trait]
impl<'r, T: Deserialize<'r>> FromData<'r> for Body<T> {
    type Error = Error;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> data::Outcome<'r, Self> {
        match Json::<T>::from_data(req, data).await {
            Outcome::Success(Json(value)) => Outcome::Success(Body(value)),
            Outcome::Forward(data) => Outcome::Forward(data),
            Outcome::Failure((_, err)) => {
                let message = match err {
                    JsonError::Io(e) => e.to_string(),
                    JsonError::Parse(_, e) => e.to_string(),
                };
                debug!("Rejected request body: {message}");
                req.local_cache(|| BodyRejection(Some(message.clone())));
                Outcome::Failure((Status::BadRequest, Error::BadRequest(message)))
            }
        }
    }
}

#[catch(400)]
fn bad_request(req: &Request<'_>) -> Json<Value> {
    let message = match req.local_cache(|| BodyRejection(None)) {
        BodyRejection(Some(message)) => format!("Invalid request body: {message}"),
        BodyRejection(None) => "Bad request".to_string(),
    };
    Json(json!({ "error": message }))
}

#[catch(401)]
fn unauthorized() -> Json<Value> {
    Json(json!({ "error": "Unauthorized" }))
}

#[catch(403)]
fn forbidden() -> Json<Value> {
    Json(json!({ "error": "Forbidden" }))
}

#[catch(404)]
fn not_found() -> Json<Value> {
    Json(json!({ "error": "Not found" }))
}

#[catch(422)]
fn unprocessable_entity() -> Json<Value> {
    Json(json!({ "error": "Invalid request body" }))
}

#[catch(500)]
fn internal_error() -> Json<Value> {
    Json(json!({ "error": "Internal server error" }))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
    };

    use super::*;

    #[backend_test]
    async fn health_check(client: Client) {
        let response = client.get(uri!(health)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body, json!({ "ok": true }));
    }

    #[backend_test]
    async fn unknown_route_is_json_404(client: Client) {
        let response = client.get("/api/nothing-here").dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "Not found");
    }

    #[backend_test]
    async fn malformed_body_is_bad_request(client: Client) {
        let response = client
            .post("/api/auth/login")
            .header(ContentType::JSON)
            .body(r#"{"email": "voter@example.com""#)
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));
    }

    #[backend_test]
    async fn missing_field_is_bad_request(client: Client) {
        let response = client
            .post("/api/auth/register")
            .header(ContentType::JSON)
            .body(json!({ "email": "voter@example.com" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }
}
