use rocket::{
    http::Status,
    serde::json::{json, Json, Value},
    Route, State,
};

use crate::{
    api::Body,
    error::Result,
    model::{
        api::{
            history::CompletedSurveys,
            results::SurveyResults,
            survey::{AdminSurveySummary, PublicSurvey, SurveyDetail, UserSurveyStatus},
        },
        auth::{Admin, AuthToken, Member},
        id::{Id, PublicId},
        survey::{Survey, SurveySpec, SurveyUpdate},
        vote::VoteRequest,
    },
    ops,
    store::Store,
};

pub fn routes() -> Vec<Route> {
    routes![
        list_surveys,
        my_completed_surveys,
        list_surveys_admin,
        create_survey,
        user_completed_surveys,
        get_survey,
        update_survey,
        delete_survey,
        public_survey,
        vote,
        results,
    ]
}

#[get("/api/surveys/list")]
async fn list_surveys(
    token: AuthToken<Member>,
    store: &State<Store>,
) -> Result<Json<Vec<UserSurveyStatus>>> {
    let surveys = ops::surveys::list_surveys(store, &token.caller()).await?;
    Ok(Json(surveys))
}

#[get("/api/surveys/my/completed")]
async fn my_completed_surveys(
    token: AuthToken<Member>,
    store: &State<Store>,
) -> Result<Json<CompletedSurveys>> {
    let caller = token.caller();
    let completed = ops::surveys::completed_surveys(store, &caller, &caller.id).await?;
    Ok(Json(completed))
}

#[get("/api/surveys")]
async fn list_surveys_admin(
    token: AuthToken<Admin>,
    store: &State<Store>,
) -> Result<Json<Vec<AdminSurveySummary>>> {
    let surveys = ops::surveys::list_surveys_admin(store, &token.caller()).await?;
    Ok(Json(surveys))
}

#[post("/api/surveys", data = "<spec>")]
async fn create_survey(
    token: AuthToken<Admin>,
    spec: Body<SurveySpec>,
    store: &State<Store>,
) -> Result<(Status, Json<Survey>)> {
    let survey = ops::surveys::create_survey(store, &token.caller(), spec.0).await?;
    Ok((Status::Created, Json(survey)))
}

#[get("/api/surveys/user/<user_id>/completed")]
async fn user_completed_surveys(
    token: AuthToken<Admin>,
    user_id: Id,
    store: &State<Store>,
) -> Result<Json<CompletedSurveys>> {
    let completed = ops::surveys::completed_surveys(store, &token.caller(), &user_id).await?;
    Ok(Json(completed))
}

#[get("/api/surveys/<survey_id>")]
async fn get_survey(
    token: AuthToken<Admin>,
    survey_id: Id,
    store: &State<Store>,
) -> Result<Json<SurveyDetail>> {
    let detail = ops::surveys::survey_detail(store, &token.caller(), &survey_id).await?;
    Ok(Json(detail))
}

#[put("/api/surveys/<survey_id>", data = "<update>")]
async fn update_survey(
    token: AuthToken<Admin>,
    survey_id: Id,
    update: Body<SurveyUpdate>,
    store: &State<Store>,
) -> Result<Json<Survey>> {
    let survey = ops::surveys::update_survey(store, &token.caller(), &survey_id, update.0).await?;
    Ok(Json(survey))
}

#[delete("/api/surveys/<survey_id>")]
async fn delete_survey(
    token: AuthToken<Admin>,
    survey_id: Id,
    store: &State<Store>,
) -> Result<Status> {
    ops::surveys::delete_survey(store, &token.caller(), &survey_id).await?;
    Ok(Status::NoContent)
}

#[get("/api/surveys/public/<public_id>")]
async fn public_survey(public_id: PublicId, store: &State<Store>) -> Result<Json<PublicSurvey>> {
    let survey = ops::surveys::public_survey(store, &public_id).await?;
    Ok(Json(survey))
}

#[post("/api/surveys/public/<public_id>/vote", data = "<request>")]
async fn vote(
    token: AuthToken<Member>,
    public_id: PublicId,
    request: Body<VoteRequest>,
    store: &State<Store>,
) -> Result<(Status, Json<Value>)> {
    ops::surveys::cast_vote(store, &token.caller(), &public_id, request.0).await?;
    Ok((Status::Created, Json(json!({ "ok": true }))))
}

#[get("/api/surveys/public/<public_id>/results")]
async fn results(
    _token: AuthToken<Member>,
    public_id: PublicId,
    store: &State<Store>,
) -> Result<Json<SurveyResults>> {
    let results = ops::surveys::results(store, &public_id).await?;
    Ok(Json(results))
}
