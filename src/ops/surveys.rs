use log::info;

use crate::error::{Error, Result};
use crate::guard;
use crate::model::{
    api::{
        history::CompletedSurveys,
        results::SurveyResults,
        survey::{AdminSurveySummary, PublicSurvey, SurveyDetail, UserSurveyStatus},
    },
    auth::Caller,
    survey::{Survey, SurveySpec, SurveyUpdate},
    vote::{Vote, VoteRequest},
};
use crate::store::Store;
use crate::voting;

pub async fn create_survey(store: &Store, caller: &Caller, spec: SurveySpec) -> Result<Survey> {
    caller.require_admin()?;
    spec.validate()?;

    let survey = Survey::new(spec, caller.id.clone());
    store
        .transact(|snapshot| {
            snapshot.insert_survey(survey.clone());
            Ok::<_, Error>(())
        })
        .await?;
    info!(
        "Admin {} created survey {} (public {})",
        caller.id, survey.id, survey.public_id
    );
    Ok(survey)
}

pub async fn survey_by_id(store: &Store, id: &str) -> Result<Survey> {
    store
        .load()
        .await?
        .survey_by_id(id)
        .cloned()
        .ok_or(Error::SurveyNotFound)
}

pub async fn survey_by_public_id(store: &Store, public_id: &str) -> Result<Survey> {
    store
        .load()
        .await?
        .survey_by_public_id(public_id)
        .cloned()
        .ok_or(Error::SurveyNotFound)
}

/// A survey with live per-option counts, for admins.
pub async fn survey_detail(store: &Store, caller: &Caller, id: &str) -> Result<SurveyDetail> {
    caller.require_admin()?;
    let snapshot = store.load().await?;
    let survey = snapshot.survey_by_id(id).ok_or(Error::SurveyNotFound)?;
    Ok(SurveyDetail::new(&snapshot, survey))
}

/// The voter-facing view of a survey, reachable without signing in.
pub async fn public_survey(store: &Store, public_id: &str) -> Result<PublicSurvey> {
    survey_by_public_id(store, public_id).await.map(Into::into)
}

/// Every survey with its vote total, in creation order.
pub async fn list_surveys_admin(store: &Store, caller: &Caller) -> Result<Vec<AdminSurveySummary>> {
    caller.require_admin()?;
    let snapshot = store.load().await?;
    Ok(snapshot
        .surveys()
        .iter()
        .map(|survey| AdminSurveySummary::new(&snapshot, survey))
        .collect())
}

/// Every survey, annotated with whether the caller has voted in it.
pub async fn list_surveys(store: &Store, caller: &Caller) -> Result<Vec<UserSurveyStatus>> {
    let snapshot = store.load().await?;
    Ok(snapshot
        .surveys()
        .iter()
        .map(|survey| UserSurveyStatus::new(&snapshot, survey, &caller.id))
        .collect())
}

/// Replace a survey's question and options, as long as nobody has voted.
pub async fn update_survey(
    store: &Store,
    caller: &Caller,
    id: &str,
    update: SurveyUpdate,
) -> Result<Survey> {
    caller.require_admin()?;
    update.validate()?;

    let survey = store
        .transact(|snapshot| guard::apply_update(snapshot, id, update))
        .await?;
    info!("Admin {} updated survey {}", caller.id, survey.id);
    Ok(survey)
}

/// Delete a survey and all of its votes. Returns how many votes went with it.
pub async fn delete_survey(store: &Store, caller: &Caller, id: &str) -> Result<usize> {
    caller.require_admin()?;

    let (survey, votes) = store
        .transact(|snapshot| {
            snapshot
                .delete_survey_cascading(id)
                .ok_or(Error::SurveyNotFound)
        })
        .await?;
    info!(
        "Admin {} deleted survey {} along with {votes} votes",
        caller.id, survey.id
    );
    Ok(votes)
}

/// Record the caller's single vote in the survey behind `public_id`.
pub async fn cast_vote(
    store: &Store,
    caller: &Caller,
    public_id: &str,
    request: VoteRequest,
) -> Result<Vote> {
    if request.option_id.is_empty() {
        return Err(Error::BadRequest("optionId is required".to_string()));
    }

    let vote = store
        .transact(|snapshot| {
            let survey = snapshot
                .survey_by_public_id(public_id)
                .ok_or(Error::SurveyNotFound)?;
            let vote = voting::cast_vote(snapshot, survey, &caller.id, &request.option_id)?;
            snapshot.insert_vote(vote.clone());
            Ok::<_, Error>(vote)
        })
        .await?;
    info!(
        "User {} voted for option {} in survey {}",
        caller.id, vote.option_id, vote.survey_id
    );
    Ok(vote)
}

pub async fn results(store: &Store, public_id: &str) -> Result<SurveyResults> {
    let snapshot = store.load().await?;
    let survey = snapshot
        .survey_by_public_id(public_id)
        .ok_or(Error::SurveyNotFound)?;
    Ok(SurveyResults::new(&snapshot, survey))
}

/// Surveys a given user has answered. Admins may ask about anyone.
pub async fn completed_surveys(
    store: &Store,
    caller: &Caller,
    user_id: &str,
) -> Result<CompletedSurveys> {
    if caller.id != user_id {
        caller.require_admin()?;
    }
    let snapshot = store.load().await?;
    let user = snapshot.user_by_id(user_id).ok_or(Error::UserNotFound)?;
    Ok(CompletedSurveys::new(&snapshot, user))
}

#[cfg(test)]
mod tests {
    use rocket::futures::future::join_all;

    use super::*;
    use crate::model::{id::Id, survey::OptionSpec, user::Role};
    use crate::ops::testing::{insert_user, temp_store};

    fn vote_for(option_id: &Id) -> VoteRequest {
        VoteRequest {
            option_id: option_id.clone(),
        }
    }

    #[rocket::async_test]
    async fn only_admins_create_surveys() {
        let (_dir, store) = temp_store();
        let admin = insert_user(&store, "admin@example.com", Role::Admin).await;
        let user = insert_user(&store, "user@example.com", Role::User).await;

        assert!(matches!(
            create_survey(&store, &user, SurveySpec::example()).await,
            Err(Error::Forbidden)
        ));
        let survey = create_survey(&store, &admin, SurveySpec::example())
            .await
            .unwrap();
        assert_eq!(survey.created_by_user_id, admin.id);
        assert_eq!(survey_by_id(&store, &survey.id).await.unwrap(), survey);
        assert_eq!(
            survey_by_public_id(&store, &survey.public_id).await.unwrap(),
            survey
        );
        // The two id spaces do not mix.
        assert!(survey_by_id(&store, &survey.public_id).await.is_err());
    }

    #[rocket::async_test]
    async fn invalid_spec_is_rejected() {
        let (_dir, store) = temp_store();
        let admin = insert_user(&store, "admin@example.com", Role::Admin).await;
        let mut spec = SurveySpec::example();
        spec.options.truncate(1);
        assert!(matches!(
            create_survey(&store, &admin, spec).await,
            Err(Error::BadRequest(_))
        ));
        assert!(store.load().await.unwrap().surveys.is_empty());
    }

    #[rocket::async_test]
    async fn vote_once_then_conflict() {
        let (_dir, store) = temp_store();
        let admin = insert_user(&store, "admin@example.com", Role::Admin).await;
        let voter = insert_user(&store, "voter@example.com", Role::User).await;
        let survey = create_survey(&store, &admin, SurveySpec::example())
            .await
            .unwrap();
        let option = &survey.options[1].id;

        cast_vote(&store, &voter, &survey.public_id, vote_for(option))
            .await
            .unwrap();
        assert!(matches!(
            cast_vote(&store, &voter, &survey.public_id, vote_for(option)).await,
            Err(Error::AlreadyVoted)
        ));
        assert!(matches!(
            cast_vote(&store, &admin, &survey.public_id, vote_for(&Id::from("nope"))).await,
            Err(Error::InvalidOption)
        ));
        assert!(matches!(
            cast_vote(&store, &admin, "missing", vote_for(option)).await,
            Err(Error::SurveyNotFound)
        ));
        assert!(matches!(
            cast_vote(&store, &admin, &survey.public_id, vote_for(&Id::from(""))).await,
            Err(Error::BadRequest(_))
        ));

        let results = results(&store, &survey.public_id).await.unwrap();
        assert_eq!(results.total_votes, 1);
        assert_eq!(results.options[1].votes_count, 1);
        assert_eq!(results.options[1].percentage, 100);
    }

    #[rocket::async_test]
    async fn concurrent_votes_by_one_user_record_once() {
        let (_dir, store) = temp_store();
        let admin = insert_user(&store, "admin@example.com", Role::Admin).await;
        let voter = insert_user(&store, "voter@example.com", Role::User).await;
        let survey = create_survey(&store, &admin, SurveySpec::example())
            .await
            .unwrap();

        let attempts = survey
            .options
            .iter()
            .map(|option| cast_vote(&store, &voter, &survey.public_id, vote_for(&option.id)));
        let outcomes = join_all(attempts).await;

        assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .filter_map(|o| o.as_ref().err())
            .all(|e| matches!(e, Error::AlreadyVoted)));
        let snapshot = store.load().await.unwrap();
        assert_eq!(snapshot.votes_by_user(&voter.id).count(), 1);
    }

    #[rocket::async_test]
    async fn update_locks_after_first_vote() {
        let (_dir, store) = temp_store();
        let admin = insert_user(&store, "admin@example.com", Role::Admin).await;
        let voter = insert_user(&store, "voter@example.com", Role::User).await;
        let survey = create_survey(&store, &admin, SurveySpec::example())
            .await
            .unwrap();
        let kept = survey.options[0].clone();
        let update = SurveyUpdate {
            question: "Which rendering mode do you prefer?".into(),
            options: vec![
                OptionSpec::NewOptionText("Islands".into()),
                OptionSpec::ExistingOption {
                    id: kept.id.clone(),
                    text: "Client-side".into(),
                },
            ],
        };

        let updated = update_survey(&store, &admin, &survey.id, update.clone())
            .await
            .unwrap();
        assert_eq!(updated.public_id, survey.public_id);
        assert_eq!(updated.options[1].id, kept.id);
        assert_eq!(updated.options[1].text, "Client-side");
        assert_ne!(updated.options[0].id, kept.id);

        cast_vote(&store, &voter, &survey.public_id, vote_for(&kept.id))
            .await
            .unwrap();
        assert!(matches!(
            update_survey(&store, &admin, &survey.id, update).await,
            Err(Error::SurveyLocked { votes: 1 })
        ));
        assert_eq!(survey_by_id(&store, &survey.id).await.unwrap(), updated);
    }

    #[rocket::async_test]
    async fn delete_cascades_to_votes() {
        let (_dir, store) = temp_store();
        let admin = insert_user(&store, "admin@example.com", Role::Admin).await;
        let voter = insert_user(&store, "voter@example.com", Role::User).await;
        let doomed = create_survey(&store, &admin, SurveySpec::example())
            .await
            .unwrap();
        let kept = create_survey(&store, &admin, SurveySpec::example())
            .await
            .unwrap();
        for survey in [&doomed, &kept] {
            for caller in [&admin, &voter] {
                cast_vote(&store, caller, &survey.public_id, vote_for(&survey.options[0].id))
                    .await
                    .unwrap();
            }
        }

        assert!(matches!(
            delete_survey(&store, &voter, &doomed.id).await,
            Err(Error::Forbidden)
        ));
        assert_eq!(delete_survey(&store, &admin, &doomed.id).await.unwrap(), 2);

        assert!(matches!(
            survey_by_id(&store, &doomed.id).await,
            Err(Error::SurveyNotFound)
        ));
        assert!(matches!(
            results(&store, &doomed.public_id).await,
            Err(Error::SurveyNotFound)
        ));
        assert!(matches!(
            delete_survey(&store, &admin, &doomed.id).await,
            Err(Error::SurveyNotFound)
        ));
        let snapshot = store.load().await.unwrap();
        assert_eq!(snapshot.votes.len(), 2);
        assert!(snapshot.votes.iter().all(|v| v.survey_id == kept.id));
    }

    #[rocket::async_test]
    async fn listings_reflect_votes() {
        let (_dir, store) = temp_store();
        let admin = insert_user(&store, "admin@example.com", Role::Admin).await;
        let voter = insert_user(&store, "voter@example.com", Role::User).await;
        let first = create_survey(&store, &admin, SurveySpec::example())
            .await
            .unwrap();
        let second = create_survey(&store, &admin, SurveySpec::example())
            .await
            .unwrap();
        cast_vote(&store, &voter, &second.public_id, vote_for(&second.options[2].id))
            .await
            .unwrap();

        let summaries = list_surveys_admin(&store, &admin).await.unwrap();
        let totals: Vec<_> = summaries.iter().map(|s| s.total_votes).collect();
        assert_eq!(totals, vec![0, 1]);
        assert!(list_surveys_admin(&store, &voter).await.is_err());

        let statuses = list_surveys(&store, &voter).await.unwrap();
        assert_eq!(statuses[0].id, first.id);
        assert!(!statuses[0].has_voted);
        assert!(statuses[1].has_voted);

        let completed = completed_surveys(&store, &voter, &voter.id).await.unwrap();
        assert_eq!(completed.total_completed_surveys, 1);
        assert_eq!(completed.surveys[0].survey_id, second.id);
        assert!(matches!(
            completed_surveys(&store, &voter, &admin.id).await,
            Err(Error::Forbidden)
        ));
        assert!(matches!(
            completed_surveys(&store, &admin, "nobody").await,
            Err(Error::UserNotFound)
        ));

        let detail = survey_detail(&store, &admin, &second.id).await.unwrap();
        assert_eq!(detail.total_votes, 1);
        assert_eq!(detail.options[2].votes, 1);
        assert_eq!(
            public_survey(&store, &first.public_id).await.unwrap().id,
            first.id
        );
    }
}
