use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    id::{Id, PublicId},
    snapshot::Snapshot,
    survey::{Survey, SurveyOption},
};
use crate::voting::{self, Tally};

/// One row of the admin survey list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSurveySummary {
    pub id: Id,
    pub question: String,
    pub created_at: DateTime<Utc>,
    pub public_id: PublicId,
    pub total_votes: usize,
}

impl AdminSurveySummary {
    pub fn new(snapshot: &Snapshot, survey: &Survey) -> Self {
        Self {
            id: survey.id.clone(),
            question: survey.question.clone(),
            created_at: survey.created_at,
            public_id: survey.public_id.clone(),
            total_votes: snapshot.vote_count(&survey.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedOption {
    pub id: Id,
    pub text: String,
    pub votes: usize,
}

/// A full survey as the admin sees it, with live vote counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyDetail {
    pub id: Id,
    pub question: String,
    pub options: Vec<CountedOption>,
    pub public_id: PublicId,
    pub created_by_user_id: Id,
    pub created_at: DateTime<Utc>,
    pub total_votes: usize,
}

impl SurveyDetail {
    pub fn new(snapshot: &Snapshot, survey: &Survey) -> Self {
        let Tally {
            total_votes,
            per_option,
        } = voting::tally(snapshot, survey);
        Self {
            id: survey.id.clone(),
            question: survey.question.clone(),
            options: per_option
                .into_iter()
                .map(|option| CountedOption {
                    id: option.option_id,
                    text: option.text,
                    votes: option.votes_count,
                })
                .collect(),
            public_id: survey.public_id.clone(),
            created_by_user_id: survey.created_by_user_id.clone(),
            created_at: survey.created_at,
            total_votes,
        }
    }
}

/// One row of the survey list shown to a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSurveyStatus {
    pub id: Id,
    pub public_id: PublicId,
    pub question: String,
    pub created_at: DateTime<Utc>,
    pub total_votes: usize,
    pub has_voted: bool,
    /// When the user voted, or `null` if they have not.
    pub voted_at: Option<DateTime<Utc>>,
}

impl UserSurveyStatus {
    pub fn new(snapshot: &Snapshot, survey: &Survey, user_id: &str) -> Self {
        let vote = snapshot.vote_by_survey_and_user(&survey.id, user_id);
        Self {
            id: survey.id.clone(),
            public_id: survey.public_id.clone(),
            question: survey.question.clone(),
            created_at: survey.created_at,
            total_votes: snapshot.vote_count(&survey.id),
            has_voted: vote.is_some(),
            voted_at: vote.map(|vote| vote.created_at),
        }
    }
}

/// What anyone holding the public link may see before voting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSurvey {
    pub id: Id,
    pub question: String,
    pub options: Vec<SurveyOption>,
    pub public_id: PublicId,
}

impl From<Survey> for PublicSurvey {
    fn from(survey: Survey) -> Self {
        Self {
            id: survey.id,
            question: survey.question,
            options: survey.options,
            public_id: survey.public_id,
        }
    }
}
