//! Participation history: which surveys a user has answered, and how.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    id::{Id, PublicId},
    snapshot::Snapshot,
    survey::{Survey, SurveyOption},
    user::{Role, User},
    vote::Vote,
};

/// A user's votes paired with the surveys they belong to, in vote order.
/// Votes whose survey has since been deleted are skipped.
fn answered<'a>(
    snapshot: &'a Snapshot,
    user_id: &'a str,
) -> impl Iterator<Item = (&'a Vote, &'a Survey)> {
    snapshot
        .votes_by_user(user_id)
        .filter_map(move |vote| Some((vote, snapshot.survey_by_id(&vote.survey_id)?)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSurvey {
    pub survey_id: Id,
    pub public_id: PublicId,
    pub question: String,
    pub completed_at: DateTime<Utc>,
    /// `null` if the chosen option was removed from the survey.
    pub selected_option: Option<SurveyOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedSurveys {
    pub user_id: Id,
    pub user_email: String,
    pub total_completed_surveys: usize,
    pub surveys: Vec<CompletedSurvey>,
}

impl CompletedSurveys {
    pub fn new(snapshot: &Snapshot, user: &User) -> Self {
        let surveys: Vec<_> = answered(snapshot, &user.id)
            .map(|(vote, survey)| CompletedSurvey {
                survey_id: survey.id.clone(),
                public_id: survey.public_id.clone(),
                question: survey.question.clone(),
                completed_at: vote.created_at,
                selected_option: survey.option(&vote.option_id).cloned(),
            })
            .collect();
        Self {
            user_id: user.id.clone(),
            user_email: user.email.clone(),
            total_completed_surveys: surveys.len(),
            surveys,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub survey_id: Id,
    pub question: String,
    pub public_id: PublicId,
    pub chosen_option_id: Id,
    pub voted_at: DateTime<Utc>,
}

/// The signed-in user's own account plus participation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Id,
    pub email: String,
    pub role: Role,
    pub history: Vec<HistoryEntry>,
}

impl Profile {
    pub fn new(snapshot: &Snapshot, user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            history: answered(snapshot, &user.id)
                .map(|(vote, survey)| HistoryEntry {
                    survey_id: survey.id.clone(),
                    question: survey.question.clone(),
                    public_id: survey.public_id.clone(),
                    chosen_option_id: vote.option_id.clone(),
                    voted_at: vote.created_at,
                })
                .collect(),
        }
    }
}
