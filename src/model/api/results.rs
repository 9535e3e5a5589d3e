use serde::{Deserialize, Serialize};

use crate::model::{
    id::{Id, PublicId},
    snapshot::Snapshot,
    survey::Survey,
};
use crate::voting::{self, OptionTally};

/// Tallied results of a survey, in the survey's option order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResults {
    pub survey_id: Id,
    pub public_id: PublicId,
    pub question: String,
    pub total_votes: usize,
    pub options: Vec<OptionTally>,
}

impl SurveyResults {
    pub fn new(snapshot: &Snapshot, survey: &Survey) -> Self {
        let tally = voting::tally(snapshot, survey);
        Self {
            survey_id: survey.id.clone(),
            public_id: survey.public_id.clone(),
            question: survey.question.clone(),
            total_votes: tally.total_votes,
            options: tally.per_option,
        }
    }
}
