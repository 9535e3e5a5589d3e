//! One-vote-per-user enforcement and result tallying.
//!
//! These functions only read the snapshot; persisting a new vote is the
//! caller's job, inside the same store cycle that ran the checks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{
    clock,
    id::Id,
    snapshot::Snapshot,
    survey::Survey,
    vote::Vote,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteError {
    AlreadyVoted,
    UnknownOption,
}

impl From<VoteError> for Error {
    fn from(err: VoteError) -> Self {
        match err {
            VoteError::AlreadyVoted => Error::AlreadyVoted,
            VoteError::UnknownOption => Error::InvalidOption,
        }
    }
}

/// True iff the user already has a vote in this survey.
pub fn has_voted(snapshot: &Snapshot, survey_id: &str, user_id: &str) -> bool {
    snapshot.vote_by_survey_and_user(survey_id, user_id).is_some()
}

/// Build the vote a user would cast, after checking it is allowed.
///
/// The repeat-vote check comes first, so a user who already voted gets
/// `AlreadyVoted` even when the option is also wrong.
pub fn cast_vote(
    snapshot: &Snapshot,
    survey: &Survey,
    user_id: &Id,
    option_id: &Id,
) -> Result<Vote, VoteError> {
    if has_voted(snapshot, &survey.id, user_id) {
        return Err(VoteError::AlreadyVoted);
    }
    if survey.option(option_id).is_none() {
        return Err(VoteError::UnknownOption);
    }
    Ok(Vote {
        id: Id::new(),
        survey_id: survey.id.clone(),
        user_id: user_id.clone(),
        option_id: option_id.clone(),
        created_at: clock::now(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionTally {
    pub option_id: Id,
    pub text: String,
    pub votes_count: usize,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub total_votes: usize,
    pub per_option: Vec<OptionTally>,
}

/// Count the survey's votes per option, in the survey's option order.
///
/// Every option appears, even with zero votes. Votes naming an option that
/// no longer exists still count toward the total.
pub fn tally(snapshot: &Snapshot, survey: &Survey) -> Tally {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut total_votes = 0;
    for vote in snapshot.votes_for_survey(&survey.id) {
        *counts.entry(vote.option_id.as_str()).or_default() += 1;
        total_votes += 1;
    }

    let per_option = survey
        .options
        .iter()
        .map(|option| {
            let votes_count = counts.get(option.id.as_str()).copied().unwrap_or(0);
            OptionTally {
                option_id: option.id.clone(),
                text: option.text.clone(),
                votes_count,
                percentage: percentage(votes_count, total_votes),
            }
        })
        .collect();

    Tally {
        total_votes,
        per_option,
    }
}

/// `count / total` as a whole percentage, rounding halves up; zero when
/// there are no votes at all.
pub fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * count + total) / (2 * total)) as u32
}
