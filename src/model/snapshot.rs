//! The whole persisted dataset and the lookup/mutation helpers over it.
//!
//! Nothing here performs I/O: a [`Snapshot`] is loaded from the
//! [`Store`](crate::store::Store), changed in memory, and saved back whole.
//! Lookups are linear scans, and every collection keeps insertion order.

use serde::{Deserialize, Serialize};

use crate::model::{survey::Survey, user::User, vote::Vote};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub surveys: Vec<Survey>,
    pub votes: Vec<Vote>,
}

// Users.
impl Snapshot {
    pub fn user_by_id(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Case-insensitive exact match on the email address.
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let email = email.to_lowercase();
        self.users
            .iter()
            .find(|u| u.email.to_lowercase() == email)
    }

    /// Append a user. The caller checks email uniqueness first.
    pub fn insert_user(&mut self, user: User) {
        self.users.push(user);
    }

    /// Replace a user's password hash, returning the updated user.
    pub fn update_password_hash(&mut self, id: &str, password_hash: String) -> Option<&User> {
        let user = self.users.iter_mut().find(|u| u.id == id)?;
        user.password_hash = password_hash;
        Some(user)
    }
}

// Surveys.
impl Snapshot {
    pub fn survey_by_id(&self, id: &str) -> Option<&Survey> {
        self.surveys.iter().find(|s| s.id == id)
    }

    pub fn survey_by_public_id(&self, public_id: &str) -> Option<&Survey> {
        self.surveys.iter().find(|s| s.public_id == public_id)
    }

    pub fn surveys(&self) -> &[Survey] {
        &self.surveys
    }

    pub fn insert_survey(&mut self, survey: Survey) {
        self.surveys.push(survey);
    }

    /// Replace the survey with the same id in place, keeping its position.
    /// Returns the previous version, or `None` if no such survey exists.
    pub fn replace_survey(&mut self, survey: Survey) -> Option<Survey> {
        let slot = self.surveys.iter_mut().find(|s| s.id == survey.id)?;
        Some(std::mem::replace(slot, survey))
    }

    /// Remove a survey without touching its votes.
    pub fn remove_survey(&mut self, id: &str) -> Option<Survey> {
        let index = self.surveys.iter().position(|s| s.id == id)?;
        Some(self.surveys.remove(index))
    }

    /// Remove a survey together with every vote that references it.
    /// Returns the removed survey and the number of votes dropped with it.
    pub fn delete_survey_cascading(&mut self, id: &str) -> Option<(Survey, usize)> {
        let survey = self.remove_survey(id)?;
        let removed_votes = self.remove_votes_for_survey(&survey.id);
        Some((survey, removed_votes))
    }
}

// Votes.
impl Snapshot {
    pub fn votes_for_survey<'a>(&'a self, survey_id: &'a str) -> impl Iterator<Item = &'a Vote> {
        self.votes.iter().filter(move |v| v.survey_id == survey_id)
    }

    pub fn votes_by_user<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a Vote> {
        self.votes.iter().filter(move |v| v.user_id == user_id)
    }

    pub fn vote_count(&self, survey_id: &str) -> usize {
        self.votes_for_survey(survey_id).count()
    }

    /// The vote a user cast in a survey, if any.
    pub fn vote_by_survey_and_user(&self, survey_id: &str, user_id: &str) -> Option<&Vote> {
        self.votes
            .iter()
            .find(|v| v.survey_id == survey_id && v.user_id == user_id)
    }

    pub fn insert_vote(&mut self, vote: Vote) {
        self.votes.push(vote);
    }

    /// Drop every vote referencing the survey, returning how many went.
    pub fn remove_votes_for_survey(&mut self, survey_id: &str) -> usize {
        let before = self.votes.len();
        self.votes.retain(|v| v.survey_id != survey_id);
        before - self.votes.len()
    }
}

#[cfg(test)]
pub(crate) mod examples {
    use super::*;
    use crate::model::{clock, id::Id};

    /// A vote with a fixed id derived from the user, for building fixtures.
    pub fn vote(survey: &Survey, user_id: &str, option_id: &str) -> Vote {
        Vote {
            id: Id::from(format!("vote-{}-{user_id}", survey.id)),
            survey_id: survey.id.clone(),
            user_id: Id::from(user_id),
            option_id: Id::from(option_id),
            created_at: clock::now(),
        }
    }
}
