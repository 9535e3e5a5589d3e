//! Structural edits to a survey are only allowed while nobody has voted in it.

use crate::error::{Error, Result};
use crate::model::{
    id::Id,
    snapshot::Snapshot,
    survey::{OptionSpec, Survey, SurveyOption, SurveyUpdate},
};

/// Whether a survey's question and options may still change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyState {
    Mutable,
    /// At least one vote exists; only deletion is possible now.
    Locked { votes: usize },
}

pub fn survey_state(snapshot: &Snapshot, survey_id: &str) -> SurveyState {
    match snapshot.vote_count(survey_id) {
        0 => SurveyState::Mutable,
        votes => SurveyState::Locked { votes },
    }
}

pub fn ensure_mutable(snapshot: &Snapshot, survey_id: &str) -> Result<()> {
    match survey_state(snapshot, survey_id) {
        SurveyState::Mutable => Ok(()),
        SurveyState::Locked { votes } => Err(Error::SurveyLocked { votes }),
    }
}

/// Turn requested options into stored ones, in request order.
///
/// Identity is purely id-based: an option carrying an id keeps it, anything
/// else gets a fresh one, even if its text matches an existing option.
pub fn reconcile_options(incoming: Vec<OptionSpec>) -> Vec<SurveyOption> {
    incoming
        .into_iter()
        .map(|spec| match spec {
            OptionSpec::ExistingOption { id, text } => SurveyOption { id, text },
            OptionSpec::NewOptionText(text) => SurveyOption {
                id: Id::new(),
                text,
            },
        })
        .collect()
}

/// Replace a vote-free survey's question and options in the snapshot.
///
/// Identity fields (`id`, `publicId`, creator, creation time) are kept.
pub fn apply_update(
    snapshot: &mut Snapshot,
    survey_id: &str,
    update: SurveyUpdate,
) -> Result<Survey> {
    let current = snapshot
        .survey_by_id(survey_id)
        .ok_or(Error::SurveyNotFound)?;
    ensure_mutable(snapshot, survey_id)?;

    let updated = Survey {
        question: update.question,
        options: reconcile_options(update.options),
        ..current.clone()
    };
    snapshot.replace_survey(updated.clone());
    Ok(updated)
}
