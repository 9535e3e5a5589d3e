//! Initial data: the default admin account, and optional demo content.

use log::{debug, info};
use rand::seq::SliceRandom;

use crate::error::{Error, Result};
use crate::model::{
    clock,
    id::Id,
    snapshot::Snapshot,
    survey::{Survey, SurveySpec},
    user::{Role, User},
    vote::Vote,
};
use crate::store::Store;

pub const DEMO_USERS: usize = 10;

/// Create the configured admin account unless a user with that email exists.
pub async fn ensure_admin_exists(store: &Store, email: &str, password: &str) -> Result<()> {
    if store.load().await?.user_by_email(email).is_some() {
        debug!("Admin {email} already exists");
        return Ok(());
    }
    let admin = User::new(email.to_string(), password, Role::Admin)?;

    let created = store
        .transact(|snapshot| {
            if snapshot.user_by_email(email).is_some() {
                return Ok::<_, Error>(false);
            }
            snapshot.insert_user(admin);
            Ok(true)
        })
        .await?;
    if created {
        info!("Created admin user {email}");
    }
    Ok(())
}

fn demo_surveys() -> Vec<SurveySpec> {
    let spec = |question: &str, options: [&str; 4]| SurveySpec {
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
    };
    vec![
        spec(
            "Which framework version are you on right now?",
            ["v14", "v15", "v16", "v17+"],
        ),
        spec(
            "How do you prefer to manage client state?",
            ["Services with streams", "Redux-style store", "Component store", "Signals"],
        ),
        spec(
            "Which rendering mode do you ship to production?",
            ["CSR", "SSR", "SSG / prerender", "Hybrid"],
        ),
    ]
}

fn demo_email(i: usize) -> String {
    format!("user{i}@example.com")
}

/// Whether the store already holds a populated dataset, demo or not.
fn is_populated(snapshot: &Snapshot) -> bool {
    snapshot.users.iter().any(User::is_admin)
        && snapshot.users.len() >= DEMO_USERS
        && snapshot.surveys.len() >= demo_surveys().len()
        && !snapshot.votes.is_empty()
}

/// Populate the store with demo users, surveys and random votes.
///
/// Does nothing if the store is already populated. Otherwise missing demo
/// users and surveys are added, and only demo users vote, only in demo
/// surveys. Requires an admin to own the surveys.
pub async fn seed_demo_data(store: &Store) -> Result<()> {
    let existing = store.load().await?;
    if is_populated(&existing) {
        info!("Data already populated, skipping demo data");
        return Ok(());
    }

    // Hash outside the transaction; it is the slow part.
    let mut new_users = Vec::new();
    for i in 1..=DEMO_USERS {
        let email = demo_email(i);
        if existing.user_by_email(&email).is_none() {
            new_users.push(User::new(email, &format!("User{i}123!"), Role::User)?);
        }
    }

    let (users, surveys, votes) = store
        .transact(|snapshot| seed_snapshot(snapshot, new_users))
        .await?;
    info!("Seeded {users} demo users, {surveys} demo surveys and {votes} votes");
    Ok(())
}

/// Returns how many users, surveys and votes were added.
fn seed_snapshot(snapshot: &mut Snapshot, new_users: Vec<User>) -> Result<(usize, usize, usize)> {
    let admin_id = snapshot
        .users
        .iter()
        .find(|user| user.is_admin())
        .map(|admin| admin.id.clone())
        .ok_or(Error::UserNotFound)?;
    if is_populated(snapshot) {
        return Ok((0, 0, 0));
    }

    let mut users = 0;
    for user in new_users {
        if snapshot.user_by_email(&user.email).is_none() {
            snapshot.insert_user(user);
            users += 1;
        }
    }

    let specs = demo_surveys();
    let mut surveys = 0;
    for spec in specs.iter() {
        let present = snapshot
            .surveys()
            .iter()
            .any(|survey| survey.question == spec.question);
        if !present {
            snapshot.insert_survey(Survey::new(spec.clone(), admin_id.clone()));
            surveys += 1;
        }
    }

    let voters: Vec<Id> = (1..=DEMO_USERS)
        .filter_map(|i| snapshot.user_by_email(&demo_email(i)))
        .filter(|user| !user.is_admin())
        .map(|user| user.id.clone())
        .collect();
    let mut rng = rand::thread_rng();
    let mut new_votes = Vec::new();
    let demo = snapshot
        .surveys()
        .iter()
        .filter(|survey| survey.created_by_user_id == admin_id)
        .filter(|survey| specs.iter().any(|spec| spec.question == survey.question));
    for survey in demo {
        for user_id in &voters {
            if snapshot.vote_by_survey_and_user(&survey.id, user_id).is_some() {
                continue;
            }
            if let Some(option) = survey.options.choose(&mut rng) {
                new_votes.push(Vote {
                    id: Id::new(),
                    survey_id: survey.id.clone(),
                    user_id: user_id.clone(),
                    option_id: option.id.clone(),
                    created_at: clock::now(),
                });
            }
        }
    }
    let votes = new_votes.len();
    for vote in new_votes {
        snapshot.insert_vote(vote);
    }
    Ok((users, surveys, votes))
}
