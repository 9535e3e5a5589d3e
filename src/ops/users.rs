use log::info;

use crate::error::{Error, Result};
use crate::model::{
    api::history::Profile,
    auth::Caller,
    user::{hash_password, Credentials, PasswordChange, Role, User},
};
use crate::store::Store;

/// Register a new user account with the `user` role.
///
/// Emails are unique ignoring case.
pub async fn register(store: &Store, credentials: Credentials) -> Result<User> {
    credentials.validate()?;

    // Fail early before paying for the hash; checked again below.
    if store.load().await?.user_by_email(&credentials.email).is_some() {
        return Err(Error::AlreadyRegistered);
    }
    let user = User::new(credentials.email, &credentials.password, Role::User)?;

    let user = store
        .transact(|snapshot| {
            if snapshot.user_by_email(&user.email).is_some() {
                return Err(Error::AlreadyRegistered);
            }
            snapshot.insert_user(user.clone());
            Ok(user)
        })
        .await?;
    info!("Registered user {} ({})", user.id, user.email);
    Ok(user)
}

/// Look up a user by email and check their password.
///
/// An unknown email and a wrong password are indistinguishable.
pub async fn authenticate(store: &Store, credentials: &Credentials) -> Result<User> {
    credentials.validate()?;
    store
        .load()
        .await?
        .user_by_email(&credentials.email)
        .filter(|user| user.verify_password(&credentials.password))
        .cloned()
        .ok_or(Error::InvalidCredentials)
}

pub async fn user_by_id(store: &Store, id: &str) -> Result<User> {
    store
        .load()
        .await?
        .user_by_id(id)
        .cloned()
        .ok_or(Error::UserNotFound)
}

/// The caller's account together with their participation history.
pub async fn profile(store: &Store, caller: &Caller) -> Result<Profile> {
    let snapshot = store.load().await?;
    let user = snapshot.user_by_id(&caller.id).ok_or(Error::UserNotFound)?;
    Ok(Profile::new(&snapshot, user))
}

/// Replace the caller's password after checking the current one.
pub async fn change_password(store: &Store, caller: &Caller, change: PasswordChange) -> Result<()> {
    change.validate()?;

    let user = user_by_id(store, &caller.id).await?;
    if !user.verify_password(&change.current_password) {
        return Err(Error::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }
    if change.current_password == change.new_password {
        return Err(Error::BadRequest(
            "New password must be different from current password".to_string(),
        ));
    }
    let new_hash = hash_password(&change.new_password)?;

    store
        .transact(|snapshot| {
            // Someone else changed it since we verified.
            match snapshot.user_by_id(&user.id) {
                Some(current) if current.password_hash == user.password_hash => {}
                Some(_) => {
                    return Err(Error::BadRequest(
                        "Current password is incorrect".to_string(),
                    ))
                }
                None => return Err(Error::UserNotFound),
            }
            snapshot.update_password_hash(&user.id, new_hash);
            Ok(())
        })
        .await?;
    info!("User {} changed their password", user.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testing::temp_store;

    #[rocket::async_test]
    async fn register_then_authenticate() {
        let (_dir, store) = temp_store();
        let user = register(&store, Credentials::example()).await.unwrap();
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, Credentials::example().password);

        let found = authenticate(&store, &Credentials::example()).await.unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(user_by_id(&store, &user.id).await.unwrap(), user);
    }

    #[rocket::async_test]
    async fn email_is_unique_ignoring_case() {
        let (_dir, store) = temp_store();
        let credentials = |email: &str| Credentials {
            email: email.into(),
            password: "Password1!".into(),
        };
        register(&store, credentials("a@b.com")).await.unwrap();
        let err = register(&store, credentials("A@B.com")).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered));
        assert_eq!(store.load().await.unwrap().users.len(), 1);
    }

    #[rocket::async_test]
    async fn bad_login_is_invalid_credentials() {
        let (_dir, store) = temp_store();
        register(&store, Credentials::example()).await.unwrap();

        let mut wrong_password = Credentials::example();
        wrong_password.password = "Wrong123!".into();
        assert!(matches!(
            authenticate(&store, &wrong_password).await,
            Err(Error::InvalidCredentials)
        ));
        assert!(matches!(
            authenticate(&store, &Credentials::example2()).await,
            Err(Error::InvalidCredentials)
        ));
    }

    #[rocket::async_test]
    async fn unknown_user_is_not_found() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            user_by_id(&store, "nobody").await,
            Err(Error::UserNotFound)
        ));
    }

    #[rocket::async_test]
    async fn change_password_flow() {
        let (_dir, store) = temp_store();
        let user = register(&store, Credentials::example()).await.unwrap();
        let caller = Caller::from(&user);

        let wrong_current = PasswordChange {
            current_password: "NotMine123!".into(),
            new_password: "Changed123!".into(),
        };
        assert!(matches!(
            change_password(&store, &caller, wrong_current).await,
            Err(Error::BadRequest(_))
        ));

        let same = PasswordChange {
            current_password: "Voter123!".into(),
            new_password: "Voter123!".into(),
        };
        assert!(matches!(
            change_password(&store, &caller, same).await,
            Err(Error::BadRequest(_))
        ));

        let change = PasswordChange {
            current_password: "Voter123!".into(),
            new_password: "Changed123!".into(),
        };
        change_password(&store, &caller, change).await.unwrap();

        assert!(authenticate(&store, &Credentials::example()).await.is_err());
        let new_credentials = Credentials {
            email: user.email.clone(),
            password: "Changed123!".into(),
        };
        assert_eq!(
            authenticate(&store, &new_credentials).await.unwrap().id,
            user.id
        );
    }

    #[rocket::async_test]
    async fn profile_of_fresh_user_is_empty() {
        let (_dir, store) = temp_store();
        let user = register(&store, Credentials::example()).await.unwrap();
        let profile = profile(&store, &Caller::from(&user)).await.unwrap();
        assert_eq!(profile.email, "voter@example.com");
        assert!(profile.history.is_empty());
    }
}
