use crate::model::user::Role;

/// Who may use a route guarded by `AuthToken<Self>`.
pub trait Access {
    fn admits(role: Role) -> bool;
}

/// Administrators only.
pub struct Admin;

/// Any signed-in user, administrators included.
pub struct Member;

impl Access for Admin {
    fn admits(role: Role) -> bool {
        role == Role::Admin
    }
}

impl Access for Member {
    fn admits(_role: Role) -> bool {
        true
    }
}
