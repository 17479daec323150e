//! Depot helpers for the authenticated user.

use sharecal_db::model::user::User;

use crate::error::{ServiceError, ServiceResult};

pub mod depot_keys {
    pub const AUTHENTICATED_USER: &str = "__authenticated_user";
}

/// Who is making the current request.
#[derive(Debug, Clone)]
pub enum DepotUser {
    User(User),
    Public,
}

/// ## Errors
/// Returns `NotAuthenticated` when the auth hoop stored no user or a public caller.
pub fn get_user_from_depot(depot: &salvo::Depot) -> ServiceResult<&User> {
    let depot_user = depot
        .get::<DepotUser>(depot_keys::AUTHENTICATED_USER)
        .map_err(|_e| ServiceError::NotAuthenticated)?;

    match depot_user {
        DepotUser::User(user) => Ok(user),
        DepotUser::Public => Err(ServiceError::NotAuthenticated),
    }
}
