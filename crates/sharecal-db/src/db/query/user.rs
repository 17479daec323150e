//! Query functions for user accounts.

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::schema::users;
use crate::model::user::{NewUser, User, UserProfileChangeset};

type BoxedQuery<'a, T> =
    users::BoxedQuery<'a, diesel::pg::Pg, diesel::dsl::AsSelect<T, diesel::pg::Pg>>;

/// ## Summary
/// Returns a query to select all users.
#[must_use]
pub fn all<'a>() -> BoxedQuery<'a, User> {
    users::table.select(User::as_select()).into_boxed()
}

/// ## Summary
/// Returns a query to find a user by ID.
#[must_use]
pub fn by_id<'a>(id: uuid::Uuid) -> BoxedQuery<'a, User> {
    all().filter(users::id.eq(id))
}

/// ## Summary
/// Returns a query to find a user by email address.
#[must_use]
pub fn by_email(email: &str) -> BoxedQuery<'_, User> {
    all().filter(users::email.eq(email))
}

/// ## Summary
/// Returns a query to find a user by username.
#[must_use]
pub fn by_username(username: &str) -> BoxedQuery<'_, User> {
    all().filter(users::username.eq(username))
}

/// ## Summary
/// Inserts a new user and returns the inserted record.
///
/// ## Errors
/// Returns a database error if the insert fails, including unique violations on
/// email or username.
pub async fn create_user(
    conn: &mut AsyncPgConnection,
    new_user: &NewUser<'_>,
) -> diesel::QueryResult<User> {
    diesel::insert_into(users::table)
        .values(new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Retrieves a user by ID.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_user(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> diesel::QueryResult<Option<User>> {
    by_id(id).get_result(conn).await.optional()
}

/// ## Summary
/// Retrieves several users by ID. Missing IDs are skipped.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_users(
    conn: &mut AsyncPgConnection,
    ids: &[uuid::Uuid],
) -> diesel::QueryResult<Vec<User>> {
    all().filter(users::id.eq_any(ids)).get_results(conn).await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_user_by_email(
    conn: &mut AsyncPgConnection,
    email: &str,
) -> diesel::QueryResult<Option<User>> {
    by_email(email).get_result(conn).await.optional()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn get_user_by_username(
    conn: &mut AsyncPgConnection,
    username: &str,
) -> diesel::QueryResult<Option<User>> {
    by_username(username).get_result(conn).await.optional()
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn email_exists(conn: &mut AsyncPgConnection, email: &str) -> diesel::QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        users::table.filter(users::email.eq(email)),
    ))
    .get_result(conn)
    .await
}

/// ## Errors
/// Returns a database error if the query fails.
pub async fn username_exists(
    conn: &mut AsyncPgConnection,
    username: &str,
) -> diesel::QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        users::table.filter(users::username.eq(username)),
    ))
    .get_result(conn)
    .await
}

/// ## Summary
/// Loads a user and locks the row until the surrounding transaction ends.
///
/// ## Errors
/// Returns a database error if the query fails.
pub async fn lock_user(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> diesel::QueryResult<Option<User>> {
    users::table
        .filter(users::id.eq(id))
        .select(User::as_select())
        .for_update()
        .get_result(conn)
        .await
        .optional()
}

/// ## Summary
/// Applies a profile changeset and returns the updated user.
///
/// ## Errors
/// Returns a database error if the update fails or the user does not exist.
pub async fn update_profile(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    changes: &UserProfileChangeset<'_>,
) -> diesel::QueryResult<User> {
    diesel::update(users::table.filter(users::id.eq(id)))
        .set(changes)
        .returning(User::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Replaces the stored password hash. `None` makes the password unusable.
///
/// ## Errors
/// Returns a database error if the update fails.
pub async fn set_password_hash(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    password_hash: Option<&str>,
) -> diesel::QueryResult<usize> {
    diesel::update(users::table.filter(users::id.eq(id)))
        .set((
            users::password_hash.eq(password_hash),
            users::updated_at.eq(chrono::Utc::now()),
        ))
        .execute(conn)
        .await
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn touch_last_login(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
    at: chrono::DateTime<chrono::Utc>,
) -> diesel::QueryResult<usize> {
    diesel::update(users::table.filter(users::id.eq(id)))
        .set(users::last_login.eq(Some(at)))
        .execute(conn)
        .await
}

/// ## Errors
/// Returns a database error if the update fails.
pub async fn mark_email_verified(
    conn: &mut AsyncPgConnection,
    id: uuid::Uuid,
) -> diesel::QueryResult<usize> {
    diesel::update(users::table.filter(users::id.eq(id)))
        .set(users::is_email_verified.eq(true))
        .execute(conn)
        .await
}
