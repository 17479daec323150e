use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

use crate::db::schema;

pub mod revoked_token;
pub mod social_account;

pub use crate::db::enums::LoginMethod;

/// An account. At least one of `email` and `username` is always set.
#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Serialize)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(Pg))]
pub struct User {
    pub id: uuid::Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    /// `None` marks an unusable password (social-only accounts).
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub birth_date: Option<chrono::NaiveDate>,
    pub profile_image_url: Option<String>,
    pub login_method: LoginMethod,
    pub is_email_verified: bool,
    pub is_marketing_agreed: bool,
    pub is_active: bool,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    #[must_use]
    pub fn has_usable_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Display name: full name when present, else email, else username.
    #[must_use]
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }
        self.email
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::users)]
pub struct NewUser<'a> {
    pub id: uuid::Uuid,
    pub email: Option<&'a str>,
    pub username: &'a str,
    pub password_hash: Option<&'a str>,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub profile_image_url: Option<&'a str>,
    pub login_method: LoginMethod,
    pub is_email_verified: bool,
}

/// Profile fields a user may change about themselves. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = schema::users)]
pub struct UserProfileChangeset<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone_number: Option<Option<&'a str>>,
    pub birth_date: Option<Option<chrono::NaiveDate>>,
    pub profile_image_url: Option<Option<&'a str>>,
    pub is_marketing_agreed: Option<bool>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}
