use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};
use serde::Serialize;

pub use crate::db::enums::SocialProvider;

#[derive(Debug, Clone, PartialEq, Identifiable, Queryable, Selectable, Associations, Serialize)]
#[diesel(table_name = schema::social_accounts)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::user::User, foreign_key = user_id))]
pub struct SocialAccount {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub provider: SocialProvider,
    pub social_id: String,
    pub email: Option<String>,
    #[serde(skip)]
    pub access_token: Option<String>,
    #[serde(skip)]
    pub refresh_token: Option<String>,
    pub extra_data: serde_json::Value,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::social_accounts)]
pub struct NewSocialAccount<'a> {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub provider: SocialProvider,
    pub social_id: &'a str,
    pub email: Option<&'a str>,
    pub access_token: Option<&'a str>,
    pub extra_data: &'a serde_json::Value,
}
