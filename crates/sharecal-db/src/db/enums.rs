//! Database enum types with Diesel serialization.
//!
//! Each enum maps to a `TEXT` column guarded by a CHECK constraint and implements
//! `ToSql` and `FromSql` for automatic conversion between Rust and `PostgreSQL`.
//! The serde representation matches the stored string.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            AsExpression,
            FromSqlRow,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                match bytes.as_bytes() {
                    $(b if b == $text.as_bytes() => Ok(Self::$variant),)+
                    _ => Err("Unrecognized enum variant".into()),
                }
            }
        }

        impl $name {
            /// Returns the database string representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// Stored membership role. Ownership is never stored here; it is derived
    /// from `calendars.owner_id`.
    ///
    /// Maps to `calendar_members.role` and `calendar_invitations.role`.
    #[derive(Default)]
    MemberRole {
        Admin => "admin",
        #[default]
        Member => "member",
    }
}

text_enum! {
    /// Invitation lifecycle state.
    ///
    /// Maps to `calendar_invitations.status` CHECK constraint.
    InvitationStatus {
        Pending => "pending",
        Accepted => "accepted",
        Declined => "declined",
    }
}

text_enum! {
    /// External identity provider.
    ///
    /// Maps to `social_accounts.provider` CHECK constraint.
    SocialProvider {
        Google => "google",
        Kakao => "kakao",
    }
}

text_enum! {
    /// How an account was first created.
    ///
    /// Maps to `users.login_method` CHECK constraint.
    LoginMethod {
        Email => "email",
        Google => "google",
        Kakao => "kakao",
    }
}

impl From<SocialProvider> for LoginMethod {
    fn from(provider: SocialProvider) -> Self {
        match provider {
            SocialProvider::Google => Self::Google,
            SocialProvider::Kakao => Self::Kakao,
        }
    }
}

text_enum! {
    /// Maps to `calendars.calendar_type` CHECK constraint.
    #[derive(Default)]
    CalendarType {
        #[default]
        Personal => "personal",
        Shared => "shared",
    }
}

text_enum! {
    /// Repetition label stored on an event. Never expanded into instances.
    ///
    /// Maps to `events.recurrence_rule` CHECK constraint.
    #[derive(Default)]
    RecurrenceRule {
        #[default]
        None => "none",
        Daily => "daily",
        Weekly => "weekly",
        Monthly => "monthly",
        Yearly => "yearly",
        Weekdays => "weekdays",
        Weekends => "weekends",
    }
}

text_enum! {
    /// Maps to `events.priority` CHECK constraint.
    #[derive(Default)]
    Priority {
        Low => "low",
        #[default]
        Normal => "normal",
        High => "high",
    }
}
