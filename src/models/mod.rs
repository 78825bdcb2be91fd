// Copyright (c) FandomHub Team
// SPDX-License-Identifier: Apache-2.0

pub mod graph;
pub mod notification;
pub mod post;
pub mod report;
pub mod shop;
pub mod user;

pub use graph::{Block, Follow, NewBlock, NewFollow, NewSubscription, Subscription};
pub use notification::{NewNotification, Notification, NotificationKind};
pub use post::{Comment, NewComment, NewPost, NewPostLike, NewSavedPost, Post, PostLike, SavedPost};
pub use report::{AdminAction, NewReport, Report, ReportKind, ReportStatus};
pub use shop::{CartItem, NewCartItem, NewOrder, NewProduct, Order, OrderLine, OrderStatus, Product};
pub use user::{AccountStatus, NewUser, Role, User};

/// Current wall-clock time as epoch millis, the timestamp unit used by every
/// table in the store.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Declares a closed enum persisted as TEXT, replacing the stringly-typed
/// role/status/kind columns of the original data model. Values are validated
/// at the store boundary: an unrecognized string fails row deserialization.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            diesel::AsExpression, diesel::FromSqlRow,
            serde::Serialize, serde::Deserialize,
        )]
        #[diesel(sql_type = diesel::sql_types::Text)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!(
                        concat!("unrecognized ", stringify!($name), " value: {}"),
                        other
                    )),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl diesel::serialize::ToSql<diesel::sql_types::Text, diesel::sqlite::Sqlite> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut diesel::serialize::Output<'b, '_, diesel::sqlite::Sqlite>,
            ) -> diesel::serialize::Result {
                out.set_value(self.as_str());
                Ok(diesel::serialize::IsNull::No)
            }
        }

        impl diesel::deserialize::FromSql<diesel::sql_types::Text, diesel::sqlite::Sqlite>
            for $name
        {
            fn from_sql(
                bytes: diesel::sqlite::SqliteValue<'_, '_, '_>,
            ) -> diesel::deserialize::Result<Self> {
                let s = <String as diesel::deserialize::FromSql<
                    diesel::sql_types::Text,
                    diesel::sqlite::Sqlite,
                >>::from_sql(bytes)?;
                s.parse::<$name>().map_err(Into::into)
            }
        }
    };
}

pub(crate) use text_enum;
