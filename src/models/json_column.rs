use diesel::deserialize::{FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::serialize;
use diesel::serialize::{IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::{Sqlite, SqliteValue};
use serde::{Deserialize, Serialize};

use super::MatchResult;

/// Implements TEXT storage for a newtype whose contents round-trip through JSON
macro_rules! json_text_column {
    ($column:ident) => {
        impl FromSql<Text, Sqlite> for $column {
            fn from_sql(value: SqliteValue<'_, '_, '_>) -> diesel::deserialize::Result<Self> {
                let text = <String as FromSql<Text, Sqlite>>::from_sql(value)?;
                Ok($column(serde_json::from_str(&text)?))
            }
        }

        impl ToSql<Text, Sqlite> for $column {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(serde_json::to_string(&self.0)?);
                Ok(IsNull::No)
            }
        }
    };
}

/// The tags attached to an item, stored as a JSON array of strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(transparent)]
pub struct TagList(pub Vec<String>);

/// The matches carried by a notification, stored as a JSON array of objects
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
#[serde(transparent)]
pub struct MatchList(pub Vec<MatchResult>);

json_text_column!(TagList);
json_text_column!(MatchList);
