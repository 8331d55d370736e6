// Column codecs shared by the row mappers
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{ffi, Row};
use serde::{de::DeserializeOwned, Serialize};

use crate::models::{Category, Difficulty, FavoriteKind, ItineraryKind, PriceRange, TipCategory};
use crate::Result;

macro_rules! sql_text_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e| FromSqlError::Other(Box::new(e)))
                }
            }
        )+
    };
}

sql_text_enum!(
    Category,
    PriceRange,
    ItineraryKind,
    Difficulty,
    TipCategory,
    FavoriteKind,
);

/// ISO-8601 with a `Z` suffix and only as much sub-second precision as needed
pub(crate) fn to_iso(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub(crate) fn iso_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub(crate) fn opt_to_json<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    value.map(|v| to_json(v)).transpose()
}

fn decode_json<T: DeserializeOwned>(raw: &str, idx: usize) -> rusqlite::Result<T> {
    serde_json::from_str(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    decode_json(&raw, idx)
}

/// Nullable JSON column whose absence means "empty"
pub(crate) fn json_column_or_default<T: DeserializeOwned + Default>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<T> {
    let raw: Option<String> = row.get(idx)?;
    match raw {
        Some(raw) => decode_json(&raw, idx),
        None => Ok(T::default()),
    }
}

pub(crate) fn opt_json_column<T: DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| decode_json(&raw, idx)).transpose()
}

/// Primary-key or UNIQUE collision. Other constraint failures (NOT NULL,
/// CHECK) are not duplicates and stay database errors.
pub(crate) fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_iso_format_is_utc_with_z_suffix() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap();
        assert_eq!(to_iso(&at), "2024-03-09T14:30:00Z");
    }

    #[test]
    fn test_iso_keeps_subsecond_precision() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let text = to_iso(&at);
        let back = DateTime::parse_from_rfc3339(&text).unwrap().with_timezone(&Utc);
        assert_eq!(back, at);
    }

    #[test]
    fn test_duplicate_key_only_for_key_collisions() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id TEXT PRIMARY KEY, code TEXT UNIQUE, name TEXT NOT NULL)",
        )
        .unwrap();
        conn.execute("INSERT INTO t VALUES ('a', 'x', 'n')", []).unwrap();

        let pk = conn.execute("INSERT INTO t VALUES ('a', 'y', 'n')", []).unwrap_err();
        assert!(is_duplicate_key(&pk));

        let unique = conn.execute("INSERT INTO t VALUES ('b', 'x', 'n')", []).unwrap_err();
        assert!(is_duplicate_key(&unique));

        let not_null = conn.execute("INSERT INTO t VALUES ('c', 'z', NULL)", []).unwrap_err();
        assert!(!is_duplicate_key(&not_null));
    }
}
