//! When a transaction happened: either a calendar date or a point in time.

use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const LOCAL_DATE_TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
const SQLITE_DATE_TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]");

/// The date of a transaction.
///
/// Accepts a bare `YYYY-MM-DD` date or a date-time. A bare date sorts as
/// midnight UTC of that day. Date-times without an offset are taken to be UTC.
///
/// Serialized in JSON and SQLite as text: `YYYY-MM-DD` for a date, RFC 3339
/// for a date-time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionDate {
    /// A calendar date with no time of day.
    Date(Date),
    /// A point in time.
    DateTime(OffsetDateTime),
}

impl TransactionDate {
    /// The instant this date is ordered by.
    pub fn instant(&self) -> OffsetDateTime {
        match self {
            TransactionDate::Date(date) => date.midnight().assume_utc(),
            TransactionDate::DateTime(date_time) => *date_time,
        }
    }

    /// Format the date as it is stored and sent to clients.
    ///
    /// # Errors
    /// Fails if a date-time cannot be written as RFC 3339, e.g. its year is
    /// outside 0 to 9999.
    pub fn format(&self) -> Result<String, time::error::Format> {
        match self {
            TransactionDate::Date(date) => date.format(DATE_FORMAT),
            TransactionDate::DateTime(date_time) => date_time.format(&Rfc3339),
        }
    }
}

impl From<Date> for TransactionDate {
    fn from(date: Date) -> Self {
        TransactionDate::Date(date)
    }
}

impl From<OffsetDateTime> for TransactionDate {
    fn from(date_time: OffsetDateTime) -> Self {
        TransactionDate::DateTime(date_time)
    }
}

/// Text that is neither a `YYYY-MM-DD` date nor a supported date-time.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid date \"{0}\", expected YYYY-MM-DD or an RFC 3339 date-time")]
pub struct InvalidTransactionDate(pub String);

impl FromStr for TransactionDate {
    type Err = InvalidTransactionDate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();

        if let Ok(date) = Date::parse(text, DATE_FORMAT) {
            return Ok(TransactionDate::Date(date));
        }

        if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
            return Ok(TransactionDate::DateTime(date_time));
        }

        [LOCAL_DATE_TIME_FORMAT, SQLITE_DATE_TIME_FORMAT]
            .into_iter()
            .find_map(|format| PrimitiveDateTime::parse(text, format).ok())
            .map(|date_time| TransactionDate::DateTime(date_time.assume_utc()))
            .ok_or_else(|| InvalidTransactionDate(s.to_owned()))
    }
}

impl Serialize for TransactionDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = self.format().map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for TransactionDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

impl ToSql for TransactionDate {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.format()
            .map(ToSqlOutput::from)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))
    }
}

impl FromSql for TransactionDate {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
