// Copyright (c) 2024 BOURSE LABS
//! Unsigned time management: block timestamps and durations in milliseconds
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod error;
pub use error::TimeError;
use bourse_serialization::{Deserializer, Serializer, U64VarIntDeserializer, U64VarIntSerializer};
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Bound;
use std::time::Duration;
use std::{
    convert::{TryFrom, TryInto},
    str::FromStr,
};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};

/// Time structure used everywhere.
/// milliseconds since 01/01/1970.
#[derive(
    Debug, Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BourseTime(u64);

/// Serializer for `BourseTime`
pub struct BourseTimeSerializer {
    u64_serializer: U64VarIntSerializer,
}

impl BourseTimeSerializer {
    /// Creates a `BourseTimeSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Default for BourseTimeSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<BourseTime> for BourseTimeSerializer {
    fn serialize(
        &self,
        value: &BourseTime,
        buffer: &mut Vec<u8>,
    ) -> Result<(), bourse_serialization::SerializeError> {
        self.u64_serializer.serialize(&value.to_millis(), buffer)
    }
}

/// Deserializer for `BourseTime`
pub struct BourseTimeDeserializer {
    u64_deserializer: U64VarIntDeserializer,
}

fn bound_to_millis(bound: Bound<BourseTime>) -> Bound<u64> {
    match bound {
        Bound::Included(time) => Bound::Included(time.to_millis()),
        Bound::Excluded(time) => Bound::Excluded(time.to_millis()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

impl BourseTimeDeserializer {
    /// Creates a `BourseTimeDeserializer` accepting timestamps within `range`
    pub fn new(range: (Bound<BourseTime>, Bound<BourseTime>)) -> Self {
        Self {
            u64_deserializer: U64VarIntDeserializer::new(
                bound_to_millis(range.0),
                bound_to_millis(range.1),
            ),
        }
    }
}

impl Deserializer<BourseTime> for BourseTimeDeserializer {
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], BourseTime, E> {
        context("Failed BourseTime deserialization", |input| {
            self.u64_deserializer
                .deserialize(input)
                .map(|(rest, res)| (rest, BourseTime::from_millis(res)))
        })(buffer)
    }
}

impl fmt::Display for BourseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_millis())
    }
}

impl TryFrom<Duration> for BourseTime {
    type Error = TimeError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Ok(BourseTime(
            value
                .as_millis()
                .try_into()
                .map_err(|_| TimeError::ConversionError)?,
        ))
    }
}

impl From<BourseTime> for Duration {
    fn from(value: BourseTime) -> Self {
        value.to_duration()
    }
}

impl FromStr for BourseTime {
    type Err = crate::TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(BourseTime(
            u64::from_str(s).map_err(|_| Self::Err::ConversionError)?,
        ))
    }
}

impl BourseTime {
    /// Conversion from `u64` milliseconds
    pub const fn from_millis(value: u64) -> Self {
        BourseTime(value)
    }

    /// Conversion from `u64` seconds
    pub const fn from_secs(value: u64) -> Self {
        BourseTime(value.saturating_mul(1000))
    }

    /// Smallest time interval
    pub const EPSILON: BourseTime = BourseTime(1);

    /// Conversion to `std::time::Duration`.
    pub fn to_duration(&self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// Conversion to `u64` milliseconds
    pub const fn to_millis(&self) -> u64 {
        self.0
    }

    /// Whole seconds, truncated
    pub const fn to_secs(&self) -> u64 {
        self.0 / 1000
    }

    /// ```
    /// # use bourse_time::*;
    /// let time_1 = BourseTime::from_millis(42);
    /// let time_2 = BourseTime::from_millis(7);
    /// assert_eq!(time_2.saturating_sub(time_1), BourseTime::from_millis(0));
    /// ```
    #[must_use]
    pub fn saturating_sub(self, t: BourseTime) -> Self {
        BourseTime(self.0.saturating_sub(t.0))
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn saturating_add(self, t: BourseTime) -> Self {
        BourseTime(self.0.saturating_add(t.0))
    }

    /// Checked subtraction, fails on underflow
    pub fn checked_sub(self, t: BourseTime) -> Result<Self, TimeError> {
        self.0
            .checked_sub(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("subtraction error".to_string()))
            .map(BourseTime)
    }

    /// Checked addition, fails on overflow
    pub fn checked_add(self, t: BourseTime) -> Result<Self, TimeError> {
        self.0
            .checked_add(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("addition error".to_string()))
            .map(BourseTime)
    }

    /// RFC 3339 rendering of the timestamp, to the second
    ///
    /// ```
    /// # use bourse_time::*;
    /// let time = BourseTime::from_millis(1_640_995_200_000);
    /// assert_eq!(time.format_instant().unwrap(), "2022-01-01T00:00:00Z");
    /// ```
    pub fn format_instant(&self) -> Result<String, TimeError> {
        let secs = i64::try_from(self.to_secs()).map_err(|_| TimeError::TimeOverflowError)?;
        let date_time =
            OffsetDateTime::from_unix_timestamp(secs).map_err(|_| TimeError::ConversionError)?;
        date_time
            .format(&Rfc3339)
            .map_err(|_| TimeError::ConversionError)
    }

    /// Builds a timestamp from UTC calendar components
    pub fn from_utc_ymd_hms(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<BourseTime, TimeError> {
        let month = month.try_into().map_err(|_| TimeError::ConversionError)?;

        let date =
            Date::from_calendar_date(year, month, day).map_err(|_| TimeError::ConversionError)?;

        let date_time = date
            .with_hms(hour, minute, second)
            .map_err(|_| TimeError::ConversionError)?
            .assume_utc();

        let millis = date_time
            .unix_timestamp_nanos()
            .checked_div(1_000_000)
            .ok_or(TimeError::ConversionError)?;
        Ok(BourseTime::from_millis(
            u64::try_from(millis).map_err(|_| TimeError::ConversionError)?,
        ))
    }

    /// Largest representable timestamp
    pub const fn max() -> BourseTime {
        BourseTime::from_millis(u64::MAX)
    }
}
