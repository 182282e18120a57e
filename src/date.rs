//
// Copyright 2020 bplist Developers
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//

//! Property list dates are `CFAbsoluteTime` values: a double-precision
//! offset, in seconds, from the Core Data Epoch (1 January 2001, 00:00:00
//! UTC). The XML representation instead writes the ISO-8601 convention
//! `YYYY-MM-DDThh:mm:ssZ`; conversions between the two live here.

use chrono::{DateTime, NaiveDateTime, Utc};
use ordered_float::OrderedFloat;

use crate::error::{Error, Result};

/// Number of seconds separating the Unix epoch from the Core Data Epoch.
pub const APPLE_EPOCH_OFFSET: f64 = 978_307_200.0;

/// Date format used by the XML representation.
const ISO_8601_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// A date structure roughly equivalent to an `NSDate`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct Date {
    /// A double-precision 64-bit offset, in seconds, from the Core Data Epoch.
    /// This is defined as 1 January 2001, 00:00:00 UTC.
    pub absolute_time: OrderedFloat<f64>,
}

impl Date {
    /// Returns a date at the given offset, in seconds, from the Core Data Epoch.
    pub fn from_apple_epoch(seconds: f64) -> Self {
        Date {
            absolute_time: OrderedFloat(seconds),
        }
    }

    /// Returns a date at the given offset, in seconds, from the Unix epoch.
    pub fn from_unix_epoch(seconds: f64) -> Self {
        Date::from_apple_epoch(seconds - APPLE_EPOCH_OFFSET)
    }

    /// Parses a date written in the XML convention, `YYYY-MM-DDThh:mm:ssZ`.
    pub fn from_iso8601(text: &str) -> Result<Self> {
        let naive = NaiveDateTime::parse_from_str(text, ISO_8601_FORMAT)
            .map_err(|e| Error::InvalidDate(format!("{}: {}", text, e)))?;
        Ok(Date::from_unix_epoch(naive.and_utc().timestamp() as f64))
    }

    /// Returns the offset, in seconds, from the Core Data Epoch.
    pub fn as_apple_epoch(&self) -> f64 {
        self.absolute_time.0
    }

    /// Returns the offset, in seconds, from the Unix epoch.
    pub fn as_unix_epoch(&self) -> f64 {
        self.absolute_time.0 + APPLE_EPOCH_OFFSET
    }

    /// Formats the date in the XML convention, `YYYY-MM-DDThh:mm:ssZ`.
    ///
    /// Sub-second precision is dropped, matching the convention.
    pub fn to_iso8601(&self) -> Result<String> {
        let timestamp = self.as_unix_epoch() as i64;
        let formatted = DateTime::<Utc>::from_timestamp(timestamp, 0)
            .ok_or_else(|| {
                Error::InvalidDate(format!("{} seconds is out of range", timestamp))
            })?
            .format(ISO_8601_FORMAT)
            .to_string();
        Ok(formatted)
    }

    /// Returns the number of whole seconds elapsed between `other` and the receiver.
    pub fn seconds_since(&self, other: &Date) -> i64 {
        (self.absolute_time.0 - other.absolute_time.0) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apple_epoch_origin() {
        let date = Date::from_apple_epoch(0.0);
        assert_eq!(date.as_apple_epoch(), 0.0);
        assert_eq!(date.as_unix_epoch(), APPLE_EPOCH_OFFSET);
        assert_eq!(date.to_iso8601().unwrap(), "2001-01-01T00:00:00Z");
    }

    #[test]
    fn test_epoch_conversion_round_trip() {
        let date = Date::from_unix_epoch(1_316_917_864.0);
        assert_eq!(date.as_apple_epoch(), 338_610_664.0);
        assert_eq!(date.as_unix_epoch(), 1_316_917_864.0);
    }

    #[test]
    fn test_iso8601_round_trip() {
        let date = Date::from_apple_epoch(338_610_664.0);
        let text = date.to_iso8601().unwrap();
        assert_eq!(text, "2011-09-25T02:31:04Z");
        assert_eq!(Date::from_iso8601(&text).unwrap(), date);
    }

    #[test]
    fn test_iso8601_rejects_malformed_text() {
        assert!(Date::from_iso8601("2011-09-25").is_err());
        assert!(Date::from_iso8601("not a date").is_err());
        assert!(Date::from_iso8601("2011-09-25T02:31:04").is_err());
    }

    #[test]
    fn test_ordering_and_difference() {
        let earlier = Date::from_apple_epoch(100.0);
        let later = Date::from_apple_epoch(164.5);
        assert!(earlier < later);
        assert_eq!(later.seconds_since(&earlier), 64);
        assert_eq!(earlier.seconds_since(&later), -64);
    }
}
