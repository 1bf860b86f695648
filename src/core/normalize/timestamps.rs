//! Timestamp normalization
//!
//! Every UDM timestamp is UTC. Values carrying an offset are converted;
//! naive values are interpreted in the configured source offset first.

use crate::domain::{NormalizationError, RawValue};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

/// Formats that carry their own UTC offset (HL7 DTM with zone)
const OFFSET_FORMATS: &[&str] = &["%Y%m%d%H%M%S%z", "%Y%m%d%H%M%z", "%Y-%m-%d %H:%M:%S%z"];

/// Date-time formats without offset
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y%m%d%H%M%S",
    "%Y%m%d%H%M",
];

/// Date-only formats; `%m/%d/%Y` wins over day-first layouts
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y%m%d"];

/// Parses vendor timestamps into UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampParser {
    source_offset: FixedOffset,
}

impl TimestampParser {
    /// Creates a parser that reads naive timestamps in `source_offset`
    pub fn new(source_offset: FixedOffset) -> Self {
        Self { source_offset }
    }

    /// A parser that treats naive timestamps as UTC
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn source_offset(&self) -> FixedOffset {
        self.source_offset
    }

    /// Parses a timestamp attribute
    ///
    /// # Errors
    ///
    /// Returns `NormalizationError::InvalidTimestamp` if the value matches none
    /// of the accepted formats
    ///
    /// # Examples
    ///
    /// ```
    /// use aegis::core::normalize::TimestampParser;
    /// use aegis::domain::RawValue;
    /// use chrono::FixedOffset;
    ///
    /// let parser = TimestampParser::new(FixedOffset::west_opt(5 * 3600).unwrap());
    /// let ts = parser.parse("onset", &RawValue::from("20240301103000")).unwrap();
    /// assert_eq!(ts.to_rfc3339(), "2024-03-01T15:30:00+00:00");
    /// ```
    pub fn parse(&self, field: &str, raw: &RawValue) -> Result<DateTime<Utc>, NormalizationError> {
        let text = match raw {
            RawValue::Date(date) => return self.local_midnight(field, *date),
            other => other.to_string(),
        };
        let text = text.trim();

        if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
            return Ok(ts.with_timezone(&Utc));
        }
        for format in OFFSET_FORMATS {
            if let Ok(ts) = DateTime::parse_from_str(text, format) {
                return Ok(ts.with_timezone(&Utc));
            }
        }
        for format in NAIVE_DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return self.localize(field, text, naive);
            }
        }
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return self.local_midnight(field, date);
            }
        }

        Err(invalid(field, text))
    }

    /// Parses a calendar date (birth dates); full timestamps are reduced to
    /// their date in the source offset
    pub fn parse_date(&self, field: &str, raw: &RawValue) -> Result<NaiveDate, NormalizationError> {
        if let RawValue::Date(date) = raw {
            return Ok(*date);
        }
        let text = raw.to_string();
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(text.trim(), format) {
                return Ok(date);
            }
        }
        let ts = self.parse(field, raw)?;
        Ok(ts.with_timezone(&self.source_offset).date_naive())
    }

    fn local_midnight(&self, field: &str, date: NaiveDate) -> Result<DateTime<Utc>, NormalizationError> {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| invalid(field, &date.to_string()))?;
        self.localize(field, &date.to_string(), naive)
    }

    fn localize(
        &self,
        field: &str,
        text: &str,
        naive: NaiveDateTime,
    ) -> Result<DateTime<Utc>, NormalizationError> {
        self.source_offset
            .from_local_datetime(&naive)
            .single()
            .map(|ts| ts.with_timezone(&Utc))
            .ok_or_else(|| invalid(field, text))
    }
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::utc()
    }
}

fn invalid(field: &str, value: &str) -> NormalizationError {
    NormalizationError::InvalidTimestamp {
        field: field.to_string(),
        value: value.to_string(),
    }
}
