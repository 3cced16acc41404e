//! `new Date(...)` argument lists and their conversion to calendar time.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

use crate::DecodeError;

const MARKER_PREFIX: &str = "new Date(";

/// Integer arguments of one `new Date(...)` call, in source order.
///
/// Two or more components follow the JavaScript constructor:
/// `[year, month (0-based), day, hour, minute, second, millisecond]`, with
/// day defaulting to 1 and the rest to 0. A single component is epoch
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateArgs(Vec<i64>);

impl DateArgs {
    /// Wraps a component list.
    pub fn new(components: Vec<i64>) -> Self {
        Self(components)
    }

    /// Components in source order.
    pub fn components(&self) -> &[i64] {
        &self.0
    }

    /// Canonical marker text, `new Date(a,b,...)` with no spaces.
    pub fn marker(&self) -> String {
        let joined = self
            .0
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("{MARKER_PREFIX}{joined})")
    }

    /// Extracts the component list from marker text.
    ///
    /// Whitespace around components is ignored.
    ///
    /// # Errors
    /// Returns [`DecodeError::InvalidDate`] when the text is not a
    /// `new Date(...)` call with integer arguments.
    pub fn from_marker(text: &str) -> Result<Self, DecodeError> {
        let inner = text
            .trim()
            .strip_prefix("new")
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix("Date"))
            .map(str::trim_start)
            .and_then(|rest| rest.strip_prefix('('))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| DecodeError::InvalidDate(format!("not a date marker: {text:?}")))?;

        if inner.trim().is_empty() {
            return Ok(Self(Vec::new()));
        }

        inner
            .split(',')
            .map(|part| {
                part.trim().parse::<i64>().map_err(|_| {
                    DecodeError::InvalidDate(format!("non-integer component {part:?} in {text:?}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Converts into a calendar timestamp.
    ///
    /// # Errors
    /// Returns [`DecodeError::InvalidDate`] for empty lists and components
    /// outside their calendar range.
    pub fn to_naive_datetime(&self) -> Result<NaiveDateTime, DecodeError> {
        match self.0.as_slice() {
            [] => Err(DecodeError::InvalidDate("date has no components".to_string())),
            [millis] => DateTime::from_timestamp_millis(*millis)
                .map(|instant| instant.naive_utc())
                .ok_or_else(|| {
                    DecodeError::InvalidDate(format!("epoch millis out of range: {millis}"))
                }),
            [year, month, rest @ ..] => {
                let component =
                    |index: usize, default: i64| rest.get(index).copied().unwrap_or(default);
                let day = component(0, 1);
                let hour = component(1, 0);
                let minute = component(2, 0);
                let second = component(3, 0);
                let millis = component(4, 0);

                let date = i32::try_from(*year)
                    .ok()
                    .zip(u32::try_from(*month).ok().and_then(|month| month.checked_add(1)))
                    .zip(u32::try_from(day).ok())
                    .and_then(|((year, month), day)| NaiveDate::from_ymd_opt(year, month, day));
                let time = date.and_then(|date| {
                    let hour = u32::try_from(hour).ok()?;
                    let minute = u32::try_from(minute).ok()?;
                    let second = u32::try_from(second).ok()?;
                    let millis = u32::try_from(millis).ok()?;
                    date.and_hms_milli_opt(hour, minute, second, millis)
                });

                time.ok_or_else(|| {
                    DecodeError::InvalidDate(format!("components out of range: {}", self.marker()))
                })
            }
        }
    }
}

/// Returns `true` when `text` parses as a date marker.
pub fn is_date_marker(text: &str) -> bool {
    DateArgs::from_marker(text).is_ok()
}

pub(crate) fn is_canonical_marker(text: &str) -> bool {
    text.starts_with(MARKER_PREFIX)
        && DateArgs::from_marker(text).is_ok_and(|args| args.marker() == text)
}

/// Serde helper for fields holding a date marker string.
///
/// ```rust
/// use chrono::NaiveDateTime;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Event {
///     #[serde(deserialize_with = "ponto_loose_json::deserialize_date_marker")]
///     at: NaiveDateTime,
/// }
///
/// let event: Event = ponto_loose_json::decode_loose("{at:new Date(2023,0,2)}").unwrap();
/// assert_eq!(event.at.to_string(), "2023-01-02 00:00:00");
/// ```
pub fn deserialize_date_marker<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    DateArgs::from_marker(&text)
        .and_then(|args| args.to_naive_datetime())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    //! Unit tests for date component conversion.

    use super::*;

    #[test]
    fn month_component_is_zero_based() {
        let at = DateArgs::new(vec![2023, 5, 1, 10, 30, 0])
            .to_naive_datetime()
            .expect("valid date");
        assert_eq!(at.to_string(), "2023-06-01 10:30:00");
    }

    #[test]
    fn missing_components_take_constructor_defaults() {
        let at = DateArgs::new(vec![2024, 1]).to_naive_datetime().expect("valid date");
        assert_eq!(at.to_string(), "2024-02-01 00:00:00");
    }

    #[test]
    fn single_component_is_epoch_millis() {
        let at = DateArgs::new(vec![86_400_000]).to_naive_datetime().expect("valid date");
        assert_eq!(at.to_string(), "1970-01-02 00:00:00");
    }

    #[test]
    fn rejects_impossible_calendar_values() {
        assert!(DateArgs::new(vec![2023, 1, 30]).to_naive_datetime().is_err());
        assert!(DateArgs::new(vec![2023, 12, 1]).to_naive_datetime().is_err());
        assert!(DateArgs::new(vec![]).to_naive_datetime().is_err());
    }

    #[test]
    fn extreme_month_is_an_invalid_date() {
        for month in [i64::MAX, i64::from(u32::MAX), -1, i64::MIN] {
            assert!(matches!(
                DateArgs::new(vec![2023, month, 1]).to_naive_datetime(),
                Err(DecodeError::InvalidDate(_))
            ));
        }
    }

    #[test]
    fn marker_text_tolerates_spaces() {
        let args = DateArgs::from_marker("new Date( 2023 , 5 ,1 )").expect("valid marker");
        assert_eq!(args.components(), &[2023, 5, 1]);
        assert_eq!(args.marker(), "new Date(2023,5,1)");
        assert!(!is_canonical_marker("new Date( 2023 , 5 ,1 )"));
        assert!(is_canonical_marker("new Date(2023,5,1)"));
    }
}
