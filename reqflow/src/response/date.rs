//! Records the response `Date` header.

use super::after;
use crate::core::{Key, Metadata};
use crate::pipeline::{DeserializeFn, Interceptor};
use chrono::{DateTime, NaiveDateTime, Utc};
use http::header::DATE;
use std::fmt;
use std::sync::Arc;

/// Metadata key for the parsed response date.
#[derive(Debug)]
pub struct DateKey;

impl Key for DateKey {
    type Value = DateTime<Utc>;
}

/// Returns the date recorded by [`DateDeserializer`].
#[must_use]
pub fn date(md: &Metadata) -> Option<DateTime<Utc>> {
    md.get::<DateKey>().copied()
}

/// Parses an HTTP date.
///
/// Accepts IMF-fixdate and other RFC 2822 forms, the obsolete RFC 850
/// form, and the asctime form.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

type Parser = Arc<dyn Fn(&str) -> Option<DateTime<Utc>> + Send + Sync>;

/// Parses the `Date` header into metadata.
///
/// Runs whether or not the call failed, as long as a response arrived. A
/// missing or unparsable header records nothing.
#[derive(Clone)]
pub struct DateDeserializer {
    parse: Parser,
}

impl Default for DateDeserializer {
    fn default() -> Self {
        Self {
            parse: Arc::new(parse_http_date),
        }
    }
}

impl fmt::Debug for DateDeserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateDeserializer").finish_non_exhaustive()
    }
}

impl DateDeserializer {
    /// Creates the deserializer with [`parse_http_date`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the date parser.
    #[must_use]
    pub fn with_parser<P>(mut self, parse: P) -> Self
    where
        P: Fn(&str) -> Option<DateTime<Utc>> + Send + Sync + 'static,
    {
        self.parse = Arc::new(parse);
        self
    }
}

impl<O: Send + 'static> Interceptor<DeserializeFn<O>> for DateDeserializer {
    fn wrap(&self, next: DeserializeFn<O>) -> DeserializeFn<O> {
        let parse = self.parse.clone();
        after(next, move |outcome| {
            let parsed = outcome
                .output
                .response
                .as_ref()
                .and_then(|response| response.header_str(&DATE))
                .and_then(|value| parse(value));
            if let Some(parsed) = parsed {
                outcome.metadata.set::<DateKey>(parsed);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::stub::{respond, run};
    use super::*;
    use crate::core::WireResponse;
    use chrono::TimeZone;
    use http::header::HeaderValue;
    use http::StatusCode;

    fn expected() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap()
    }

    #[test]
    fn test_parse_http_date_forms() {
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(expected()));
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(expected()));
        assert_eq!(
            parse_http_date("Thu Nov 10 08:49:37 1994"),
            Utc.with_ymd_and_hms(1994, 11, 10, 8, 49, 37).single()
        );
        assert_eq!(parse_http_date("yesterday"), None);
    }

    #[tokio::test]
    async fn test_date_recorded_on_error_path() {
        let resp = WireResponse::new(StatusCode::BAD_GATEWAY)
            .with_header(DATE, HeaderValue::from_static("Sun, 06 Nov 1994 08:49:37 GMT"));
        let outcome = run(DateDeserializer::new().wrap(respond(Some(resp), Some("bad")))).await;

        assert_eq!(date(&outcome.metadata), Some(expected()));
    }

    #[tokio::test]
    async fn test_unparsable_date_records_nothing() {
        let resp = WireResponse::new(StatusCode::OK).with_header(DATE, HeaderValue::from_static("soon"));
        let outcome = run(DateDeserializer::new().wrap(respond(Some(resp), None))).await;

        assert!(date(&outcome.metadata).is_none());
    }

    #[tokio::test]
    async fn test_custom_parser() {
        let deserializer = DateDeserializer::new().with_parser(|_| Some(expected()));
        let resp = WireResponse::new(StatusCode::OK).with_header(DATE, HeaderValue::from_static("x"));
        let outcome = run(deserializer.wrap(respond(Some(resp), None))).await;

        assert_eq!(date(&outcome.metadata), Some(expected()));
    }
}
