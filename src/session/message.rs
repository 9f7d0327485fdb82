//! Login Message Construction
//!
//! Every login signs a human-readable message carrying a distinguishing value
//! (a timestamp or a client nonce) so no two attempts sign identical payloads.
//! This is not replay protection: nothing binds the value to a server-side
//! expiry window.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Deserialize;
use std::sync::Mutex;
use uuid::Uuid;

/// Which distinguishing value the login message embeds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    /// `Login to Go-Vigichain at <ISO-8601 timestamp>`
    #[default]
    Timestamp,
    /// `Please sign this message to confirm your identity. Nonce: <uuid>`
    Nonce,
}

impl std::str::FromStr for MessageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "timestamp" => Ok(MessageFormat::Timestamp),
            "nonce" => Ok(MessageFormat::Nonce),
            other => Err(format!("unknown message format '{}'", other)),
        }
    }
}

/// A message ready to be signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginMessage {
    pub text: String,
    pub issued_at: DateTime<Utc>,
    pub nonce: Option<String>,
}

/// Produces login messages; timestamps are strictly increasing per builder
#[derive(Debug, Default)]
pub struct LoginMessageBuilder {
    format: MessageFormat,
    last_issued: Mutex<Option<DateTime<Utc>>>,
}

impl LoginMessageBuilder {
    pub fn new(format: MessageFormat) -> Self {
        Self {
            format,
            last_issued: Mutex::new(None),
        }
    }

    pub fn format(&self) -> MessageFormat {
        self.format
    }

    /// Build the next message
    pub fn next(&self) -> LoginMessage {
        self.next_at(Utc::now())
    }

    fn next_at(&self, now: DateTime<Utc>) -> LoginMessage {
        let issued_at = self.monotonic(now);

        match self.format {
            MessageFormat::Timestamp => LoginMessage {
                text: format!(
                    "Login to Go-Vigichain at {}",
                    issued_at.to_rfc3339_opts(SecondsFormat::Millis, true)
                ),
                issued_at,
                nonce: None,
            },
            MessageFormat::Nonce => {
                let nonce = Uuid::new_v4().to_string();
                LoginMessage {
                    text: format!(
                        "Please sign this message to confirm your identity. Nonce: {}",
                        nonce
                    ),
                    issued_at,
                    nonce: Some(nonce),
                }
            }
        }
    }

    /// Millisecond timestamps, bumped past the previous one when the clock
    /// has not advanced (or went backwards)
    fn monotonic(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let mut last = self.last_issued.lock().unwrap_or_else(|e| e.into_inner());
        let truncated = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);

        let issued = match *last {
            Some(prev) if truncated <= prev => prev + Duration::milliseconds(1),
            _ => truncated,
        };
        *last = Some(issued);
        issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_message_text() {
        let builder = LoginMessageBuilder::new(MessageFormat::Timestamp);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let message = builder.next_at(at);

        assert_eq!(message.text, "Login to Go-Vigichain at 2024-05-01T12:30:00.000Z");
        assert!(message.nonce.is_none());
    }

    #[test]
    fn test_same_instant_still_distinct() {
        let builder = LoginMessageBuilder::new(MessageFormat::Timestamp);
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();

        let first = builder.next_at(at);
        let second = builder.next_at(at);
        let earlier = builder.next_at(at - Duration::seconds(5));

        assert_ne!(first.text, second.text);
        assert!(second.issued_at > first.issued_at);
        assert!(earlier.issued_at > second.issued_at);
    }

    #[test]
    fn test_sequential_messages_differ() {
        let builder = LoginMessageBuilder::default();
        let messages: Vec<String> = (0..50).map(|_| builder.next().text).collect();
        let mut unique = messages.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), messages.len());
    }

    #[test]
    fn test_nonce_message() {
        let builder = LoginMessageBuilder::new(MessageFormat::Nonce);
        let a = builder.next();
        let b = builder.next();

        let nonce = a.nonce.clone().unwrap();
        assert!(a.text.ends_with(&nonce));
        assert!(a.text.starts_with("Please sign this message to confirm your identity."));
        assert_ne!(a.text, b.text);
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("Nonce".parse::<MessageFormat>().unwrap(), MessageFormat::Nonce);
        assert!("siwe".parse::<MessageFormat>().is_err());
    }
}
