//! Scheduled messages and their delivery state machine.
//!
//! A message is created with a future `day`/`time` pair and moves strictly
//! along `pending -> processing -> {sent, failed}`. Terminal states are never
//! revisited; there is no automatic retry.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};
use crate::limits::MAX_MESSAGE_LEN;

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]?\d|2[0-3]):[0-5]\d$").expect("valid time regex"));

/// Delivery priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(Error::validation(
                "Priority must be one of: low, medium, high",
            )),
        }
    }
}

/// Delivery status state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

impl MessageStatus {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: MessageStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Sent)
                | (Self::Processing, Self::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

impl FromStr for MessageStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(Error::validation(
                "Status must be one of: pending, processing, sent, failed",
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledMessage {
    pub id: Uuid,
    pub message: String,
    /// Scheduled day, `YYYY-MM-DD`.
    pub day: String,
    /// Scheduled time, `HH:MM` 24-hour.
    pub time: String,
    pub scheduled_at: DateTime<Utc>,
    pub recipient: Option<String>,
    pub priority: Priority,
    pub status: MessageStatus,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compose a UTC instant from validated `YYYY-MM-DD` and `HH:MM` parts.
pub fn compose_scheduled_at(day: &str, time: &str) -> Result<DateTime<Utc>> {
    if !DATE_RE.is_match(day) {
        return Err(Error::validation(
            "scheduledDate must be in YYYY-MM-DD format",
        ));
    }
    if !TIME_RE.is_match(time) {
        return Err(Error::validation(
            "scheduledTime must be in HH:MM format (24-hour)",
        ));
    }

    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| Error::validation("scheduledDate is not a valid calendar date"))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| Error::validation("scheduledTime is not a valid time of day"))?;

    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

/// The scheduled instant must be strictly in the future.
pub fn ensure_future(at: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
    if at <= now {
        return Err(Error::validation("Scheduled time must be in the future"));
    }
    Ok(())
}

/// Payload for message creation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    #[validate(length(min = 1, max = 1000, message = "Message must be 1-1000 characters"))]
    pub message: String,
    pub scheduled_date: String,
    pub scheduled_time: String,
    pub recipient: Option<String>,
    pub priority: Option<String>,
}

impl CreateMessageRequest {
    /// Validate the payload and build a pending message.
    pub fn into_message(self, now: DateTime<Utc>) -> Result<ScheduledMessage> {
        self.validate()
            .map_err(|e| Error::validation(e.to_string()))?;

        let scheduled_at = compose_scheduled_at(&self.scheduled_date, &self.scheduled_time)?;
        ensure_future(scheduled_at, now)?;

        let priority = match self.priority.as_deref() {
            Some(raw) => raw.parse()?,
            None => Priority::default(),
        };

        Ok(ScheduledMessage {
            id: Uuid::new_v4(),
            message: self.message,
            day: self.scheduled_date,
            time: self.scheduled_time,
            scheduled_at,
            recipient: self.recipient,
            priority,
            status: MessageStatus::Pending,
            error_message: None,
            sent_at: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update payload. Date and time are re-validated together when
/// either changes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessageRequest {
    pub message: Option<String>,
    pub scheduled_date: Option<String>,
    pub scheduled_time: Option<String>,
    pub recipient: Option<String>,
    pub priority: Option<String>,
}

impl UpdateMessageRequest {
    /// Apply this patch to an existing message.
    pub fn apply(self, current: &ScheduledMessage, now: DateTime<Utc>) -> Result<ScheduledMessage> {
        let mut updated = current.clone();

        if let Some(message) = self.message {
            if message.is_empty() || message.len() > MAX_MESSAGE_LEN {
                return Err(Error::validation("Message must be 1-1000 characters"));
            }
            updated.message = message;
        }
        if let Some(recipient) = self.recipient {
            updated.recipient = Some(recipient);
        }
        if let Some(raw) = self.priority {
            updated.priority = raw.parse()?;
        }

        if self.scheduled_date.is_some() || self.scheduled_time.is_some() {
            let day = self.scheduled_date.unwrap_or_else(|| current.day.clone());
            let time = self.scheduled_time.unwrap_or_else(|| current.time.clone());
            let scheduled_at = compose_scheduled_at(&day, &time)?;
            ensure_future(scheduled_at, now)?;
            updated.day = day;
            updated.time = time;
            updated.scheduled_at = scheduled_at;
        }

        updated.updated_at = now;
        Ok(updated)
    }
}
