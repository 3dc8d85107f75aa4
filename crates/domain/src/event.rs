//! Calendar event record produced by every feed

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_EVENT_COLOR;
use crate::errors::{CalFeedError, Result};

/// A single entry rendered by the host calendar
///
/// Serialized in camelCase; `href` is always present (as `null` when absent),
/// `icon` and `imageURL` are omitted when unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    title: String,
    start_date: String,
    end_date: String,
    color: String,
    #[serde(default)]
    notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(rename = "imageURL", default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
    #[serde(default)]
    href: Option<String>,
    #[serde(default)]
    is_all_day: bool,
    #[serde(default)]
    is_point_in_time: bool,
}

impl CalendarEvent {
    /// Start building an event with the given title
    pub fn builder(title: impl Into<String>) -> EventBuilder {
        EventBuilder::new(title)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start_date(&self) -> &str {
        &self.start_date
    }

    pub fn end_date(&self) -> &str {
        &self.end_date
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn href(&self) -> Option<&str> {
        self.href.as_deref()
    }

    pub fn is_all_day(&self) -> bool {
        self.is_all_day
    }

    pub fn is_point_in_time(&self) -> bool {
        self.is_point_in_time
    }
}

/// Builder for [`CalendarEvent`]
///
/// `build` rejects an empty title or start date. The end date defaults to the
/// start date and the colour to [`DEFAULT_EVENT_COLOR`].
#[derive(Debug, Clone)]
pub struct EventBuilder {
    title: String,
    start_date: String,
    end_date: Option<String>,
    color: Option<String>,
    notes: String,
    icon: Option<String>,
    image_url: Option<String>,
    href: Option<String>,
    is_all_day: bool,
    is_point_in_time: bool,
}

impl EventBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start_date: String::new(),
            end_date: None,
            color: None,
            notes: String::new(),
            icon: None,
            image_url: None,
            href: None,
            is_all_day: false,
            is_point_in_time: false,
        }
    }

    pub fn start(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = start_date.into();
        self
    }

    pub fn end(mut self, end_date: impl Into<String>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn icon(mut self, icon: Option<String>) -> Self {
        self.icon = icon.filter(|value| !value.is_empty());
        self
    }

    pub fn image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url.filter(|value| !value.is_empty());
        self
    }

    pub fn href(mut self, href: Option<String>) -> Self {
        self.href = href.filter(|value| !value.is_empty());
        self
    }

    pub fn all_day(mut self, is_all_day: bool) -> Self {
        self.is_all_day = is_all_day;
        self
    }

    pub fn point_in_time(mut self, is_point_in_time: bool) -> Self {
        self.is_point_in_time = is_point_in_time;
        self
    }

    /// Validate and produce the event
    pub fn build(self) -> Result<CalendarEvent> {
        if self.title.trim().is_empty() {
            return Err(CalFeedError::InvalidInput("event title must not be empty".into()));
        }
        if self.start_date.trim().is_empty() {
            return Err(CalFeedError::InvalidInput(format!(
                "event '{}' has no start date",
                self.title
            )));
        }

        let end_date = self
            .end_date
            .filter(|end| !end.trim().is_empty())
            .unwrap_or_else(|| self.start_date.clone());

        Ok(CalendarEvent {
            title: self.title,
            start_date: self.start_date,
            end_date,
            color: self.color.unwrap_or_else(|| DEFAULT_EVENT_COLOR.to_string()),
            notes: self.notes,
            icon: self.icon,
            image_url: self.image_url,
            href: self.href,
            is_all_day: self.is_all_day,
            is_point_in_time: self.is_point_in_time,
        })
    }
}
