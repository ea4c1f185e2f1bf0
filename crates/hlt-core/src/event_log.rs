//! Bounded log of live subscription events.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Maximum number of events kept; older entries are evicted first.
pub const LIVE_EVENT_CAPACITY: usize = 500;
/// Lines per page in the paged view.
pub const EVENT_PAGE_SIZE: usize = 10;
/// Characters shown per line before truncation.
pub const EVENT_DISPLAY_LIMIT: usize = 300;

const TRUNCATION_MARKER: &str = " …";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEvent {
    pub at: DateTime<Utc>,
    pub text: String,
}

impl LiveEvent {
    pub fn now(text: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            text: text.into(),
        }
    }
}

impl fmt::Display for LiveEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local: DateTime<Local> = self.at.into();
        write!(f, "{}: {}", local.format("%H:%M:%S"), self.text)
    }
}

/// One page of formatted events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    /// 1-based page number after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub total_events: usize,
    pub lines: Vec<String>,
}

/// FIFO-bounded event log.
#[derive(Debug, Clone)]
pub struct LiveEventLog {
    events: VecDeque<LiveEvent>,
    capacity: usize,
}

impl Default for LiveEventLog {
    fn default() -> Self {
        Self::with_capacity(LIVE_EVENT_CAPACITY)
    }
}

impl LiveEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log with a custom bound. A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: LiveEvent) {
        while self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.push(LiveEvent::now(text));
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LiveEvent> {
        self.events.iter()
    }

    pub fn last(&self) -> Option<&LiveEvent> {
        self.events.back()
    }

    /// Formatted view of `page` (1-based), clamped into `1..=total_pages`.
    pub fn page(&self, page: usize) -> EventPage {
        let total_events = self.events.len();
        let total_pages = total_events.div_ceil(EVENT_PAGE_SIZE).max(1);
        let page = page.clamp(1, total_pages);
        let lines = self
            .events
            .iter()
            .skip((page - 1) * EVENT_PAGE_SIZE)
            .take(EVENT_PAGE_SIZE)
            .map(|event| truncate_line(&event.to_string()))
            .collect();

        EventPage {
            page,
            total_pages,
            total_events,
            lines,
        }
    }
}

fn truncate_line(line: &str) -> String {
    match line.char_indices().nth(EVENT_DISPLAY_LIMIT) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &line[..cut]),
        None => line.to_string(),
    }
}
