//! Explicit view state for every screen of the console.
//!
//! Handlers never keep loose flags around: each screen owns a record here,
//! and every transition is a method on it.

use crate::models::{RevenueSummary, Session, ShellQuery, UserDetail, UserSummary};
use std::time::Duration;

/// How long the login success banner stays up before the dashboard opens.
pub const LOGIN_REDIRECT_DELAY: Duration = Duration::from_secs(1);
/// How long a "refreshed" acknowledgment stays visible.
pub const ACK_DURATION: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Unauthenticated,
    Authenticated,
}

impl Gate {
    pub fn of(session: &Session) -> Self {
        if session.is_authenticated() {
            Gate::Authenticated
        } else {
            Gate::Unauthenticated
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Dashboard,
    Users,
}

impl Tab {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dashboard" => Some(Tab::Dashboard),
            "users" => Some(Tab::Users),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Tab::Dashboard => "dashboard",
            Tab::Users => "users",
        }
    }
}

/// Tab and sidebar of the dashboard shell. Lives in the URL only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellState {
    pub active_tab: Tab,
    pub sidebar_open: bool,
}

impl Default for ShellState {
    fn default() -> Self {
        Self {
            active_tab: Tab::Dashboard,
            sidebar_open: true,
        }
    }
}

impl ShellState {
    pub fn from_query(query: &ShellQuery) -> Self {
        Self {
            active_tab: query
                .tab
                .as_deref()
                .and_then(Tab::parse)
                .unwrap_or_default(),
            sidebar_open: query.sidebar.as_deref() != Some("closed"),
        }
    }

    pub fn with_tab(self, active_tab: Tab) -> Self {
        Self { active_tab, ..self }
    }

    pub fn with_sidebar_toggled(self) -> Self {
        Self {
            sidebar_open: !self.sidebar_open,
            ..self
        }
    }

    pub fn href(self) -> String {
        let mut href = format!("/dashboard?tab={}", self.active_tab.as_str());
        if !self.sidebar_open {
            href.push_str("&sidebar=closed");
        }
        href
    }
}

/// Identifies one in-flight request. Only the newest ticket may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    epoch: u64,
}

/// A snapshot fetched from the remote service plus its refresh bookkeeping.
#[derive(Debug)]
pub struct Panel<T> {
    snapshot: Option<T>,
    responded_epoch: Option<u64>,
    generation: u64,
    busy: bool,
    notice: Option<String>,
}

impl<T> Default for Panel<T> {
    fn default() -> Self {
        Self {
            snapshot: None,
            responded_epoch: None,
            generation: 0,
            busy: false,
            notice: None,
        }
    }
}

impl<T> Panel<T> {
    pub fn snapshot(&self) -> Option<&T> {
        self.snapshot.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// True once any response (success or failure) has arrived.
    pub fn has_responded(&self) -> bool {
        self.responded_epoch.is_some()
    }

    /// Mount rule: fetch when nothing has come back for this session yet.
    pub fn needs_fetch(&self, epoch: u64) -> bool {
        !self.busy && self.responded_epoch != Some(epoch)
    }

    /// Starts a request, or refuses while one is already outstanding.
    pub fn begin(&mut self, epoch: u64) -> Option<Ticket> {
        if self.busy {
            return None;
        }
        self.busy = true;
        self.generation += 1;
        Some(Ticket {
            generation: self.generation,
            epoch,
        })
    }

    /// Replaces the snapshot wholesale. Returns false for a stale ticket.
    pub fn apply(&mut self, ticket: Ticket, value: T) -> bool {
        if !self.settle(ticket) {
            return false;
        }
        self.snapshot = Some(value);
        self.notice = None;
        true
    }

    /// Records a failure; the previous snapshot stays visible.
    pub fn fail(&mut self, ticket: Ticket, notice: impl Into<String>) -> bool {
        if !self.settle(ticket) {
            return false;
        }
        self.notice = Some(notice.into());
        true
    }

    pub fn clear(&mut self) {
        self.snapshot = None;
        self.notice = None;
    }

    /// Forgets everything and orphans any outstanding ticket.
    pub fn reset(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::default()
        };
    }

    fn settle(&mut self, ticket: Ticket) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.busy = false;
        self.responded_epoch = Some(ticket.epoch);
        true
    }
}

#[derive(Debug, Default)]
pub struct UsersPanel {
    pub roster: Panel<Vec<UserSummary>>,
    /// At most one user's detail, open in the overlay.
    pub detail: Panel<UserDetail>,
}

impl UsersPanel {
    pub fn selected(&self) -> Option<&UserDetail> {
        self.detail.snapshot()
    }

    pub fn dismiss(&mut self) {
        self.detail.clear();
    }

    pub fn reset(&mut self) {
        self.roster.reset();
        self.detail.reset();
    }
}

/// Everything the dashboard shell remembers between requests.
#[derive(Debug, Default)]
pub struct ConsoleViews {
    pub revenue: Panel<RevenueSummary>,
    pub users: UsersPanel,
}

impl ConsoleViews {
    /// Called whenever the session token changes.
    pub fn reset(&mut self) {
        self.revenue.reset();
        self.users.reset();
    }
}
