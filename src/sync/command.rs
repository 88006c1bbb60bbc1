//! Inputs to and commands from the dashboard core.

use url::Url;

use crate::client::{RemediationResponse, SourceListing, Submission, ToggleResponse};
use crate::connection::ChannelId;
use crate::model::ThreatSummary;
use crate::notify::NotificationId;
use crate::render::Module;

/// Everything that can happen to a session.
///
/// Failures of IO carry the error text; the core decides what the user
/// sees.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Page load: connect, fetch the summary and the source listing.
    Start,
    ChannelOpened(ChannelId),
    ChannelFrame(ChannelId, String),
    ChannelClosed {
        channel: ChannelId,
        reason: Option<String>,
    },
    SummaryFetched(Result<ThreatSummary, String>),
    SourcesListed(Result<SourceListing, String>),
    ToggleSettled {
        source: String,
        result: Result<ToggleResponse, String>,
    },
    RemediationSettled {
        threat_id: String,
        result: Result<RemediationResponse, String>,
    },
    SubmissionSettled {
        label: &'static str,
        result: Result<(), String>,
    },
    /// Explicit refresh.
    Refresh,
    Remediate(String),
    ToggleSource(String),
    Submit(Submission),
    Navigate(Module),
    DragStart(String),
    DragMove { x: f64, y: f64 },
    DragEnd,
    Dismiss(NotificationId),
    Shutdown,
}

/// IO the driver must perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    OpenChannel { channel: ChannelId, url: Url },
    CloseChannel(ChannelId),
    FetchSummary,
    ListSources,
    ToggleSource(String),
    Remediate(String),
    Submit(Submission),
}
