//! Endpoints derived from the page origin.

use url::Url;

use crate::error::{Result, SyncError};

/// Path of the push channel.
pub const PUSH_PATH: &str = "/ws";

fn parse_origin(origin: &str) -> Result<Url> {
    Url::parse(origin).map_err(|e| SyncError::InvalidOrigin {
        origin: origin.to_string(),
        reason: e.to_string(),
    })
}

/// Push endpoint for `origin`: `ws://…/ws`, or `wss://…/ws` when the page
/// itself is served over https.
pub fn push_endpoint(origin: &str) -> Result<Url> {
    let mut url = parse_origin(origin)?;
    let scheme = match url.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => {
            return Err(SyncError::InvalidOrigin {
                origin: origin.to_string(),
                reason: format!("unsupported scheme `{}`", other),
            })
        }
    };
    url.set_scheme(scheme).map_err(|_| SyncError::InvalidOrigin {
        origin: origin.to_string(),
        reason: format!("cannot upgrade scheme to `{}`", scheme),
    })?;
    url.set_path(PUSH_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Origin-relative HTTP endpoint.
pub fn http_endpoint(origin: &str, path: &str) -> Result<Url> {
    let base = parse_origin(origin)?;
    base.join(path).map_err(|e| SyncError::InvalidOrigin {
        origin: origin.to_string(),
        reason: e.to_string(),
    })
}
