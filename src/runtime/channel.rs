//! One push-channel connection task.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;

use crate::connection::ChannelId;
use crate::logging::structured::LogContext;
use crate::sync::Input;

/// Close signal for a running channel task.
#[derive(Debug)]
pub struct ChannelHandle {
    close: oneshot::Sender<()>,
}

impl ChannelHandle {
    pub fn close(self) {
        // The task may already have ended on its own.
        let _ = self.close.send(());
    }
}

/// Spawn the task for `channel`. It reports `ChannelOpened`, each text
/// frame and, unless closed locally, a final `ChannelClosed`.
pub fn spawn_channel(
    ctx: &LogContext,
    channel: ChannelId,
    url: String,
    events: mpsc::UnboundedSender<Input>,
) -> ChannelHandle {
    let (close_tx, close_rx) = oneshot::channel();
    let ctx = ctx.with_component("channel");
    tokio::spawn(run_channel(ctx, channel, url, events, close_rx));
    ChannelHandle { close: close_tx }
}

async fn run_channel(
    ctx: LogContext,
    channel: ChannelId,
    url: String,
    events: mpsc::UnboundedSender<Input>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let connected = tokio::select! {
        _ = &mut close_rx => {
            log::debug!("{} CHANNEL_ABANDONED channel={}", ctx, channel.0);
            return;
        }
        result = tokio_tungstenite::connect_async(url.as_str()) => result,
    };

    let ws = match connected {
        Ok((ws, _response)) => ws,
        Err(e) => {
            log::warn!("{} CHANNEL_CONNECT_FAILED channel={} error={}", ctx, channel.0, e);
            let _ = events.send(Input::ChannelClosed {
                channel,
                reason: Some(e.to_string()),
            });
            return;
        }
    };

    if events.send(Input::ChannelOpened(channel)).is_err() {
        return;
    }
    let (mut sink, mut stream) = ws.split();

    let reason = loop {
        tokio::select! {
            _ = &mut close_rx => {
                if let Err(e) = sink.close().await {
                    log::debug!("{} CHANNEL_CLOSE_FAILED channel={} error={}", ctx, channel.0, e);
                }
                return;
            }
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if events.send(Input::ChannelFrame(channel, text.to_string())).is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    break frame.map(|f| f.reason.to_string());
                }
                // Ping/pong are answered by tungstenite; binary frames are not part
                // of the protocol.
                Some(Ok(_)) => {}
                Some(Err(e)) => break Some(e.to_string()),
                None => break None,
            },
        }
    };

    let _ = events.send(Input::ChannelClosed { channel, reason });
}
