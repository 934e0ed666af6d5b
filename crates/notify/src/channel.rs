//! Push channel connection loop.
//!
//! One long-lived WebSocket per authenticated session, scoped to a
//! business. The loop only dials when an access token is in hand,
//! announces group membership once connected, applies pushed events in
//! arrival order, reconnects with exponential backoff on transient loss,
//! and announces departure (best-effort) on teardown.
//!
//! Channel failures are background noise: logged, never toasted.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use glowdesk_client::session::TokenSource;

use crate::backoff::Backoff;
use crate::messages::{parse_event, ClientInvocation};
use crate::store::NotificationStore;
use crate::sync::SyncConfig;

/// How often the loop re-checks for an access token while logged out.
const TOKEN_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Observable connection state of the push channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Run the channel until the cancellation token is triggered.
///
/// Connect -> join group -> apply events -> reconnect, with the state
/// published through `state_tx` at every transition.
pub(crate) async fn run_channel(
    config: SyncConfig,
    tokens: Arc<dyn TokenSource>,
    store: Arc<NotificationStore>,
    state_tx: watch::Sender<ChannelState>,
    cancel: CancellationToken,
) {
    let mut backoff = Backoff::new(config.initial_backoff, config.max_backoff, 2.0);

    loop {
        if cancel.is_cancelled() {
            break;
        }

        // The channel only dials with a token in hand; the owner tears it
        // down on logout, so while unauthenticated just re-check shortly.
        let Some(token) = tokens.access_token() else {
            let _ = state_tx.send(ChannelState::Disconnected);
            if sleep_or_cancel(TOKEN_POLL_INTERVAL, &cancel).await {
                break;
            }
            continue;
        };

        let _ = state_tx.send(ChannelState::Connecting);
        let url = format!(
            "{}/notifications?business_id={}&access_token={}",
            config.ws_url.trim_end_matches('/'),
            config.business_id,
            token,
        );

        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connect_async(&url) => result,
        };

        let mut ws = match connected {
            Ok((ws, _response)) => ws,
            Err(e) => {
                tracing::warn!(
                    business_id = config.business_id,
                    error = %e,
                    "Push channel connect failed",
                );
                if sleep_or_cancel(backoff.next_delay(), &cancel).await {
                    break;
                }
                continue;
            }
        };

        // Announce membership in the business's notification group.
        let join = ClientInvocation::JoinBusinessGroup {
            business_id: config.business_id,
        };
        if let Err(e) = ws.send(Message::Text(join.encode())).await {
            tracing::warn!(error = %e, "Failed to join business group");
            if sleep_or_cancel(backoff.next_delay(), &cancel).await {
                break;
            }
            continue;
        }

        let _ = state_tx.send(ChannelState::Connected);
        backoff.reset();
        tracing::info!(business_id = config.business_id, "Push channel connected");

        let cancelled = read_frames(&mut ws, &store, &cancel).await;

        if cancelled {
            // Best-effort departure; the connection is closing anyway.
            let leave = ClientInvocation::LeaveBusinessGroup {
                business_id: config.business_id,
            };
            let _ = ws.send(Message::Text(leave.encode())).await;
            let _ = ws.close(None).await;
            break;
        }

        tracing::info!(
            business_id = config.business_id,
            "Push channel lost, reconnecting",
        );
        if sleep_or_cancel(backoff.next_delay(), &cancel).await {
            break;
        }
    }

    let _ = state_tx.send(ChannelState::Disconnected);
}

/// Apply incoming frames until the connection drops or the channel is
/// cancelled. Returns `true` when the exit was a cancellation.
async fn read_frames(
    ws: &mut WsStream,
    store: &NotificationStore,
    cancel: &CancellationToken,
) -> bool {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return true,
            frame = ws.next() => match frame {
                Some(Ok(Message::Text(text))) => match parse_event(&text) {
                    Ok(event) => store.apply_event(event).await,
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            raw_message = %text,
                            "Failed to parse push event",
                        );
                    }
                },
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    // Handled automatically by tungstenite.
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "Push channel closed by server");
                    return false;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Push channel receive error");
                    return false;
                }
                None => return false,
            }
        }
    }
}

/// Sleep for `delay`, returning `true` if cancelled first.
async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(delay) => false,
    }
}
