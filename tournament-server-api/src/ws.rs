use std::sync::Arc;

use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use dashmap::DashMap;
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use serde_json::Value;
use tokio::{select, sync::mpsc::UnboundedSender};
use tokio_util::sync::CancellationToken;
use tournament_server_app::{
    domain::{
        ListenerId, MatchId, UserId,
        r#match::Score,
        permission::{Actor, MatchAction},
        user::{LeaderboardEntry, Role},
    },
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    workflow::live::MatchMutationError,
};

use crate::{AppState, auth::WsAuth};

pub async fn ws_handler(
    WsAuth(claims): WsAuth,
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let actor = claims.actor();
        let listener_id = ListenerId::new();
        let (ws_sender, ws_receiver) = socket.split();
        let cancellation_token = CancellationToken::new();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        state.ws.add_connection(
            listener_id,
            ConnectionEntry {
                cancellation_token: cancellation_token.clone(),
                sender: tx.clone(),
            },
        );
        log::info!(
            "WebSocket connection {} opened by user {} ({})",
            listener_id,
            actor.user_id,
            actor.role
        );

        let receive_task = tokio::spawn(receive_ws(
            state.clone(),
            actor,
            ws_receiver,
            cancellation_token.clone(),
            listener_id,
            tx,
        ));
        let send_task = tokio::spawn(send_ws(ws_sender, rx, cancellation_token));

        let (receive_res, send_res) = tokio::join!(receive_task, send_task);
        if let Err(e) = receive_res {
            log::error!("WebSocket receive task failed: {}", e);
        }
        if let Err(e) = send_res {
            log::error!("WebSocket send task failed: {}", e);
        }

        state.ws.remove_connection(listener_id);
        state
            .app
            .match_topic_use_case
            .handle_listener_disconnect(listener_id);
        log::info!("WebSocket connection {} closed", listener_id);
    })
}

async fn receive_ws(
    state: AppState,
    actor: Actor,
    mut ws_receiver: SplitStream<WebSocket>,
    cancellation_token: CancellationToken,
    listener_id: ListenerId,
    sender: UnboundedSender<ServerEvent>,
) {
    while let Some(msg) = select! {
        _ = cancellation_token.cancelled() => None,
        msg = ws_receiver.next() => msg,
    } {
        match msg {
            Ok(Message::Text(text)) => {
                let result = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        log::debug!("Received event from {}: {:?}", listener_id, event);
                        handle_client_event(&state, &actor, listener_id, event).await
                    }
                    Err(e) => {
                        log::warn!("Malformed event from {}: {}", listener_id, e);
                        Err("Invalid message format.".to_string())
                    }
                };
                if let Err(message) = result {
                    let _ = sender.send(ServerEvent::Error { message });
                }
            }
            Ok(Message::Close(frame)) => {
                log::debug!("WebSocket {} sent close: {:?}", listener_id, frame);
                break;
            }
            Err(e) => {
                log::warn!("WebSocket {} error: {}", listener_id, e);
                break;
            }
            _ => {}
        }
    }
    cancellation_token.cancel();
}

async fn send_ws(
    mut ws_sender: SplitSink<WebSocket, Message>,
    mut channel: tokio::sync::mpsc::UnboundedReceiver<ServerEvent>,
    cancellation_token: CancellationToken,
) {
    while let Some(event) = select! {
        _ = cancellation_token.cancelled() => None,
        event = channel.recv() => event,
    } {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
                log::error!("Failed to serialize event: {}", e);
                continue;
            }
        };
        if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
            log::warn!("Failed to send WebSocket message: {}", e);
            break;
        }
    }
    let _ = ws_sender.close().await;
    cancellation_token.cancel();
}

/// Handles one client event. The error string is sent back to the
/// originating connection only.
async fn handle_client_event(
    state: &AppState,
    actor: &Actor,
    listener_id: ListenerId,
    event: ClientEvent,
) -> Result<(), String> {
    let app = &state.app;
    match event {
        ClientEvent::JoinMatch(match_id) => {
            let match_id = MatchId::parse(&match_id).ok_or("Invalid match id.")?;
            app.match_topic_use_case.join_match(listener_id, match_id);
            Ok(())
        }
        ClientEvent::LeaveMatch(match_id) => {
            let match_id = MatchId::parse(&match_id).ok_or("Invalid match id.")?;
            app.match_topic_use_case.leave_match(listener_id, match_id);
            Ok(())
        }
        ClientEvent::MatchStarted {
            match_id,
            referee_id,
        } => {
            const INVALID: &str = "Invalid match start data.";
            let (Some(match_id), Some(referee_id)) = (text_field(&match_id), text_field(&referee_id))
            else {
                return Err(INVALID.to_string());
            };
            let match_id = parse_match_id(match_id)?;
            check_claimed_referee(actor, referee_id, MatchAction::Start)?;
            app.match_start_use_case
                .start_match(actor, match_id)
                .await
                .map_err(|e| mutation_error_message(e, actor, MatchAction::Start))
        }
        ClientEvent::MatchEnded {
            match_id,
            referee_id,
            winner_id,
        } => {
            const INVALID: &str = "Invalid match end data.";
            let (Some(match_id), Some(referee_id), Some(winner_id)) = (
                text_field(&match_id),
                text_field(&referee_id),
                text_field(&winner_id),
            ) else {
                return Err(INVALID.to_string());
            };
            let winner_id = UserId::parse(winner_id).ok_or(INVALID)?;
            let match_id = parse_match_id(match_id)?;
            check_claimed_referee(actor, referee_id, MatchAction::End)?;
            app.match_end_use_case
                .end_match(actor, match_id, winner_id)
                .await
                .map_err(|e| mutation_error_message(e, actor, MatchAction::End))
        }
        ClientEvent::UpdateScore {
            match_id,
            player_a_score,
            player_b_score,
        } => {
            const INVALID: &str = "Invalid score update data.";
            let (Some(match_id), Some(player_a), Some(player_b)) = (
                text_field(&match_id),
                score_field(&player_a_score),
                score_field(&player_b_score),
            ) else {
                return Err(INVALID.to_string());
            };
            let match_id = parse_match_id(match_id)?;
            let score = Score { player_a, player_b };
            app.match_update_score_use_case
                .update_score(actor, match_id, score)
                .await
                .map_err(|e| mutation_error_message(e, actor, MatchAction::UpdateScore))
        }
    }
}

/// Payload fields arrive untyped so that a wrongly typed field is reported
/// against the event it belongs to. Empty strings count as missing.
fn text_field(value: &Option<Value>) -> Option<&str> {
    value.as_ref()?.as_str().filter(|s| !s.is_empty())
}

fn score_field(value: &Option<Value>) -> Option<u32> {
    value
        .as_ref()?
        .as_u64()
        .and_then(|score| u32::try_from(score).ok())
}

/// A string that is not a match id can never name a stored match.
fn parse_match_id(match_id: &str) -> Result<MatchId, String> {
    MatchId::parse(match_id).ok_or_else(|| MatchMutationError::MatchNotFound.to_string())
}

/// The payload names the referee acting on the match. It must be the caller.
fn check_claimed_referee(
    actor: &Actor,
    referee_id: &str,
    action: MatchAction,
) -> Result<(), String> {
    if UserId::parse(referee_id) == Some(actor.user_id) {
        Ok(())
    } else {
        Err(unauthorized_message(actor, action))
    }
}

fn unauthorized_message(actor: &Actor, action: MatchAction) -> String {
    match action {
        MatchAction::Start => "Unauthorized: Only assigned referees can start matches.",
        MatchAction::End => "Unauthorized: Only assigned referees can end matches.",
        MatchAction::UpdateScore if actor.role != Role::Referee => {
            "Unauthorized: Only referees can update scores."
        }
        MatchAction::UpdateScore => {
            "Unauthorized: You are not the assigned referee for this match."
        }
    }
    .to_string()
}

fn mutation_error_message(e: MatchMutationError, actor: &Actor, action: MatchAction) -> String {
    match e {
        MatchMutationError::Unauthorized(_) => unauthorized_message(actor, action),
        MatchMutationError::Storage(msg) => {
            log::error!("Failed to {} match: {}", action, msg);
            match action {
                MatchAction::Start => "Failed to start match.",
                MatchAction::End => "Failed to end match.",
                MatchAction::UpdateScore => "Failed to update score. Please try again.",
            }
            .to_string()
        }
        other => other.to_string(),
    }
}

#[derive(serde::Deserialize, Debug)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    JoinMatch(String),
    LeaveMatch(String),
    MatchStarted {
        match_id: Option<Value>,
        referee_id: Option<Value>,
    },
    MatchEnded {
        match_id: Option<Value>,
        referee_id: Option<Value>,
        winner_id: Option<Value>,
    },
    UpdateScore {
        match_id: Option<Value>,
        player_a_score: Option<Value>,
        player_b_score: Option<Value>,
    },
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryInfo {
    pub id: String,
    pub full_name: String,
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
}

impl From<LeaderboardEntry> for LeaderboardEntryInfo {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            full_name: entry.full_name,
            points: entry.points,
            wins: entry.wins,
            losses: entry.losses,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, PartialEq)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    MatchStarted {
        match_id: String,
    },
    MatchEnded {
        match_id: String,
        winner_id: String,
    },
    ScoreUpdated {
        match_id: String,
        player_a_score: u32,
        player_b_score: u32,
    },
    StaticScoreUpdated {
        match_id: String,
        player_a_score: u32,
        player_b_score: u32,
    },
    LeaderboardUpdated {
        leaderboard: Vec<LeaderboardEntryInfo>,
    },
    Error {
        message: String,
    },
}

impl From<ListenerMessage> for ServerEvent {
    fn from(message: ListenerMessage) -> Self {
        match message {
            ListenerMessage::MatchStarted { match_id } => ServerEvent::MatchStarted {
                match_id: match_id.to_string(),
            },
            ListenerMessage::MatchEnded {
                match_id,
                winner_id,
            } => ServerEvent::MatchEnded {
                match_id: match_id.to_string(),
                winner_id: winner_id.to_string(),
            },
            ListenerMessage::ScoreUpdated { match_id, score } => ServerEvent::ScoreUpdated {
                match_id: match_id.to_string(),
                player_a_score: score.player_a,
                player_b_score: score.player_b,
            },
            ListenerMessage::StaticScoreUpdated { match_id, score } => {
                ServerEvent::StaticScoreUpdated {
                    match_id: match_id.to_string(),
                    player_a_score: score.player_a,
                    player_b_score: score.player_b,
                }
            }
            ListenerMessage::LeaderboardUpdated { leaderboard } => {
                ServerEvent::LeaderboardUpdated {
                    leaderboard: leaderboard.into_iter().map(Into::into).collect(),
                }
            }
        }
    }
}

struct ConnectionEntry {
    cancellation_token: CancellationToken,
    sender: UnboundedSender<ServerEvent>,
}

/// Registry of open WebSocket connections. Delivers application
/// notifications to them.
pub struct WsService {
    connections: Arc<DashMap<ListenerId, ConnectionEntry>>,
}

impl WsService {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
        }
    }

    fn add_connection(&self, id: ListenerId, entry: ConnectionEntry) {
        self.connections.insert(id, entry);
    }

    fn remove_connection(&self, id: ListenerId) {
        if let Some((_, entry)) = self.connections.remove(&id) {
            entry.cancellation_token.cancel();
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Cancels every open connection. Used on shutdown.
    pub fn close_all(&self) {
        for entry in self.connections.iter() {
            entry.cancellation_token.cancel();
        }
    }

    fn send(&self, listener_id: &ListenerId, event: ServerEvent) {
        if let Some(entry) = self.connections.get(listener_id) {
            let _ = entry.sender.send(event);
        }
    }
}

impl ListenerNotificationPort for WsService {
    fn notify_listeners(&self, listeners: &[ListenerId], message: ListenerMessage) {
        let event = ServerEvent::from(message);
        for listener in listeners {
            self.send(listener, event.clone());
        }
    }

    fn notify_all(&self, message: ListenerMessage) {
        let event = ServerEvent::from(message);
        for entry in self.connections.iter() {
            let _ = entry.sender.send(event.clone());
        }
    }
}
