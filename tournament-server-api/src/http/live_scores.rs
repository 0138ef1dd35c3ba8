use axum::{Json, extract::State};
use tournament_server_app::domain::r#match::LiveMatch;

use crate::{AppState, ServiceError, auth::Auth};

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    full_name: String,
}

#[derive(serde::Serialize)]
pub struct TournamentInfo {
    name: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMatchInfo {
    id: String,
    player_a: PlayerInfo,
    player_b: PlayerInfo,
    score_a: u32,
    score_b: u32,
    tournament: TournamentInfo,
}

impl From<LiveMatch> for LiveMatchInfo {
    fn from(live: LiveMatch) -> Self {
        Self {
            id: live.id.to_string(),
            player_a: PlayerInfo {
                full_name: live.player_a_name,
            },
            player_b: PlayerInfo {
                full_name: live.player_b_name,
            },
            score_a: live.score.player_a,
            score_b: live.score.player_b,
            tournament: TournamentInfo {
                name: live.tournament_name,
            },
        }
    }
}

#[derive(serde::Serialize)]
pub struct LiveScoresResponse {
    success: bool,
    matches: Vec<LiveMatchInfo>,
}

pub async fn get_live_scores(
    Auth(_claims): Auth,
    State(state): State<AppState>,
) -> Result<Json<LiveScoresResponse>, ServiceError> {
    let matches = state
        .app
        .match_list_live_use_case
        .list_live_matches()
        .await
        .map_err(|e| {
            log::error!("Failed to list live matches: {}", e);
            ServiceError::Internal("Failed to fetch live scores".to_string())
        })?;

    Ok(Json(LiveScoresResponse {
        success: true,
        matches: matches.into_iter().map(Into::into).collect(),
    }))
}
