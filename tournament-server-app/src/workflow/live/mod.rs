use crate::domain::{
    MatchId, RepoRetrieveError, RepoUpdateError,
    r#match::{Match, MatchRepository, MatchStatus},
    permission::{Actor, MatchAction, MatchCapabilityPolicy},
};

pub mod end;
pub mod score;
pub mod start;
pub mod topic;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MatchMutationError {
    #[error("Match not found.")]
    MatchNotFound,
    #[error("Unauthorized: Only the assigned referee can {0} this match.")]
    Unauthorized(MatchAction),
    #[error("Winner must be one of the two players.")]
    InvalidWinner,
    #[error("Cannot {action} a match that is {status}.")]
    InvalidTransition {
        status: MatchStatus,
        action: MatchAction,
    },
    #[error("Match was changed by another request.")]
    Conflict,
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<RepoUpdateError> for MatchMutationError {
    fn from(e: RepoUpdateError) -> Self {
        match e {
            RepoUpdateError::NotFound => MatchMutationError::MatchNotFound,
            RepoUpdateError::Conflict => MatchMutationError::Conflict,
            RepoUpdateError::StorageError(msg) => MatchMutationError::Storage(msg),
        }
    }
}

/// Loads the match and checks that `actor` may perform `action` on it.
/// Nothing is written when this fails.
async fn load_authorized<M, P>(
    match_repository: &M,
    capability_policy: &P,
    actor: &Actor,
    match_id: MatchId,
    action: MatchAction,
) -> Result<Match, MatchMutationError>
where
    M: MatchRepository + Send + Sync,
    P: MatchCapabilityPolicy + Send + Sync,
{
    let game = match match_repository.get_match(match_id).await {
        Ok(game) => game,
        Err(RepoRetrieveError::NotFound) => return Err(MatchMutationError::MatchNotFound),
        Err(RepoRetrieveError::StorageError(msg)) => return Err(MatchMutationError::Storage(msg)),
    };
    if !capability_policy.can_mutate(actor, &game, action) {
        log::warn!(
            "User {} ({}) is not allowed to {} match {}",
            actor.user_id,
            actor.role,
            action,
            match_id
        );
        return Err(MatchMutationError::Unauthorized(action));
    }
    Ok(game)
}
