use crate::domain::{MatchId, RepoError, RepoRetrieveError, RepoUpdateError, TournamentId, UserId};

/// Points awarded to the winner of a match.
pub const POINTS_PER_WIN: i64 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "SCHEDULED",
            MatchStatus::InProgress => "IN_PROGRESS",
            MatchStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(MatchStatus::Scheduled),
            "IN_PROGRESS" => Some(MatchStatus::InProgress),
            "COMPLETED" => Some(MatchStatus::Completed),
            _ => None,
        }
    }

    /// Transitions only move forward.
    pub fn can_transition_to(&self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Scheduled, MatchStatus::InProgress)
                | (MatchStatus::Scheduled, MatchStatus::Completed)
                | (MatchStatus::InProgress, MatchStatus::Completed)
        )
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Score {
    pub player_a: u32,
    pub player_b: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub player_a_id: UserId,
    pub player_b_id: UserId,
    pub referee_id: Option<UserId>,
    pub status: MatchStatus,
    pub score: Score,
    pub winner_id: Option<UserId>,
}

impl Match {
    pub fn is_player(&self, user_id: UserId) -> bool {
        self.player_a_id == user_id || self.player_b_id == user_id
    }

    /// The other participant, if `user_id` is one of the two players.
    pub fn opponent_of(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.player_a_id {
            Some(self.player_b_id)
        } else if user_id == self.player_b_id {
            Some(self.player_a_id)
        } else {
            None
        }
    }
}

/// Every write that concluding a match requires. Applied all-or-nothing.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchCompletion {
    pub match_id: MatchId,
    pub winner_id: UserId,
    pub loser_id: UserId,
    pub winner_points: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LiveMatch {
    pub id: MatchId,
    pub player_a_name: String,
    pub player_b_name: String,
    pub score: Score,
    pub tournament_name: String,
}

#[async_trait::async_trait]
pub trait MatchRepository {
    async fn get_match(&self, id: MatchId) -> Result<Match, RepoRetrieveError>;
    /// Moves the match from `from` to `to`. Fails with `Conflict` when the
    /// stored status is no longer `from`.
    async fn transition_status(
        &self,
        id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> Result<(), RepoUpdateError>;
    /// Fails with `Conflict` when the match is already completed.
    async fn update_score(&self, id: MatchId, score: Score) -> Result<(), RepoUpdateError>;
    /// Marks the match completed and applies the stat changes in one
    /// transaction. Fails with `Conflict` when the match is already completed.
    async fn complete_match(&self, completion: MatchCompletion) -> Result<(), RepoUpdateError>;
    /// In-progress matches, newest first.
    async fn list_live_matches(&self) -> Result<Vec<LiveMatch>, RepoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_are_monotonic() {
        use MatchStatus::*;
        assert!(Scheduled.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(Scheduled.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Scheduled));
        assert!(!Completed.can_transition_to(InProgress));
        assert!(!Completed.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(InProgress));
    }

    #[test]
    fn test_opponent_of() {
        let a = UserId::new();
        let b = UserId::new();
        let m = Match {
            id: MatchId::new(),
            tournament_id: TournamentId(uuid::Uuid::new_v4()),
            player_a_id: a,
            player_b_id: b,
            referee_id: None,
            status: MatchStatus::Scheduled,
            score: Score::default(),
            winner_id: None,
        };
        assert_eq!(m.opponent_of(a), Some(b));
        assert_eq!(m.opponent_of(b), Some(a));
        assert_eq!(m.opponent_of(UserId::new()), None);
    }
}
