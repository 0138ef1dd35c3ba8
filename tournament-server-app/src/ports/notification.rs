use crate::domain::{ListenerId, MatchId, UserId, r#match::Score, user::LeaderboardEntry};

pub trait ListenerNotificationPort {
    fn notify_listeners(&self, listeners: &[ListenerId], message: ListenerMessage);
    fn notify_all(&self, message: ListenerMessage);
}

#[derive(Clone, Debug, PartialEq)]
pub enum ListenerMessage {
    MatchStarted {
        match_id: MatchId,
    },
    MatchEnded {
        match_id: MatchId,
        winner_id: UserId,
    },
    ScoreUpdated {
        match_id: MatchId,
        score: Score,
    },
    /// Same payload as `ScoreUpdated`, addressed to every connection for
    /// global live-score displays.
    StaticScoreUpdated {
        match_id: MatchId,
        score: Score,
    },
    LeaderboardUpdated {
        leaderboard: Vec<LeaderboardEntry>,
    },
}
