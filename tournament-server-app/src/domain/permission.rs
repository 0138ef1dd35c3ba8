use crate::domain::{UserId, r#match::Match, user::Role};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchAction {
    Start,
    UpdateScore,
    End,
}

impl std::fmt::Display for MatchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchAction::Start => write!(f, "start"),
            MatchAction::UpdateScore => write!(f, "update the score of"),
            MatchAction::End => write!(f, "end"),
        }
    }
}

/// The authenticated identity behind a request or connection.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

pub trait MatchCapabilityPolicy {
    fn can_mutate(&self, actor: &Actor, game: &Match, action: MatchAction) -> bool;
}

/// Only the referee assigned to a match may change it.
pub struct AssignedRefereePolicy;

impl MatchCapabilityPolicy for AssignedRefereePolicy {
    fn can_mutate(&self, actor: &Actor, game: &Match, action: MatchAction) -> bool {
        match action {
            MatchAction::Start | MatchAction::UpdateScore | MatchAction::End => {
                actor.role == Role::Referee && game.referee_id == Some(actor.user_id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{
        MatchId, TournamentId,
        r#match::{MatchStatus, Score},
    };

    use super::*;

    fn match_refereed_by(referee_id: Option<UserId>) -> Match {
        Match {
            id: MatchId::new(),
            tournament_id: TournamentId(uuid::Uuid::new_v4()),
            player_a_id: UserId::new(),
            player_b_id: UserId::new(),
            referee_id,
            status: MatchStatus::Scheduled,
            score: Score::default(),
            winner_id: None,
        }
    }

    #[test]
    fn test_assigned_referee_may_mutate() {
        let referee = UserId::new();
        let game = match_refereed_by(Some(referee));
        let actor = Actor {
            user_id: referee,
            role: Role::Referee,
        };
        for action in [MatchAction::Start, MatchAction::UpdateScore, MatchAction::End] {
            assert!(AssignedRefereePolicy.can_mutate(&actor, &game, action));
        }
    }

    #[test]
    fn test_other_referee_may_not_mutate() {
        let game = match_refereed_by(Some(UserId::new()));
        let actor = Actor {
            user_id: UserId::new(),
            role: Role::Referee,
        };
        assert!(!AssignedRefereePolicy.can_mutate(&actor, &game, MatchAction::Start));
    }

    #[test]
    fn test_assigned_id_without_referee_role_is_rejected() {
        let user = UserId::new();
        let game = match_refereed_by(Some(user));
        for role in [Role::Player, Role::Organizer, Role::Admin] {
            let actor = Actor {
                user_id: user,
                role,
            };
            assert!(!AssignedRefereePolicy.can_mutate(&actor, &game, MatchAction::End));
        }
    }

    #[test]
    fn test_unassigned_match_cannot_be_mutated() {
        let game = match_refereed_by(None);
        let actor = Actor {
            user_id: UserId::new(),
            role: Role::Referee,
        };
        assert!(!AssignedRefereePolicy.can_mutate(&actor, &game, MatchAction::UpdateScore));
    }
}
