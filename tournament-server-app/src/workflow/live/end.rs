use std::sync::Arc;

use crate::{
    domain::{
        MatchId, UserId,
        r#match::{MatchCompletion, MatchRepository, MatchStatus, POINTS_PER_WIN},
        permission::{Actor, MatchAction, MatchCapabilityPolicy},
        topic::MatchTopicService,
    },
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    workflow::{
        leaderboard::project::LeaderboardProjectionWorkflow,
        live::{MatchMutationError, load_authorized},
    },
};

#[async_trait::async_trait]
pub trait EndMatchUseCase {
    async fn end_match(
        &self,
        actor: &Actor,
        match_id: MatchId,
        winner_id: UserId,
    ) -> Result<(), MatchMutationError>;
}

pub struct EndMatchUseCaseImpl<
    M: MatchRepository,
    P: MatchCapabilityPolicy,
    T: MatchTopicService,
    L: ListenerNotificationPort,
    LB: LeaderboardProjectionWorkflow,
> {
    match_repository: Arc<M>,
    capability_policy: Arc<P>,
    topic_service: Arc<T>,
    listener_notification_port: Arc<L>,
    leaderboard_projection: Arc<LB>,
}

impl<
    M: MatchRepository,
    P: MatchCapabilityPolicy,
    T: MatchTopicService,
    L: ListenerNotificationPort,
    LB: LeaderboardProjectionWorkflow,
> EndMatchUseCaseImpl<M, P, T, L, LB>
{
    pub fn new(
        match_repository: Arc<M>,
        capability_policy: Arc<P>,
        topic_service: Arc<T>,
        listener_notification_port: Arc<L>,
        leaderboard_projection: Arc<LB>,
    ) -> Self {
        Self {
            match_repository,
            capability_policy,
            topic_service,
            listener_notification_port,
            leaderboard_projection,
        }
    }
}

#[async_trait::async_trait]
impl<
    M: MatchRepository + Send + Sync + 'static,
    P: MatchCapabilityPolicy + Send + Sync + 'static,
    T: MatchTopicService + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
    LB: LeaderboardProjectionWorkflow + Send + Sync + 'static,
> EndMatchUseCase for EndMatchUseCaseImpl<M, P, T, L, LB>
{
    async fn end_match(
        &self,
        actor: &Actor,
        match_id: MatchId,
        winner_id: UserId,
    ) -> Result<(), MatchMutationError> {
        let game = load_authorized(
            self.match_repository.as_ref(),
            self.capability_policy.as_ref(),
            actor,
            match_id,
            MatchAction::End,
        )
        .await?;

        let Some(loser_id) = game.opponent_of(winner_id) else {
            return Err(MatchMutationError::InvalidWinner);
        };
        if !game.status.can_transition_to(MatchStatus::Completed) {
            return Err(MatchMutationError::InvalidTransition {
                status: game.status,
                action: MatchAction::End,
            });
        }

        self.match_repository
            .complete_match(MatchCompletion {
                match_id,
                winner_id,
                loser_id,
                winner_points: POINTS_PER_WIN,
            })
            .await
            .map_err(|e| match MatchMutationError::from(e) {
                MatchMutationError::Conflict => MatchMutationError::InvalidTransition {
                    status: MatchStatus::Completed,
                    action: MatchAction::End,
                },
                other => other,
            })?;
        log::info!("Match {} ended, winner {}", match_id, winner_id);

        self.leaderboard_projection.project_leaderboard().await;

        let listeners = self.topic_service.get_listeners(match_id);
        self.listener_notification_port.notify_listeners(
            &listeners,
            ListenerMessage::MatchEnded {
                match_id,
                winner_id,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::{
        domain::{
            permission::AssignedRefereePolicy, topic::MatchTopicServiceImpl, user::UserStats,
        },
        testing::{InMemoryStore, MockListenerNotificationPort, Recipient},
        workflow::{
            leaderboard::project::LeaderboardProjectionWorkflowImpl,
            live::fixtures::LiveFixture,
        },
    };

    type TestEndMatch = EndMatchUseCaseImpl<
        InMemoryStore,
        AssignedRefereePolicy,
        MatchTopicServiceImpl,
        MockListenerNotificationPort,
        LeaderboardProjectionWorkflowImpl<InMemoryStore, MockListenerNotificationPort>,
    >;

    fn use_case(f: &LiveFixture) -> TestEndMatch {
        EndMatchUseCaseImpl::new(
            f.store.clone(),
            Arc::new(AssignedRefereePolicy),
            f.topics.clone(),
            f.notifier.clone(),
            Arc::new(LeaderboardProjectionWorkflowImpl::new(
                f.store.clone(),
                f.notifier.clone(),
            )),
        )
    }

    #[tokio::test]
    async fn test_end_awards_stats_to_both_players_only() {
        let f = LiveFixture::new();
        use_case(&f)
            .end_match(&f.referee_actor(), f.game.id, f.player_b.id)
            .await
            .unwrap();

        let game = f.store.game(f.game.id);
        assert_eq!(game.status, MatchStatus::Completed);
        assert_eq!(game.winner_id, Some(f.player_b.id));
        assert_eq!(
            f.store.user(f.player_b.id).stats,
            UserStats {
                wins: 1,
                losses: 0,
                points: 4 + POINTS_PER_WIN,
            }
        );
        assert_eq!(
            f.store.user(f.player_a.id).stats,
            UserStats {
                wins: 0,
                losses: 1,
                points: 6,
            }
        );
        assert_eq!(f.store.user(f.referee.id).stats, UserStats::default());
    }

    #[tokio::test]
    async fn test_end_broadcasts_leaderboard_then_match_ended() {
        let f = LiveFixture::new();
        use_case(&f)
            .end_match(&f.referee_actor(), f.game.id, f.player_b.id)
            .await
            .unwrap();

        let messages = f.notifier.get_messages();
        assert_eq!(messages.len(), 2);

        let (Recipient::All, ListenerMessage::LeaderboardUpdated { leaderboard }) = &messages[0]
        else {
            panic!("expected leaderboard broadcast first, got {:?}", messages[0]);
        };
        assert_eq!(leaderboard.len(), f.store.all_users().len());
        assert!(leaderboard.windows(2).all(|w| w[0].points >= w[1].points));
        assert_eq!(leaderboard[0].id, f.player_b.id);
        assert_eq!(leaderboard[0].points, 7);

        assert_eq!(
            messages[1],
            (
                Recipient::Listener(f.watcher),
                ListenerMessage::MatchEnded {
                    match_id: f.game.id,
                    winner_id: f.player_b.id,
                }
            )
        );
    }

    #[tokio::test]
    async fn test_second_end_does_not_award_twice() {
        let f = LiveFixture::new();
        let end = use_case(&f);
        end.end_match(&f.referee_actor(), f.game.id, f.player_a.id)
            .await
            .unwrap();
        let result = end
            .end_match(&f.referee_actor(), f.game.id, f.player_a.id)
            .await;

        assert_eq!(
            result,
            Err(MatchMutationError::InvalidTransition {
                status: MatchStatus::Completed,
                action: MatchAction::End,
            })
        );
        assert_eq!(f.store.user(f.player_a.id).stats.wins, 1);
        assert_eq!(f.store.user(f.player_a.id).stats.points, 6 + POINTS_PER_WIN);
        assert_eq!(f.store.user(f.player_b.id).stats.losses, 1);
    }

    #[tokio::test]
    async fn test_winner_must_be_a_player() {
        let f = LiveFixture::new();
        let result = use_case(&f)
            .end_match(&f.referee_actor(), f.game.id, f.referee.id)
            .await;

        assert_eq!(result, Err(MatchMutationError::InvalidWinner));
        assert_eq!(f.store.game(f.game.id).status, MatchStatus::Scheduled);
        assert!(f.notifier.get_messages().is_empty());
    }

    #[tokio::test]
    async fn test_unassigned_referee_cannot_end() {
        let f = LiveFixture::new();
        let result = use_case(&f)
            .end_match(&f.stranger_referee(), f.game.id, f.player_a.id)
            .await;

        assert_eq!(result, Err(MatchMutationError::Unauthorized(MatchAction::End)));
        assert_eq!(f.store.user(f.player_a.id).stats.wins, 0);
        assert!(f.notifier.get_messages().is_empty());
    }

    #[tokio::test]
    async fn test_failed_completion_changes_nothing() {
        let f = LiveFixture::new();
        f.store.fail_writes.store(true, Ordering::SeqCst);
        let result = use_case(&f)
            .end_match(&f.referee_actor(), f.game.id, f.player_a.id)
            .await;

        assert!(matches!(result, Err(MatchMutationError::Storage(_))));
        assert_eq!(f.store.game(f.game.id).status, MatchStatus::Scheduled);
        assert_eq!(f.store.user(f.player_a.id).stats.points, 6);
        assert!(f.notifier.get_messages().is_empty());
    }
}
