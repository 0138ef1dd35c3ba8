use std::sync::Arc;

use crate::{
    domain::{
        MatchId,
        r#match::{MatchRepository, MatchStatus, Score},
        permission::{Actor, MatchAction, MatchCapabilityPolicy},
        topic::MatchTopicService,
    },
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    workflow::live::{MatchMutationError, load_authorized},
};

#[async_trait::async_trait]
pub trait UpdateScoreUseCase {
    async fn update_score(
        &self,
        actor: &Actor,
        match_id: MatchId,
        score: Score,
    ) -> Result<(), MatchMutationError>;
}

pub struct UpdateScoreUseCaseImpl<
    M: MatchRepository,
    P: MatchCapabilityPolicy,
    T: MatchTopicService,
    L: ListenerNotificationPort,
> {
    match_repository: Arc<M>,
    capability_policy: Arc<P>,
    topic_service: Arc<T>,
    listener_notification_port: Arc<L>,
}

impl<M: MatchRepository, P: MatchCapabilityPolicy, T: MatchTopicService, L: ListenerNotificationPort>
    UpdateScoreUseCaseImpl<M, P, T, L>
{
    pub fn new(
        match_repository: Arc<M>,
        capability_policy: Arc<P>,
        topic_service: Arc<T>,
        listener_notification_port: Arc<L>,
    ) -> Self {
        Self {
            match_repository,
            capability_policy,
            topic_service,
            listener_notification_port,
        }
    }
}

#[async_trait::async_trait]
impl<
    M: MatchRepository + Send + Sync + 'static,
    P: MatchCapabilityPolicy + Send + Sync + 'static,
    T: MatchTopicService + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
> UpdateScoreUseCase for UpdateScoreUseCaseImpl<M, P, T, L>
{
    async fn update_score(
        &self,
        actor: &Actor,
        match_id: MatchId,
        score: Score,
    ) -> Result<(), MatchMutationError> {
        let game = load_authorized(
            self.match_repository.as_ref(),
            self.capability_policy.as_ref(),
            actor,
            match_id,
            MatchAction::UpdateScore,
        )
        .await?;

        if game.status == MatchStatus::Completed {
            return Err(MatchMutationError::InvalidTransition {
                status: game.status,
                action: MatchAction::UpdateScore,
            });
        }

        self.match_repository
            .update_score(match_id, score)
            .await
            .map_err(|e| match MatchMutationError::from(e) {
                // The match completed between the read and the write.
                MatchMutationError::Conflict => MatchMutationError::InvalidTransition {
                    status: MatchStatus::Completed,
                    action: MatchAction::UpdateScore,
                },
                other => other,
            })?;
        log::debug!(
            "Score of match {} set to {}-{}",
            match_id,
            score.player_a,
            score.player_b
        );

        let listeners = self.topic_service.get_listeners(match_id);
        self.listener_notification_port
            .notify_listeners(&listeners, ListenerMessage::ScoreUpdated { match_id, score });
        self.listener_notification_port
            .notify_all(ListenerMessage::StaticScoreUpdated { match_id, score });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{permission::AssignedRefereePolicy, topic::MatchTopicServiceImpl},
        testing::{InMemoryStore, MockListenerNotificationPort, Recipient},
        workflow::live::fixtures::LiveFixture,
    };

    fn use_case(
        f: &LiveFixture,
    ) -> UpdateScoreUseCaseImpl<
        InMemoryStore,
        AssignedRefereePolicy,
        MatchTopicServiceImpl,
        MockListenerNotificationPort,
    > {
        UpdateScoreUseCaseImpl::new(
            f.store.clone(),
            Arc::new(AssignedRefereePolicy),
            f.topics.clone(),
            f.notifier.clone(),
        )
    }

    const SCORE: Score = Score {
        player_a: 2,
        player_b: 1,
    };

    #[tokio::test]
    async fn test_topic_members_get_scoped_update_and_everyone_gets_static() {
        let f = LiveFixture::new();
        use_case(&f)
            .update_score(&f.referee_actor(), f.game.id, SCORE)
            .await
            .unwrap();

        assert_eq!(f.store.game(f.game.id).score, SCORE);

        let scoped = ListenerMessage::ScoreUpdated {
            match_id: f.game.id,
            score: SCORE,
        };
        let global = ListenerMessage::StaticScoreUpdated {
            match_id: f.game.id,
            score: SCORE,
        };
        assert_eq!(
            f.notifier.get_messages(),
            vec![
                (Recipient::Listener(f.watcher), scoped.clone()),
                (Recipient::All, global.clone()),
            ]
        );
        assert_eq!(f.notifier.messages_for(f.bystander), vec![global]);
    }

    #[tokio::test]
    async fn test_unassigned_referee_cannot_update() {
        let f = LiveFixture::new();
        let result = use_case(&f)
            .update_score(&f.stranger_referee(), f.game.id, SCORE)
            .await;

        assert_eq!(
            result,
            Err(MatchMutationError::Unauthorized(MatchAction::UpdateScore))
        );
        assert_eq!(f.store.game(f.game.id).score, Score::default());
        assert!(f.notifier.get_messages().is_empty());
    }

    #[tokio::test]
    async fn test_completed_match_rejects_updates() {
        let f = LiveFixture::new();
        f.store
            .transition_status(f.game.id, MatchStatus::Scheduled, MatchStatus::Completed)
            .await
            .unwrap();

        let result = use_case(&f)
            .update_score(&f.referee_actor(), f.game.id, SCORE)
            .await;

        assert_eq!(
            result,
            Err(MatchMutationError::InvalidTransition {
                status: MatchStatus::Completed,
                action: MatchAction::UpdateScore,
            })
        );
        assert!(f.notifier.get_messages().is_empty());
    }
}
