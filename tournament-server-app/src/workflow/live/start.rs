use std::sync::Arc;

use crate::{
    domain::{
        MatchId,
        r#match::{MatchRepository, MatchStatus},
        permission::{Actor, MatchAction, MatchCapabilityPolicy},
        topic::MatchTopicService,
    },
    ports::notification::{ListenerMessage, ListenerNotificationPort},
    workflow::live::{MatchMutationError, load_authorized},
};

#[async_trait::async_trait]
pub trait StartMatchUseCase {
    async fn start_match(&self, actor: &Actor, match_id: MatchId)
    -> Result<(), MatchMutationError>;
}

pub struct StartMatchUseCaseImpl<
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
    StartMatchUseCaseImpl<M, P, T, L>
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
> StartMatchUseCase for StartMatchUseCaseImpl<M, P, T, L>
{
    async fn start_match(
        &self,
        actor: &Actor,
        match_id: MatchId,
    ) -> Result<(), MatchMutationError> {
        let game = load_authorized(
            self.match_repository.as_ref(),
            self.capability_policy.as_ref(),
            actor,
            match_id,
            MatchAction::Start,
        )
        .await?;

        if game.status != MatchStatus::Scheduled {
            return Err(MatchMutationError::InvalidTransition {
                status: game.status,
                action: MatchAction::Start,
            });
        }

        self.match_repository
            .transition_status(match_id, MatchStatus::Scheduled, MatchStatus::InProgress)
            .await?;
        log::info!("Match {} started by referee {}", match_id, actor.user_id);

        let listeners = self.topic_service.get_listeners(match_id);
        self.listener_notification_port
            .notify_listeners(&listeners, ListenerMessage::MatchStarted { match_id });
        Ok(())
    }
}
