use std::sync::Arc;

use crate::{
    domain::{
        r#match::MatchRepository, permission::AssignedRefereePolicy,
        topic::MatchTopicServiceImpl, user::UserRepository,
    },
    ports::{
        identity::IdentityProviderPort, notification::ListenerNotificationPort,
        session::SessionTokenPort,
    },
    workflow::{
        auth::{
            authenticate::{AuthenticateUseCase, AuthenticateUseCaseImpl},
            sign_in::{SignInUseCase, SignInUseCaseImpl},
        },
        leaderboard::project::LeaderboardProjectionWorkflowImpl,
        live::{
            end::{EndMatchUseCase, EndMatchUseCaseImpl},
            score::{UpdateScoreUseCase, UpdateScoreUseCaseImpl},
            start::{StartMatchUseCase, StartMatchUseCaseImpl},
            topic::{MatchTopicUseCase, MatchTopicUseCaseImpl},
        },
        matches::list_live::{ListLiveMatchesUseCase, ListLiveMatchesUseCaseImpl},
    },
};

pub mod domain;
pub mod ports;
pub mod workflow;

#[cfg(test)]
mod testing;

pub struct Application {
    pub sign_in_use_case: Box<dyn SignInUseCase + Send + Sync + 'static>,
    pub authenticate_use_case: Box<dyn AuthenticateUseCase + Send + Sync + 'static>,

    pub match_topic_use_case: Box<dyn MatchTopicUseCase + Send + Sync + 'static>,
    pub match_start_use_case: Box<dyn StartMatchUseCase + Send + Sync + 'static>,
    pub match_update_score_use_case: Box<dyn UpdateScoreUseCase + Send + Sync + 'static>,
    pub match_end_use_case: Box<dyn EndMatchUseCase + Send + Sync + 'static>,
    pub match_list_live_use_case: Box<dyn ListLiveMatchesUseCase + Send + Sync + 'static>,
}

pub fn build_application<
    U: UserRepository + Send + Sync + 'static,
    M: MatchRepository + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
    S: SessionTokenPort + Send + Sync + 'static,
    I: IdentityProviderPort + Send + Sync + 'static,
>(
    user_repository: Arc<U>,
    match_repository: Arc<M>,
    listener_notification_port: Arc<L>,
    session_token_port: Arc<S>,
    identity_provider: Arc<I>,
) -> Application {
    let topic_service = Arc::new(MatchTopicServiceImpl::new());
    let capability_policy = Arc::new(AssignedRefereePolicy);

    let leaderboard_projection = Arc::new(LeaderboardProjectionWorkflowImpl::new(
        user_repository.clone(),
        listener_notification_port.clone(),
    ));

    Application {
        sign_in_use_case: Box::new(SignInUseCaseImpl::new(
            identity_provider,
            user_repository,
            session_token_port.clone(),
        )),
        authenticate_use_case: Box::new(AuthenticateUseCaseImpl::new(session_token_port)),

        match_topic_use_case: Box::new(MatchTopicUseCaseImpl::new(topic_service.clone())),
        match_start_use_case: Box::new(StartMatchUseCaseImpl::new(
            match_repository.clone(),
            capability_policy.clone(),
            topic_service.clone(),
            listener_notification_port.clone(),
        )),
        match_update_score_use_case: Box::new(UpdateScoreUseCaseImpl::new(
            match_repository.clone(),
            capability_policy.clone(),
            topic_service.clone(),
            listener_notification_port.clone(),
        )),
        match_end_use_case: Box::new(EndMatchUseCaseImpl::new(
            match_repository.clone(),
            capability_policy,
            topic_service,
            listener_notification_port,
            leaderboard_projection,
        )),
        match_list_live_use_case: Box::new(ListLiveMatchesUseCaseImpl::new(match_repository)),
    }
}
