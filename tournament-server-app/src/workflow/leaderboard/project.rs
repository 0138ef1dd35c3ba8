use std::sync::Arc;

use crate::{
    domain::user::UserRepository,
    ports::notification::{ListenerMessage, ListenerNotificationPort},
};

/// Recomputes the full standings and pushes them to every connection.
#[async_trait::async_trait]
pub trait LeaderboardProjectionWorkflow {
    async fn project_leaderboard(&self);
}

pub struct LeaderboardProjectionWorkflowImpl<U: UserRepository, L: ListenerNotificationPort> {
    user_repository: Arc<U>,
    listener_notification_port: Arc<L>,
}

impl<U: UserRepository, L: ListenerNotificationPort> LeaderboardProjectionWorkflowImpl<U, L> {
    pub fn new(user_repository: Arc<U>, listener_notification_port: Arc<L>) -> Self {
        Self {
            user_repository,
            listener_notification_port,
        }
    }
}

#[async_trait::async_trait]
impl<U: UserRepository + Send + Sync + 'static, L: ListenerNotificationPort + Send + Sync + 'static>
    LeaderboardProjectionWorkflow for LeaderboardProjectionWorkflowImpl<U, L>
{
    async fn project_leaderboard(&self) {
        let leaderboard = match self.user_repository.get_leaderboard().await {
            Ok(leaderboard) => leaderboard,
            Err(e) => {
                log::error!("Failed to compute leaderboard: {}", e);
                return;
            }
        };
        self.listener_notification_port
            .notify_all(ListenerMessage::LeaderboardUpdated { leaderboard });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::user::Role,
        testing::{InMemoryStore, MockListenerNotificationPort, Recipient},
    };

    #[tokio::test]
    async fn test_broadcasts_sorted_standings_to_all() {
        let store = InMemoryStore::new();
        let low = store.add_user("Low", Role::Player, 1);
        let high = store.add_user("High", Role::Player, 9);
        let mid = store.add_user("Mid", Role::Referee, 5);
        let notifier = Arc::new(MockListenerNotificationPort::default());

        LeaderboardProjectionWorkflowImpl::new(store, notifier.clone())
            .project_leaderboard()
            .await;

        let messages = notifier.get_messages();
        assert_eq!(messages.len(), 1);
        let (recipient, ListenerMessage::LeaderboardUpdated { leaderboard }) = &messages[0] else {
            panic!("expected leaderboard update, got {:?}", messages[0]);
        };
        assert_eq!(*recipient, Recipient::All);
        let ids: Vec<_> = leaderboard.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![high.id, mid.id, low.id]);
    }
}
