use std::sync::Arc;

use crate::domain::{ListenerId, MatchId, topic::MatchTopicService};

/// Grouping of connections by match. Open to any authenticated connection.
pub trait MatchTopicUseCase {
    fn join_match(&self, listener_id: ListenerId, match_id: MatchId);
    fn leave_match(&self, listener_id: ListenerId, match_id: MatchId);
    fn handle_listener_disconnect(&self, listener_id: ListenerId);
}

pub struct MatchTopicUseCaseImpl<T: MatchTopicService> {
    topic_service: Arc<T>,
}

impl<T: MatchTopicService> MatchTopicUseCaseImpl<T> {
    pub fn new(topic_service: Arc<T>) -> Self {
        Self { topic_service }
    }
}

impl<T: MatchTopicService> MatchTopicUseCase for MatchTopicUseCaseImpl<T> {
    fn join_match(&self, listener_id: ListenerId, match_id: MatchId) {
        if self.topic_service.join(match_id, listener_id) {
            log::info!("Listener {} joined match {}", listener_id, match_id);
        }
    }

    fn leave_match(&self, listener_id: ListenerId, match_id: MatchId) {
        if self.topic_service.leave(match_id, listener_id) {
            log::info!("Listener {} left match {}", listener_id, match_id);
        }
    }

    fn handle_listener_disconnect(&self, listener_id: ListenerId) {
        self.topic_service.leave_all(listener_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::topic::MatchTopicServiceImpl;

    #[test]
    fn test_disconnect_leaves_every_topic() {
        let topics = Arc::new(MatchTopicServiceImpl::new());
        let use_case = MatchTopicUseCaseImpl::new(topics.clone());
        let listener = ListenerId::new();
        let m1 = MatchId::new();
        let m2 = MatchId::new();

        use_case.join_match(listener, m1);
        use_case.join_match(listener, m2);
        use_case.leave_match(listener, m1);
        assert!(topics.get_listeners(m1).is_empty());
        assert_eq!(topics.get_listeners(m2), vec![listener]);

        use_case.handle_listener_disconnect(listener);
        assert!(topics.get_listeners(m2).is_empty());
    }
}
