use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::domain::{ListenerId, MatchId};

/// Tracks which connections follow which match. Membership only decides who
/// receives topic-scoped broadcasts.
pub trait MatchTopicService {
    fn join(&self, match_id: MatchId, listener_id: ListenerId) -> bool;
    fn leave(&self, match_id: MatchId, listener_id: ListenerId) -> bool;
    fn leave_all(&self, listener_id: ListenerId);
    fn get_listeners(&self, match_id: MatchId) -> Vec<ListenerId>;
}

#[derive(Default)]
struct TopicRegistry {
    by_match: HashMap<MatchId, HashSet<ListenerId>>,
    by_listener: HashMap<ListenerId, HashSet<MatchId>>,
}

pub struct MatchTopicServiceImpl {
    registry: RwLock<TopicRegistry>,
}

impl MatchTopicServiceImpl {
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(TopicRegistry::default()),
        }
    }
}

impl MatchTopicService for MatchTopicServiceImpl {
    fn join(&self, match_id: MatchId, listener_id: ListenerId) -> bool {
        let mut registry = self.registry.write();
        registry
            .by_listener
            .entry(listener_id)
            .or_default()
            .insert(match_id);
        registry
            .by_match
            .entry(match_id)
            .or_default()
            .insert(listener_id)
    }

    fn leave(&self, match_id: MatchId, listener_id: ListenerId) -> bool {
        let mut registry = self.registry.write();
        let mut removed = false;
        if let Some(listeners) = registry.by_match.get_mut(&match_id) {
            removed = listeners.remove(&listener_id);
            if listeners.is_empty() {
                registry.by_match.remove(&match_id);
            }
        }
        if let Some(matches) = registry.by_listener.get_mut(&listener_id) {
            matches.remove(&match_id);
            if matches.is_empty() {
                registry.by_listener.remove(&listener_id);
            }
        }
        removed
    }

    fn leave_all(&self, listener_id: ListenerId) {
        let mut registry = self.registry.write();
        let Some(matches) = registry.by_listener.remove(&listener_id) else {
            return;
        };
        for match_id in matches {
            if let Some(listeners) = registry.by_match.get_mut(&match_id) {
                listeners.remove(&listener_id);
                if listeners.is_empty() {
                    registry.by_match.remove(&match_id);
                }
            }
        }
    }

    fn get_listeners(&self, match_id: MatchId) -> Vec<ListenerId> {
        let registry = self.registry.read();
        registry
            .by_match
            .get(&match_id)
            .map(|listeners| listeners.iter().copied().collect())
            .unwrap_or_default()
    }
}
