use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::Mutex;

use crate::{
    domain::{
        ListenerId, MatchId, RepoError, RepoRetrieveError, RepoUpdateError, TournamentId, UserId,
        r#match::{LiveMatch, Match, MatchCompletion, MatchRepository, MatchStatus, Score},
        user::{LeaderboardEntry, NewUser, Role, User, UserRepository, UserStats},
    },
    ports::{
        notification::{ListenerMessage, ListenerNotificationPort},
        session::{SessionClaims, SessionTokenError, SessionTokenPort},
    },
};

#[derive(Clone, Debug, PartialEq)]
pub enum Recipient {
    Listener(ListenerId),
    All,
}

#[derive(Clone, Default)]
pub struct MockListenerNotificationPort {
    pub sent_messages: Arc<Mutex<Vec<(Recipient, ListenerMessage)>>>,
}

impl MockListenerNotificationPort {
    pub fn get_messages(&self) -> Vec<(Recipient, ListenerMessage)> {
        self.sent_messages.lock().clone()
    }

    pub fn messages_for(&self, listener: ListenerId) -> Vec<ListenerMessage> {
        self.get_messages()
            .into_iter()
            .filter(|(r, _)| *r == Recipient::Listener(listener) || *r == Recipient::All)
            .map(|(_, m)| m)
            .collect()
    }
}

impl ListenerNotificationPort for MockListenerNotificationPort {
    fn notify_listeners(&self, listeners: &[ListenerId], message: ListenerMessage) {
        let mut sent = self.sent_messages.lock();
        for listener in listeners {
            sent.push((Recipient::Listener(*listener), message.clone()));
        }
    }

    fn notify_all(&self, message: ListenerMessage) {
        self.sent_messages.lock().push((Recipient::All, message));
    }
}

/// Users and matches kept in memory. `fail_writes` makes every mutation
/// return a storage error.
#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<HashMap<UserId, User>>,
    matches: Mutex<HashMap<MatchId, Match>>,
    pub fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_user(&self, full_name: &str, role: Role, points: i64) -> User {
        let user = User {
            id: UserId::new(),
            email: format!("{}@example.com", full_name.to_lowercase()),
            full_name: full_name.to_string(),
            role,
            stats: UserStats {
                wins: 0,
                losses: 0,
                points,
            },
        };
        self.users.lock().insert(user.id, user.clone());
        user
    }

    pub fn add_match(&self, player_a: UserId, player_b: UserId, referee: Option<UserId>) -> Match {
        let game = Match {
            id: MatchId::new(),
            tournament_id: TournamentId(uuid::Uuid::new_v4()),
            player_a_id: player_a,
            player_b_id: player_b,
            referee_id: referee,
            status: MatchStatus::Scheduled,
            score: Score::default(),
            winner_id: None,
        };
        self.matches.lock().insert(game.id, game.clone());
        game
    }

    pub fn user(&self, id: UserId) -> User {
        self.users.lock()[&id].clone()
    }

    pub fn all_users(&self) -> Vec<User> {
        self.users.lock().values().cloned().collect()
    }

    pub fn game(&self, id: MatchId) -> Match {
        self.matches.lock()[&id].clone()
    }

    fn check_writable(&self) -> Result<(), RepoUpdateError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoUpdateError::StorageError("disk on fire".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryStore {
    async fn find_or_create_user(&self, new_user: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.lock();
        if let Some(existing) = users.values().find(|u| u.email == new_user.email) {
            return Ok(existing.clone());
        }
        let user = User {
            id: UserId::new(),
            email: new_user.email,
            full_name: new_user.full_name,
            role: new_user.role,
            stats: UserStats::default(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, RepoError> {
        let mut users: Vec<User> = self.users.lock().values().cloned().collect();
        users.sort_by(|a, b| {
            b.stats
                .points
                .cmp(&a.stats.points)
                .then_with(|| a.full_name.cmp(&b.full_name))
        });
        Ok(users
            .into_iter()
            .map(|u| LeaderboardEntry {
                id: u.id,
                full_name: u.full_name,
                points: u.stats.points,
                wins: u.stats.wins,
                losses: u.stats.losses,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl MatchRepository for InMemoryStore {
    async fn get_match(&self, id: MatchId) -> Result<Match, RepoRetrieveError> {
        self.matches
            .lock()
            .get(&id)
            .cloned()
            .ok_or(RepoRetrieveError::NotFound)
    }

    async fn transition_status(
        &self,
        id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> Result<(), RepoUpdateError> {
        self.check_writable()?;
        let mut matches = self.matches.lock();
        let game = matches.get_mut(&id).ok_or(RepoUpdateError::NotFound)?;
        if game.status != from {
            return Err(RepoUpdateError::Conflict);
        }
        game.status = to;
        Ok(())
    }

    async fn update_score(&self, id: MatchId, score: Score) -> Result<(), RepoUpdateError> {
        self.check_writable()?;
        let mut matches = self.matches.lock();
        let game = matches.get_mut(&id).ok_or(RepoUpdateError::NotFound)?;
        if game.status == MatchStatus::Completed {
            return Err(RepoUpdateError::Conflict);
        }
        game.score = score;
        Ok(())
    }

    async fn complete_match(&self, completion: MatchCompletion) -> Result<(), RepoUpdateError> {
        self.check_writable()?;
        let mut matches = self.matches.lock();
        let game = matches
            .get_mut(&completion.match_id)
            .ok_or(RepoUpdateError::NotFound)?;
        if game.status == MatchStatus::Completed {
            return Err(RepoUpdateError::Conflict);
        }
        game.status = MatchStatus::Completed;
        game.winner_id = Some(completion.winner_id);

        let mut users = self.users.lock();
        let winner = users
            .get_mut(&completion.winner_id)
            .ok_or(RepoUpdateError::NotFound)?;
        winner.stats.wins += 1;
        winner.stats.points += completion.winner_points;
        let loser = users
            .get_mut(&completion.loser_id)
            .ok_or(RepoUpdateError::NotFound)?;
        loser.stats.losses += 1;
        Ok(())
    }

    async fn list_live_matches(&self) -> Result<Vec<LiveMatch>, RepoError> {
        let users = self.users.lock();
        let name = |id: &UserId| {
            users
                .get(id)
                .map(|u| u.full_name.clone())
                .unwrap_or_default()
        };
        Ok(self
            .matches
            .lock()
            .values()
            .filter(|m| m.status == MatchStatus::InProgress)
            .map(|m| LiveMatch {
                id: m.id,
                player_a_name: name(&m.player_a_id),
                player_b_name: name(&m.player_b_id),
                score: m.score,
                tournament_name: "Test Cup".to_string(),
            })
            .collect())
    }
}

/// Encodes claims as plain text. Only for tests.
pub struct PlainSessionTokenPort;

impl SessionTokenPort for PlainSessionTokenPort {
    fn issue_token(&self, claims: &SessionClaims) -> Result<String, SessionTokenError> {
        Ok(format!(
            "{}|{}|{}",
            claims.user_id, claims.email, claims.role
        ))
    }

    fn verify_token(&self, token: &str) -> Result<SessionClaims, SessionTokenError> {
        let parts: Vec<&str> = token.split('|').collect();
        let [id, email, role] = parts.as_slice() else {
            return Err(SessionTokenError::Invalid);
        };
        Ok(SessionClaims {
            user_id: UserId::parse(id).ok_or(SessionTokenError::Invalid)?,
            email: email.to_string(),
            role: Role::parse(role).ok_or(SessionTokenError::Invalid)?,
        })
    }
}
