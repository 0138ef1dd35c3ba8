use crate::domain::{RepoError, UserId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    Player,
    Referee,
    Organizer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Player => "PLAYER",
            Role::Referee => "REFEREE",
            Role::Organizer => "ORGANIZER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PLAYER" => Some(Role::Player),
            "REFEREE" => Some(Role::Referee),
            "ORGANIZER" => Some(Role::Organizer),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UserStats {
    pub wins: i64,
    pub losses: i64,
    pub points: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub stats: UserStats,
}

/// Data for a user seen for the first time.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub provider_id: String,
    pub role: Role,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LeaderboardEntry {
    pub id: UserId,
    pub full_name: String,
    pub points: i64,
    pub wins: i64,
    pub losses: i64,
}

#[async_trait::async_trait]
pub trait UserRepository {
    /// Returns the user with the given email, creating it from `new_user` if
    /// none exists. An existing user keeps its stored role.
    async fn find_or_create_user(&self, new_user: NewUser) -> Result<User, RepoError>;
    /// All users, points descending.
    async fn get_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, RepoError>;
}
