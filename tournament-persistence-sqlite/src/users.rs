use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};
use tournament_server_app::domain::{
    RepoError, UserId,
    user::{LeaderboardEntry, NewUser, Role, User, UserRepository, UserStats},
};

use crate::decode_error;

const USER_COLUMNS: &str = "id, email, full_name, role, wins, losses, points";

pub struct SqliteUserRepository {
    pool: Pool<Sqlite>,
}

impl SqliteUserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn user_from_row(row: &SqliteRow) -> sqlx::Result<User> {
        let id: String = row.try_get("id")?;
        let role: String = row.try_get("role")?;
        Ok(User {
            id: UserId::parse(&id).ok_or_else(|| decode_error("user id", &id))?,
            email: row.try_get("email")?,
            full_name: row.try_get("full_name")?,
            role: Role::parse(&role).ok_or_else(|| decode_error("role", &role))?,
            stats: UserStats {
                wins: row.try_get("wins")?,
                losses: row.try_get("losses")?,
                points: row.try_get("points")?,
            },
        })
    }

    fn leaderboard_entry_from_row(row: &SqliteRow) -> sqlx::Result<LeaderboardEntry> {
        let id: String = row.try_get("id")?;
        Ok(LeaderboardEntry {
            id: UserId::parse(&id).ok_or_else(|| decode_error("user id", &id))?,
            full_name: row.try_get("full_name")?,
            points: row.try_get("points")?,
            wins: row.try_get("wins")?,
            losses: row.try_get("losses")?,
        })
    }
}

#[async_trait::async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_or_create_user(&self, new_user: NewUser) -> Result<User, RepoError> {
        // An existing email keeps its row untouched, including the role.
        sqlx::query(
            "INSERT INTO users (id, email, full_name, provider_id, role) VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(email) DO NOTHING",
        )
        .bind(UserId::new().to_string())
        .bind(&new_user.email)
        .bind(&new_user.full_name)
        .bind(&new_user.provider_id)
        .bind(new_user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::StorageError(e.to_string()))?;

        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(&new_user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::StorageError(e.to_string()))?;

        Self::user_from_row(&row).map_err(|e| RepoError::StorageError(e.to_string()))
    }

    async fn get_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, RepoError> {
        let rows = sqlx::query(
            "SELECT id, full_name, points, wins, losses FROM users \
             ORDER BY points DESC, full_name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::StorageError(e.to_string()))?;

        rows.iter()
            .map(Self::leaderboard_entry_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(|e| RepoError::StorageError(e.to_string()))
    }
}

#[cfg(test)]
impl SqliteUserRepository {
    pub(crate) async fn get_user(
        &self,
        id: UserId,
    ) -> Result<User, tournament_server_app::domain::RepoRetrieveError> {
        use tournament_server_app::domain::RepoRetrieveError;

        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoRetrieveError::StorageError(e.to_string()))?
            .ok_or(RepoRetrieveError::NotFound)?;
        Self::user_from_row(&row).map_err(|e| RepoRetrieveError::StorageError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_pool;

    fn new_user(email: &str, name: &str, role: Role) -> NewUser {
        NewUser {
            email: email.to_string(),
            full_name: name.to_string(),
            provider_id: format!("google-{}", name),
            role,
        }
    }

    #[tokio::test]
    async fn test_find_or_create_keeps_first_role() {
        let repo = SqliteUserRepository::new(test_pool().await);

        let created = repo
            .find_or_create_user(new_user("r@example.com", "Rita", Role::Referee))
            .await
            .unwrap();
        assert_eq!(created.role, Role::Referee);
        assert_eq!(created.stats, UserStats::default());

        let again = repo
            .find_or_create_user(new_user("r@example.com", "Other", Role::Player))
            .await
            .unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(again.role, Role::Referee);
        assert_eq!(again.full_name, "Rita");

        assert_eq!(repo.get_user(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_get_unknown_user() {
        use tournament_server_app::domain::RepoRetrieveError;

        let repo = SqliteUserRepository::new(test_pool().await);
        assert!(matches!(
            repo.get_user(UserId::new()).await,
            Err(RepoRetrieveError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_leaderboard_order() {
        let pool = test_pool().await;
        let repo = SqliteUserRepository::new(pool.clone());
        let zed = repo
            .find_or_create_user(new_user("z@example.com", "Zed", Role::Player))
            .await
            .unwrap();
        let amy = repo
            .find_or_create_user(new_user("a@example.com", "Amy", Role::Player))
            .await
            .unwrap();
        let top = repo
            .find_or_create_user(new_user("t@example.com", "Top", Role::Player))
            .await
            .unwrap();
        sqlx::query("UPDATE users SET points = 9 WHERE id = ?")
            .bind(top.id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let board = repo.get_leaderboard().await.unwrap();
        let ids: Vec<_> = board.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![top.id, amy.id, zed.id]);
        assert_eq!(board[0].points, 9);
    }
}
