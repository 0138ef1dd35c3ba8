use sqlx::{Pool, Row, Sqlite, sqlite::SqliteRow};
use tournament_server_app::domain::{
    MatchId, RepoError, RepoRetrieveError, RepoUpdateError, TournamentId, UserId,
    r#match::{LiveMatch, Match, MatchCompletion, MatchRepository, MatchStatus, Score},
};

use crate::decode_error;

pub struct SqliteMatchRepository {
    pool: Pool<Sqlite>,
}

impl SqliteMatchRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn create_tournament(&self, name: &str) -> Result<TournamentId, RepoError> {
        let id = TournamentId(uuid::Uuid::new_v4());
        sqlx::query("INSERT INTO tournaments (id, name) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::StorageError(e.to_string()))?;
        Ok(id)
    }

    pub async fn create_match(
        &self,
        tournament_id: TournamentId,
        player_a_id: UserId,
        player_b_id: UserId,
        referee_id: Option<UserId>,
    ) -> Result<MatchId, RepoError> {
        let id = MatchId::new();
        sqlx::query(
            "INSERT INTO matches (id, tournament_id, player_a_id, player_b_id, referee_id) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(tournament_id.to_string())
        .bind(player_a_id.to_string())
        .bind(player_b_id.to_string())
        .bind(referee_id.map(|r| r.to_string()))
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::StorageError(e.to_string()))?;
        Ok(id)
    }

    fn match_from_row(row: &SqliteRow) -> sqlx::Result<Match> {
        let id: String = row.try_get("id")?;
        let tournament_id: String = row.try_get("tournament_id")?;
        let status: String = row.try_get("status")?;
        let referee_id: Option<String> = row.try_get("referee_id")?;
        let winner_id: Option<String> = row.try_get("winner_id")?;
        Ok(Match {
            id: MatchId::parse(&id).ok_or_else(|| decode_error("match id", &id))?,
            tournament_id: uuid::Uuid::parse_str(&tournament_id)
                .map(TournamentId)
                .map_err(|_| decode_error("tournament id", &tournament_id))?,
            player_a_id: user_id_column(row, "player_a_id")?,
            player_b_id: user_id_column(row, "player_b_id")?,
            referee_id: referee_id.map(|r| parse_user_id(&r)).transpose()?,
            status: MatchStatus::parse(&status).ok_or_else(|| decode_error("status", &status))?,
            score: score_columns(row)?,
            winner_id: winner_id.map(|w| parse_user_id(&w)).transpose()?,
        })
    }

    fn live_match_from_row(row: &SqliteRow) -> sqlx::Result<LiveMatch> {
        let id: String = row.try_get("id")?;
        Ok(LiveMatch {
            id: MatchId::parse(&id).ok_or_else(|| decode_error("match id", &id))?,
            player_a_name: row.try_get("player_a_name")?,
            player_b_name: row.try_get("player_b_name")?,
            score: score_columns(row)?,
            tournament_name: row.try_get("tournament_name")?,
        })
    }

    /// Tells a missing match apart from one whose guard failed.
    async fn missing_or_conflict(&self, id: MatchId) -> RepoUpdateError {
        match sqlx::query("SELECT 1 FROM matches WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
        {
            Ok(Some(_)) => RepoUpdateError::Conflict,
            Ok(None) => RepoUpdateError::NotFound,
            Err(e) => RepoUpdateError::StorageError(e.to_string()),
        }
    }
}

fn parse_user_id(value: &str) -> sqlx::Result<UserId> {
    UserId::parse(value).ok_or_else(|| decode_error("user id", value))
}

fn user_id_column(row: &SqliteRow, column: &str) -> sqlx::Result<UserId> {
    let value: String = row.try_get(column)?;
    parse_user_id(&value)
}

fn score_columns(row: &SqliteRow) -> sqlx::Result<Score> {
    let score_a: i64 = row.try_get("score_a")?;
    let score_b: i64 = row.try_get("score_b")?;
    Ok(Score {
        player_a: u32::try_from(score_a)
            .map_err(|_| decode_error("score", &score_a.to_string()))?,
        player_b: u32::try_from(score_b)
            .map_err(|_| decode_error("score", &score_b.to_string()))?,
    })
}

#[async_trait::async_trait]
impl MatchRepository for SqliteMatchRepository {
    async fn get_match(&self, id: MatchId) -> Result<Match, RepoRetrieveError> {
        let row = sqlx::query(
            "SELECT id, tournament_id, player_a_id, player_b_id, referee_id, status, \
             score_a, score_b, winner_id FROM matches WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoRetrieveError::StorageError(e.to_string()))?
        .ok_or(RepoRetrieveError::NotFound)?;
        Self::match_from_row(&row).map_err(|e| RepoRetrieveError::StorageError(e.to_string()))
    }

    async fn transition_status(
        &self,
        id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    ) -> Result<(), RepoUpdateError> {
        let result = sqlx::query("UPDATE matches SET status = ? WHERE id = ? AND status = ?")
            .bind(to.as_str())
            .bind(id.to_string())
            .bind(from.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoUpdateError::StorageError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(self.missing_or_conflict(id).await);
        }
        Ok(())
    }

    async fn update_score(&self, id: MatchId, score: Score) -> Result<(), RepoUpdateError> {
        let result = sqlx::query(
            "UPDATE matches SET score_a = ?, score_b = ? WHERE id = ? AND status != ?",
        )
        .bind(i64::from(score.player_a))
        .bind(i64::from(score.player_b))
        .bind(id.to_string())
        .bind(MatchStatus::Completed.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoUpdateError::StorageError(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(self.missing_or_conflict(id).await);
        }
        Ok(())
    }

    async fn complete_match(&self, completion: MatchCompletion) -> Result<(), RepoUpdateError> {
        let storage = |e: sqlx::Error| RepoUpdateError::StorageError(e.to_string());
        let mut tx = self.pool.begin().await.map_err(storage)?;

        let closed = sqlx::query(
            "UPDATE matches SET status = ?, winner_id = ? WHERE id = ? AND status != ?",
        )
        .bind(MatchStatus::Completed.as_str())
        .bind(completion.winner_id.to_string())
        .bind(completion.match_id.to_string())
        .bind(MatchStatus::Completed.as_str())
        .execute(&mut *tx)
        .await
        .map_err(storage)?;
        if closed.rows_affected() == 0 {
            tx.rollback().await.map_err(storage)?;
            return Err(self.missing_or_conflict(completion.match_id).await);
        }

        let winner = sqlx::query("UPDATE users SET wins = wins + 1, points = points + ? WHERE id = ?")
            .bind(completion.winner_points)
            .bind(completion.winner_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        let loser = sqlx::query("UPDATE users SET losses = losses + 1 WHERE id = ?")
            .bind(completion.loser_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(storage)?;
        if winner.rows_affected() == 0 || loser.rows_affected() == 0 {
            tx.rollback().await.map_err(storage)?;
            return Err(RepoUpdateError::NotFound);
        }

        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    async fn list_live_matches(&self) -> Result<Vec<LiveMatch>, RepoError> {
        let rows = sqlx::query(
            "SELECT m.id, m.score_a, m.score_b, \
                    pa.full_name AS player_a_name, \
                    pb.full_name AS player_b_name, \
                    t.name AS tournament_name \
             FROM matches m \
             JOIN users pa ON pa.id = m.player_a_id \
             JOIN users pb ON pb.id = m.player_b_id \
             JOIN tournaments t ON t.id = m.tournament_id \
             WHERE m.status = ? \
             ORDER BY m.created_at DESC, m.rowid DESC",
        )
        .bind(MatchStatus::InProgress.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::StorageError(e.to_string()))?;

        rows.iter()
            .map(Self::live_match_from_row)
            .collect::<sqlx::Result<Vec<_>>>()
            .map_err(|e| RepoError::StorageError(e.to_string()))
    }
}
