use std::sync::Arc;

use crate::domain::{
    RepoError,
    r#match::{LiveMatch, MatchRepository},
};

#[async_trait::async_trait]
pub trait ListLiveMatchesUseCase {
    async fn list_live_matches(&self) -> Result<Vec<LiveMatch>, RepoError>;
}

pub struct ListLiveMatchesUseCaseImpl<M: MatchRepository> {
    match_repository: Arc<M>,
}

impl<M: MatchRepository> ListLiveMatchesUseCaseImpl<M> {
    pub fn new(match_repository: Arc<M>) -> Self {
        Self { match_repository }
    }
}

#[async_trait::async_trait]
impl<M: MatchRepository + Send + Sync + 'static> ListLiveMatchesUseCase
    for ListLiveMatchesUseCaseImpl<M>
{
    async fn list_live_matches(&self) -> Result<Vec<LiveMatch>, RepoError> {
        self.match_repository.list_live_matches().await
    }
}
