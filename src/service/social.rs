use uuid::Uuid;

use super::{Service, ServiceError, ServiceResult};
use crate::domain::{ExploreEntry, LeaderboardEntry, PublicUser};

impl Service {
    /// Follow `username`; following twice is a no-op
    pub async fn follow_user(&self, follower_id: Uuid, username: &str) -> ServiceResult<()> {
        let target = self.user_by_username(username).await?;
        if target.id == follower_id {
            return Err(ServiceError::CannotFollowSelf);
        }
        self.repo.follow(follower_id, target.id).await?;
        Ok(())
    }

    pub async fn unfollow_user(&self, follower_id: Uuid, username: &str) -> ServiceResult<()> {
        let target = self.user_by_username(username).await?;
        self.repo.unfollow(follower_id, target.id).await?;
        Ok(())
    }

    pub async fn followers(&self, username: &str) -> ServiceResult<Vec<PublicUser>> {
        let user = self.user_by_username(username).await?;
        Ok(self.repo.followers(user.id).await?)
    }

    pub async fn following(&self, username: &str) -> ServiceResult<Vec<PublicUser>> {
        let user = self.user_by_username(username).await?;
        Ok(self.repo.following(user.id).await?)
    }

    pub async fn leaderboard(&self) -> ServiceResult<Vec<LeaderboardEntry>> {
        Ok(self
            .repo
            .leaderboard(self.options.leaderboard_limit)
            .await?)
    }

    pub async fn explore(&self) -> ServiceResult<Vec<ExploreEntry>> {
        Ok(self.repo.explore(self.options.explore_limit).await?)
    }
}
