use uuid::Uuid;

use super::{Service, ServiceError, ServiceResult, SEARCH_LIMIT};
use crate::auth::{hash_password, verify_password, AuthError};
use crate::domain::{
    validate_email, validate_password, validate_username, ProfileData, PublicUser, Session, User,
};

const MIB: usize = 1024 * 1024;
const ALLOWED_AVATAR_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

impl Service {
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> ServiceResult<User> {
        let username = username.trim();
        let email = email.trim();
        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        let hashed = hash_password(password)?;
        let user = self.repo.create_user(username, email, &hashed).await?;

        tracing::info!(user_id = %user.id, "Created user {}", user.username);
        Ok(user)
    }

    /// Check credentials (username or email) and issue a token
    pub async fn login_user(&self, identifier: &str, password: &str) -> ServiceResult<Session> {
        let credentials = self
            .repo
            .get_user_credentials(identifier.trim())
            .await?
            .ok_or(ServiceError::InvalidCredentials)?;

        if !verify_password(password, &credentials.hashed_password)? {
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.tokens.issue(credentials.user.id)?;
        Ok(Session {
            token,
            user: credentials.user,
        })
    }

    /// Resolve a bearer token to the user id it was issued for.
    ///
    /// Tokens of deleted accounts are rejected as invalid.
    pub async fn authenticate(&self, token: &str) -> ServiceResult<Uuid> {
        let user_id = self.tokens.verify(token)?;
        match self.repo.get_user_by_id(user_id).await? {
            Some(_) => Ok(user_id),
            None => Err(AuthError::InvalidToken.into()),
        }
    }

    pub async fn get_user(&self, user_id: Uuid) -> ServiceResult<User> {
        self.repo
            .get_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    pub(crate) async fn user_by_username(&self, username: &str) -> ServiceResult<User> {
        self.repo
            .get_user_by_username(username)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    /// Everything a profile page shows, as seen by `viewer`
    pub async fn get_profile_data(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> ServiceResult<ProfileData> {
        let user = self.user_by_username(username).await?;
        let is_owner = viewer == Some(user.id);

        let follow_status = async {
            match viewer {
                Some(viewer_id) if viewer_id != user.id => {
                    self.repo.is_following(viewer_id, user.id).await
                }
                _ => Ok(false),
            }
        };

        let (habits, followers_count, following_count, is_following) = tokio::try_join!(
            self.repo.habits_with_logs(user.id),
            self.repo.follower_count(user.id),
            self.repo.following_count(user.id),
            follow_status,
        )?;

        Ok(ProfileData {
            user,
            habits,
            is_owner,
            followers_count,
            following_count,
            is_following,
        })
    }

    pub async fn search_users(&self, query: &str) -> ServiceResult<Vec<PublicUser>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.repo.search_users(query, SEARCH_LIMIT).await?)
    }

    /// Replace a user's avatar with an uploaded JPEG or PNG.
    ///
    /// The new file is removed again if the database update fails; the
    /// previous file is removed afterwards on a best-effort basis.
    pub async fn update_user_avatar(&self, user_id: Uuid, data: &[u8]) -> ServiceResult<String> {
        let limit = self.options.max_avatar_bytes;
        if data.len() > limit {
            return Err(ServiceError::FileTooLarge {
                limit_mb: limit.div_ceil(MIB),
            });
        }

        let kind = infer::get(data).ok_or_else(|| {
            ServiceError::UnsupportedFileType("application/octet-stream".to_string())
        })?;
        if !ALLOWED_AVATAR_TYPES.contains(&kind.mime_type()) {
            return Err(ServiceError::UnsupportedFileType(kind.mime_type().to_string()));
        }

        let user = self.get_user(user_id).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), kind.extension());
        let public_url = self.storage.save(&file_name, data).await?;

        if let Err(e) = self.repo.set_user_avatar(user_id, Some(&public_url)).await {
            if let Err(cleanup) = self.storage.delete(&public_url).await {
                tracing::warn!("Failed to remove new avatar {}: {}", public_url, cleanup);
            }
            return Err(e.into());
        }

        if let Some(old) = user.avatar_url.filter(|old| !old.is_empty() && *old != public_url) {
            if let Err(e) = self.storage.delete(&old).await {
                tracing::warn!("Failed to delete old avatar file {}: {}", old, e);
            }
        }

        tracing::info!(user_id = %user_id, "Updated avatar to {}", public_url);
        Ok(public_url)
    }

    /// Delete an account with everything it owns
    pub async fn delete_user(&self, user_id: Uuid) -> ServiceResult<()> {
        let user = self.get_user(user_id).await?;
        self.repo.delete_user(user_id).await?;

        if let Some(avatar) = user.avatar_url {
            if let Err(e) = self.storage.delete(&avatar).await {
                tracing::warn!("Failed to delete avatar of removed user: {}", e);
            }
        }

        tracing::info!(user_id = %user_id, "Deleted user {}", user.username);
        Ok(())
    }
}
