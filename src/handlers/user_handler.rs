//! Profile Handler
//!
//! Syncs the caller's profile on login and reads it back.

use sqlx::PgPool;

use crate::domain::{OperationContext, Validator};
use crate::error::AppError;
use crate::repository::{SyncOutcome, User, UserRepository};

use super::{SyncProfileCommand, SyncProfileResult};

/// Handler for profile sync and lookup
pub struct ProfileHandler {
    users: UserRepository,
}

impl ProfileHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Execute the sync command
    pub async fn sync(
        &self,
        command: SyncProfileCommand,
        context: &OperationContext,
    ) -> Result<SyncProfileResult, AppError> {
        let mut v = Validator::new();
        let name = v.optional(command.name.as_deref(), |v, n| v.name("name", n, "Name"));
        let name = v.finish(|| name)?;

        let picture = command
            .picture
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let outcome = self
            .users
            .sync_profile(context.user_id, name.as_deref(), picture)
            .await?
            .ok_or(AppError::UserNotFound)?;

        Ok(match outcome {
            SyncOutcome::Created(user) => {
                tracing::info!(
                    correlation_id = ?context.correlation_id,
                    user_id = %user.id,
                    "User profile created"
                );
                SyncProfileResult {
                    user,
                    created: true,
                }
            }
            SyncOutcome::Synced(user) => {
                tracing::debug!(
                    correlation_id = ?context.correlation_id,
                    user_id = %user.id,
                    "User synced"
                );
                SyncProfileResult {
                    user,
                    created: false,
                }
            }
        })
    }

    pub async fn me(&self, context: &OperationContext) -> Result<User, AppError> {
        self.users
            .find(context.user_id)
            .await?
            .ok_or(AppError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_profile_command() {
        let cmd = SyncProfileCommand::new()
            .with_name("Priya".to_string())
            .with_picture("https://example.com/p.png".to_string());

        assert_eq!(cmd.name, Some("Priya".to_string()));
        assert_eq!(cmd.picture.as_deref(), Some("https://example.com/p.png"));
    }
}
