//! UseCase: ユーザー登録

use std::sync::Arc;

use crate::domain::{DisplayName, SessionRepository, User};

use super::SessionCommandError;

/// ユーザー登録のユースケース
///
/// セッションに属さないのでロックもイベントもない。
pub struct RegisterUserUseCase {
    repository: Arc<dyn SessionRepository>,
}

impl RegisterUserUseCase {
    pub fn new(repository: Arc<dyn SessionRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, display_name: DisplayName) -> Result<User, SessionCommandError> {
        let user = self.repository.create_user(display_name).await?;
        tracing::info!("User '{}' registered as '{}'", user.id, user.display_name);
        Ok(user)
    }
}
