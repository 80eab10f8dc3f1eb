use uuid::Uuid;

use crate::{AuthUser, NewUser, Result, UserChanges};

/// Administrative access to the account store.
///
/// Every call goes straight to the backend; callers re-list after a write
/// instead of patching local state.
#[allow(async_fn_in_trait)]
pub trait UserDirectory {
    async fn list_users(&self) -> Result<Vec<AuthUser>>;

    async fn create_user(&self, new_user: &NewUser) -> Result<AuthUser>;

    async fn update_user(&self, user_id: Uuid, changes: &UserChanges) -> Result<AuthUser>;

    async fn delete_user(&self, user_id: Uuid) -> Result<()>;
}
