use crate::{
    api::error,
    modules::user::criteria::UserFilter,
    modules::user::model::{CreatedUser, NewUserRecord, UpdateUserRecord},
    modules::user::schema::UserEntity,
};

#[async_trait::async_trait]
pub trait UserRepository {
    /// Run a criteria filter against the account store. Soft-deleted
    /// accounts are excluded; results come back ordered by id ascending.
    async fn search(&self, filter: &UserFilter) -> Result<Vec<UserEntity>, error::SystemError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, error::SystemError>;
    async fn username_taken(
        &self,
        username: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, error::SystemError>;
    async fn email_taken(
        &self,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, error::SystemError>;

    /// Create a batch of accounts in one transaction, including their
    /// profile data and preferences.
    async fn create_batch(
        &self,
        records: &[NewUserRecord],
    ) -> Result<Vec<CreatedUser>, error::SystemError>;

    /// Apply a batch of partial updates in one transaction.
    async fn update_batch(&self, records: &[UpdateUserRecord])
        -> Result<(), error::SystemError>;
}
