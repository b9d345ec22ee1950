use crate::{
    api::error,
    modules::profile_field::schema::{ProfileDataRow, ProfileFieldEntity},
};

#[async_trait::async_trait]
pub trait ProfileFieldRepository {
    async fn list_fields(&self) -> Result<Vec<ProfileFieldEntity>, error::SystemError>;
    async fn data_for_user(&self, user_id: i64)
        -> Result<Vec<ProfileDataRow>, error::SystemError>;
}
