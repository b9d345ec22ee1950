use crate::{api::error, modules::cohort::schema::CohortEntity};

#[async_trait::async_trait]
pub trait CohortRepository {
    async fn find_all(&self) -> Result<Vec<CohortEntity>, error::SystemError>;
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<CohortEntity>, error::SystemError>;
}
