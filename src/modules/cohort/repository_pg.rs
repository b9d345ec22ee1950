use crate::{
    api::error,
    modules::cohort::{repository::CohortRepository, schema::CohortEntity},
};

#[derive(Clone)]
pub struct CohortRepositoryPg {
    pool: sqlx::PgPool,
}

impl CohortRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CohortRepository for CohortRepositoryPg {
    async fn find_all(&self) -> Result<Vec<CohortEntity>, error::SystemError> {
        let cohorts =
            sqlx::query_as::<_, CohortEntity>("SELECT * FROM cohorts ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(cohorts)
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<CohortEntity>, error::SystemError> {
        let cohorts = sqlx::query_as::<_, CohortEntity>(
            "SELECT * FROM cohorts WHERE id = ANY($1) ORDER BY id ASC",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(cohorts)
    }
}
