use std::sync::Arc;

use crate::api::error;
use crate::modules::cohort::{model::CohortResponse, repository::CohortRepository};
use crate::modules::user::schema::UserRole;
use crate::utils::Claims;

#[derive(Clone)]
pub struct CohortService {
    repo: Arc<dyn CohortRepository + Send + Sync>,
}

impl CohortService {
    pub fn with_dependencies(repo: Arc<dyn CohortRepository + Send + Sync>) -> Self {
        CohortService { repo }
    }

    /// Retrieve cohorts by id, or all of them for an empty list. Hidden
    /// cohorts are admin-only; a hidden cohort in the requested set fails
    /// the whole call.
    pub async fn get_cohorts(
        &self,
        actor: &Claims,
        ids: &[i64],
    ) -> Result<Vec<CohortResponse>, error::SystemError> {
        let cohorts = if ids.is_empty() {
            self.repo.find_all().await?
        } else {
            self.repo.find_by_ids(ids).await?
        };

        for cohort in &cohorts {
            if !cohort.visible && actor.role != UserRole::Admin {
                return Err(error::SystemError::forbidden(format!(
                    "No permission to view cohort {}",
                    cohort.id
                )));
            }
        }

        Ok(cohorts.into_iter().map(CohortResponse::from).collect())
    }
}
