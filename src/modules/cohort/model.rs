use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::error;
use crate::modules::cohort::schema::CohortEntity;

#[derive(Deserialize, Validate)]
pub struct CohortQueryModel {
    /// Comma-separated cohort ids; absent or empty means all cohorts.
    pub ids: Option<String>,
}

impl CohortQueryModel {
    pub fn id_list(&self) -> Result<Vec<i64>, error::SystemError> {
        let Some(raw) = self.ids.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>().map_err(|_| {
                    error::SystemError::bad_request(format!("Invalid cohort id: {part}"))
                })
            })
            .collect()
    }
}

#[derive(Serialize)]
pub struct CohortResponse {
    pub id: i64,
    pub name: String,
    pub idnumber: String,
    pub description: Option<String>,
    pub visible: bool,
}

impl From<CohortEntity> for CohortResponse {
    fn from(entity: CohortEntity) -> Self {
        CohortResponse {
            id: entity.id,
            name: entity.name,
            idnumber: entity.idnumber,
            description: entity.description,
            visible: entity.visible,
        }
    }
}
