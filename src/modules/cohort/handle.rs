use actix_web::{get, web, HttpRequest};

use crate::modules::cohort::model::{CohortQueryModel, CohortResponse};
use crate::modules::cohort::service::CohortService;
use crate::utils::ValidatedQuery;
use crate::{
    api::{error, success},
    middlewares::get_claims,
};

#[get("")]
pub async fn get_cohorts(
    cohort_service: web::Data<CohortService>,
    req: HttpRequest,
    query: ValidatedQuery<CohortQueryModel>,
) -> Result<success::Success<Vec<CohortResponse>>, error::Error> {
    let claims = get_claims(&req)?;
    let ids = query.0.id_list()?;
    let cohorts = cohort_service.get_cohorts(&claims, &ids).await?;
    Ok(success::Success::ok(Some(cohorts)).message("Cohorts retrieved successfully"))
}
