use crate::modules::cohort::handle::*;
use actix_web::web::{ServiceConfig, scope};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(scope("/cohorts").service(get_cohorts));
}
