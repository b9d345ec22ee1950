use actix_web::{patch, post, web, HttpRequest};

use crate::modules::user::model::{
    CreateUsersModel, CreatedUser, SearchUsersModel, SearchUsersResponse, UpdateUsersModel,
};
use crate::modules::user::service::UserService;
use crate::utils::ValidatedJson;
use crate::{
    api::{error, success},
    middlewares::get_claims,
};

#[post("/search")]
pub async fn search_users(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    body: ValidatedJson<SearchUsersModel>,
) -> Result<success::Success<SearchUsersResponse>, error::Error> {
    let claims = get_claims(&req)?;
    let response = user_service.search_users(&claims, body.0.criteria).await?;
    Ok(success::Success::ok(Some(response)).message("Users retrieved successfully"))
}

#[post("")]
pub async fn create_users(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    body: ValidatedJson<CreateUsersModel>,
) -> Result<success::Success<Vec<CreatedUser>>, error::Error> {
    let claims = get_claims(&req)?;
    let created = user_service.create_users(&claims, body.0.users).await?;
    Ok(success::Success::created(Some(created)).message("Users created successfully"))
}

#[patch("")]
pub async fn update_users(
    user_service: web::Data<UserService>,
    req: HttpRequest,
    body: ValidatedJson<UpdateUsersModel>,
) -> Result<success::Success<()>, error::Error> {
    let claims = get_claims(&req)?;
    user_service.update_users(&claims, body.0.users).await?;
    Ok(success::Success::no_content())
}
