use crate::{
    api::error,
    modules::profile_field::{
        repository::ProfileFieldRepository,
        schema::{ProfileDataRow, ProfileFieldEntity},
    },
};

#[derive(Clone)]
pub struct ProfileFieldRepositoryPg {
    pool: sqlx::PgPool,
}

impl ProfileFieldRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProfileFieldRepository for ProfileFieldRepositoryPg {
    async fn list_fields(&self) -> Result<Vec<ProfileFieldEntity>, error::SystemError> {
        let fields = sqlx::query_as::<_, ProfileFieldEntity>(
            "SELECT id, shortname, name FROM user_profile_fields ORDER BY shortname",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(fields)
    }

    async fn data_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<ProfileDataRow>, error::SystemError> {
        let rows = sqlx::query_as::<_, ProfileDataRow>(
            r#"
            SELECT f.shortname, d.value
            FROM user_profile_data d
            JOIN user_profile_fields f ON f.id = d.field_id
            WHERE d.user_id = $1
            ORDER BY f.shortname
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
