use sqlx::{Postgres, QueryBuilder};

use crate::{
    api::error,
    modules::user::{
        criteria::{Predicate, UserFilter},
        model::{CreatedUser, NewUserRecord, UpdateUserRecord},
        repository::UserRepository,
        schema::UserEntity,
    },
};

#[derive(Clone)]
pub struct UserRepositoryPg {
    pool: sqlx::PgPool,
}

impl UserRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryPg {
    async fn search(&self, filter: &UserFilter) -> Result<Vec<UserEntity>, error::SystemError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT users.* FROM users");

        // One join per custom-field predicate, each scoped to its field.
        let mut join = 0;
        for predicate in &filter.predicates {
            if let Predicate::CustomField { field_id, value } = predicate {
                join += 1;
                qb.push(format!(
                    " JOIN user_profile_data pfd{join} ON pfd{join}.user_id = users.id AND pfd{join}.field_id = "
                ));
                qb.push_bind(*field_id);
                qb.push(format!(" AND pfd{join}.value = "));
                qb.push_bind(value.clone());
            }
        }

        qb.push(" WHERE users.deleted_at IS NULL");
        for predicate in &filter.predicates {
            match predicate {
                Predicate::IdEquals(id) => {
                    qb.push(" AND users.id = ");
                    qb.push_bind(*id);
                }
                Predicate::Equals { field, value } => {
                    qb.push(format!(" AND users.{} = ", field.column()));
                    qb.push_bind(value.clone());
                }
                Predicate::Pattern { field, value } => {
                    qb.push(format!(" AND lower(users.{}) LIKE lower(", field.column()));
                    qb.push_bind(value.clone());
                    qb.push(")");
                }
                Predicate::CustomField { .. } => {}
            }
        }
        qb.push(" ORDER BY users.id ASC");

        let users = qb.build_query_as::<UserEntity>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            "SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn username_taken(
        &self,
        username: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, error::SystemError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE lower(username) = lower($1)
                AND deleted_at IS NULL
                AND ($2::bigint IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn email_taken(
        &self,
        email: &str,
        exclude_id: Option<i64>,
    ) -> Result<bool, error::SystemError> {
        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE lower(email) = lower($1)
                AND deleted_at IS NULL
                AND ($2::bigint IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn create_batch(
        &self,
        records: &[NewUserRecord],
    ) -> Result<Vec<CreatedUser>, error::SystemError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(records.len());

        for record in records {
            let u = &record.user;
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO users (
                    username, email, hash_password, auth, idnumber,
                    firstname, lastname, lang, calendartype, theme,
                    timezone, description, city, country, institution,
                    department, phone1, phone2, address, url, confirmed
                ) VALUES (
                    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, TRUE
                )
                RETURNING id
                "#,
            )
            .bind(&u.username)
            .bind(&u.email)
            .bind(&u.hash_password)
            .bind(&u.auth)
            .bind(&u.idnumber)
            .bind(&u.firstname)
            .bind(&u.lastname)
            .bind(&u.lang)
            .bind(&u.calendartype)
            .bind(&u.theme)
            .bind(&u.timezone)
            .bind(&u.description)
            .bind(&u.city)
            .bind(&u.country)
            .bind(&u.institution)
            .bind(&u.department)
            .bind(&u.phone1)
            .bind(&u.phone2)
            .bind(&u.address)
            .bind(&u.url)
            .fetch_one(&mut *tx)
            .await?;

            for field in &record.custom_fields {
                sqlx::query(
                    r#"
                    INSERT INTO user_profile_data (user_id, field_id, value)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (user_id, field_id) DO UPDATE SET value = EXCLUDED.value
                    "#,
                )
                .bind(id)
                .bind(field.field_id)
                .bind(&field.value)
                .execute(&mut *tx)
                .await?;
            }

            for preference in &record.preferences {
                sqlx::query(
                    r#"
                    INSERT INTO user_preferences (user_id, name, value)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (user_id, name) DO UPDATE SET value = EXCLUDED.value
                    "#,
                )
                .bind(id)
                .bind(&preference.name)
                .bind(&preference.value)
                .execute(&mut *tx)
                .await?;
            }

            created.push(CreatedUser { id, username: u.username.clone() });
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn update_batch(
        &self,
        records: &[UpdateUserRecord],
    ) -> Result<(), error::SystemError> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            let u = &record.user;
            let rows = sqlx::query(
                r#"
                UPDATE users
                SET
                    username      = COALESCE($2, username),
                    email         = COALESCE($3, email),
                    hash_password = COALESCE($4, hash_password),
                    auth          = COALESCE($5, auth),
                    idnumber      = COALESCE($6, idnumber),
                    firstname     = COALESCE($7, firstname),
                    lastname      = COALESCE($8, lastname),
                    lang          = COALESCE($9, lang),
                    calendartype  = COALESCE($10, calendartype),
                    theme         = COALESCE($11, theme),
                    timezone      = COALESCE($12, timezone),
                    description   = COALESCE($13, description),
                    city          = COALESCE($14, city),
                    country       = COALESCE($15, country),
                    institution   = COALESCE($16, institution),
                    department    = COALESCE($17, department),
                    phone1        = COALESCE($18, phone1),
                    phone2        = COALESCE($19, phone2),
                    address       = COALESCE($20, address),
                    url           = COALESCE($21, url),
                    updated_at    = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                "#,
            )
            .bind(u.id)
            .bind(&u.username)
            .bind(&u.email)
            .bind(&u.hash_password)
            .bind(&u.auth)
            .bind(&u.idnumber)
            .bind(&u.firstname)
            .bind(&u.lastname)
            .bind(&u.lang)
            .bind(&u.calendartype)
            .bind(&u.theme)
            .bind(&u.timezone)
            .bind(&u.description)
            .bind(&u.city)
            .bind(&u.country)
            .bind(&u.institution)
            .bind(&u.department)
            .bind(&u.phone1)
            .bind(&u.phone2)
            .bind(&u.address)
            .bind(&u.url)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if rows == 0 {
                return Err(error::SystemError::not_found(format!("User not found: {}", u.id)));
            }

            for field in &record.custom_fields {
                sqlx::query(
                    r#"
                    INSERT INTO user_profile_data (user_id, field_id, value)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (user_id, field_id) DO UPDATE SET value = EXCLUDED.value
                    "#,
                )
                .bind(u.id)
                .bind(field.field_id)
                .bind(&field.value)
                .execute(&mut *tx)
                .await?;
            }

            for preference in &record.preferences {
                sqlx::query(
                    r#"
                    INSERT INTO user_preferences (user_id, name, value)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (user_id, name) DO UPDATE SET value = EXCLUDED.value
                    "#,
                )
                .bind(u.id)
                .bind(&preference.name)
                .bind(&preference.value)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
