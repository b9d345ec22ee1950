use sqlx::prelude::FromRow;

/// Site-configured extra account attribute, addressed by short name.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileFieldEntity {
    pub id: i64,
    pub shortname: String,
    pub name: String,
}

/// One stored value joined back to its field's short name.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileDataRow {
    pub shortname: String,
    pub value: String,
}
