/// Value column of the `local_storage` key/value table.
#[derive(Debug, sqlx::FromRow)]
pub struct LocalStorageRow {
    pub value: String,
}
