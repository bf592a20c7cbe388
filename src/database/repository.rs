use serde::Serialize;
use sqlx::{postgres::PgRow, Encode, FromRow, PgPool, Postgres, Type};

use crate::database::manager::DatabaseError;

/// Table-level reads and deletes shared by every entity service.
///
/// Table and column names are compile-time constants supplied by the
/// services, never caller input.
pub struct Repository<T> {
    table_name: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + Serialize,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn select_all(&self) -> Result<Vec<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} ORDER BY id", self.table_name);
        Ok(sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn select_by_id(&self, id: i64) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", self.table_name);
        Ok(sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    /// Rows where `column = value`, ordered by id
    pub async fn select_where<V>(&self, column: &'static str, value: V) -> Result<Vec<T>, DatabaseError>
    where
        V: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send,
    {
        let sql = format!("SELECT * FROM {} WHERE {} = $1 ORDER BY id", self.table_name, column);
        Ok(sqlx::query_as::<_, T>(&sql).bind(value).fetch_all(&self.pool).await?)
    }

    pub async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        let sql = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", self.table_name);
        let (exists,): (bool,) = sqlx::query_as(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(exists)
    }

    /// Delete by id; `NotFound` when nothing was removed
    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table_name);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("{} record {} not found", self.table_name, id)));
        }
        Ok(())
    }
}
