use sqlx::PgPool;

use super::{require_text, ServiceError};
use crate::database::manager::DatabaseManager;
use crate::database::models::{Covenant, CovenantOwner, CovenantOwnerInput};
use crate::database::Repository;

pub struct OwnerService {
    repo: Repository<CovenantOwner>,
    covenants: Repository<Covenant>,
}

impl OwnerService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool: PgPool = DatabaseManager::main_pool().await?;
        Ok(Self {
            repo: Repository::new("covenant_owners", pool.clone()),
            covenants: Repository::new("covenants", pool),
        })
    }

    pub async fn for_covenant(&self, covenant_id: i64) -> Result<Vec<CovenantOwner>, ServiceError> {
        if !self.covenants.exists(covenant_id).await? {
            return Err(ServiceError::not_found("Covenant", covenant_id));
        }
        Ok(self.repo.select_where("covenant_id", covenant_id).await?)
    }

    pub async fn add(&self, covenant_id: i64, input: CovenantOwnerInput) -> Result<CovenantOwner, ServiceError> {
        require_text("owner_name", &input.owner_name)?;
        require_text("owner_unit", &input.owner_unit)?;
        if !self.covenants.exists(covenant_id).await? {
            return Err(ServiceError::not_found("Covenant", covenant_id));
        }

        let owner = sqlx::query_as::<_, CovenantOwner>(
            "INSERT INTO covenant_owners (covenant_id, owner_name, owner_unit) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(covenant_id)
        .bind(&input.owner_name)
        .bind(&input.owner_unit)
        .fetch_one(self.repo.pool())
        .await?;
        Ok(owner)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.repo.delete(id).await?)
    }
}
