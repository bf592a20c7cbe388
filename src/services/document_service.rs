use sqlx::PgPool;

use super::{require_text, ServiceError};
use crate::database::manager::DatabaseManager;
use crate::database::models::{Contract, ContractDocument, ContractDocumentInput};
use crate::database::Repository;

pub struct DocumentService {
    repo: Repository<ContractDocument>,
    contracts: Repository<Contract>,
}

impl DocumentService {
    pub async fn new() -> Result<Self, ServiceError> {
        let pool: PgPool = DatabaseManager::main_pool().await?;
        Ok(Self {
            repo: Repository::new("contract_documents", pool.clone()),
            contracts: Repository::new("contracts", pool),
        })
    }

    pub async fn for_contract(&self, contract_id: i64) -> Result<Vec<ContractDocument>, ServiceError> {
        if !self.contracts.exists(contract_id).await? {
            return Err(ServiceError::not_found("Contract", contract_id));
        }
        Ok(self.repo.select_where("contract_id", contract_id).await?)
    }

    /// Records document metadata; the file itself lives at `file_path`
    pub async fn add(&self, contract_id: i64, input: ContractDocumentInput) -> Result<ContractDocument, ServiceError> {
        require_text("document_name", &input.document_name)?;
        require_text("file_path", &input.file_path)?;
        if !self.contracts.exists(contract_id).await? {
            return Err(ServiceError::not_found("Contract", contract_id));
        }

        let document = sqlx::query_as::<_, ContractDocument>(
            r#"
            INSERT INTO contract_documents (contract_id, document_name, document_type, file_path)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(contract_id)
        .bind(&input.document_name)
        .bind(&input.document_type)
        .bind(&input.file_path)
        .fetch_one(self.repo.pool())
        .await?;
        Ok(document)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        Ok(self.repo.delete(id).await?)
    }
}
