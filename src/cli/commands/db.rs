use serde_json::json;

use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

pub async fn migrate(output_format: OutputFormat) -> anyhow::Result<()> {
    DatabaseManager::migrate().await?;
    DatabaseManager::close().await;

    output_format.emit(&json!({"migrated": true}), |_| println!("✓ Migrations applied"))
}
