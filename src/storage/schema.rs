use sqlx::{Executor, PgPool};
use std::path::Path;

pub const INIT_SCRIPT: &str = "001_init.sql";

#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read the schema script {path}.")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to apply the schema script.")]
    Apply(#[source] sqlx::Error),
}

/// Applies the schema script found in `migrations_dir` once at startup.
#[tracing::instrument(name = "Applying database schema", skip(db_pool))]
pub async fn init_schema(db_pool: &PgPool, migrations_dir: &Path) -> Result<(), SchemaError> {
    let path = migrations_dir.join(INIT_SCRIPT);
    let script = std::fs::read_to_string(&path).map_err(|source| SchemaError::Read {
        path: path.display().to_string(),
        source,
    })?;

    db_pool
        .execute(script.as_str())
        .await
        .map_err(SchemaError::Apply)?;

    tracing::info!("Schema applied from {}", path.display());

    Ok(())
}
