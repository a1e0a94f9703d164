//! `retail-migrate`: print or apply the retail schema.
//!
//! ```text
//! retail-migrate          # apply pending migrations (DATABASE_URL)
//! retail-migrate apply    # same
//! retail-migrate print    # write the DDL to stdout
//! ```

use anyhow::{Context, bail};

use retail_infra::migrations;
use retail_infra::{PostgresStore, SchemaConfig, StoreConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    retail_observability::init();

    let command = std::env::args().nth(1);
    match command.as_deref() {
        Some("print") => {
            let schema = SchemaConfig::from_env().context("invalid schema configuration")?;
            print!("{}", migrations::render(&schema));
        }
        None | Some("apply") => {
            let config = StoreConfig::from_env().context("invalid store configuration")?;
            let store = PostgresStore::connect(&config)
                .await
                .context("failed to connect to postgres")?;
            let applied = store
                .migrate(&config.schema)
                .await
                .context("migration failed")?;
            if applied.is_empty() {
                tracing::info!("schema is up to date");
            } else {
                tracing::info!(versions = ?applied, "schema migrated");
            }
        }
        Some(other) => bail!("unknown command '{other}' (expected 'apply' or 'print')"),
    }
    Ok(())
}
