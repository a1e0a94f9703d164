//! Versioned PostgreSQL schema.
//!
//! Every constraint is created under its [`Constraint::name`], so database
//! errors map back to the same typed value the in-memory store reports. The
//! orders table references an external user table chosen by [`SchemaConfig`].
//!
//! Applied versions are recorded in `retail_schema_migrations`; each migration
//! runs in its own transaction under an advisory lock, so concurrent migrators
//! apply every version exactly once.

use sqlx::PgPool;
use tracing::{info, instrument};

use retail_catalog::{
    CATEGORY_NAME_MAX, PARAMETER_NAME_MAX, PARAMETER_VALUE_MAX, PRODUCT_INFO_NAME_MAX,
    PRODUCT_NAME_MAX, SHOP_NAME_MAX, SHOP_URL_MAX,
};
use retail_core::Constraint;
use retail_orders::OrderStatus;

use crate::config::SchemaConfig;
use crate::store::postgres::map_sqlx_error;
use crate::store::StoreResult;

/// Table recording applied migration versions.
pub const MIGRATIONS_TABLE: &str = "retail_schema_migrations";

/// Advisory lock key held while a migration runs ("retail" in ASCII).
const MIGRATION_LOCK_KEY: i64 = 0x7265_7461_696c;

/// A registered migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Version string; migrations apply in ascending order.
    pub version: &'static str,
    pub name: &'static str,
    ddl: fn(&SchemaConfig) -> Vec<String>,
}

impl Migration {
    /// DDL statements of this migration for `schema`.
    pub fn statements(&self, schema: &SchemaConfig) -> Vec<String> {
        (self.ddl)(schema)
    }
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001",
        name: "catalog",
        ddl: catalog,
    },
    Migration {
        version: "0002",
        name: "orders",
        ddl: orders,
    },
    Migration {
        version: "0003",
        name: "order_timestamps",
        ddl: order_timestamps,
    },
];

/// The full schema as a single SQL script.
pub fn render(schema: &SchemaConfig) -> String {
    let mut out = String::new();
    for migration in MIGRATIONS {
        out.push_str(&format!(
            "-- {} {}\n",
            migration.version, migration.name
        ));
        for statement in migration.statements(schema) {
            out.push_str(statement.trim());
            out.push_str(";\n\n");
        }
    }
    out
}

/// Apply pending migrations. Returns the versions applied by this call.
#[instrument(skip(pool, schema), fields(user_table = %schema.user_table), err)]
pub async fn migrate(pool: &PgPool, schema: &SchemaConfig) -> StoreResult<Vec<&'static str>> {
    sqlx::raw_sql(&format!(
        "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
            version TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )"
    ))
    .execute(pool)
    .await
    .map_err(|e| map_sqlx_error("create_migrations_table", e))?;

    let mut applied = Vec::new();
    for migration in MIGRATIONS {
        let mut tx = pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("migration_lock", e))?;

        let done = sqlx::query(&format!(
            "SELECT 1 FROM {MIGRATIONS_TABLE} WHERE version = $1"
        ))
        .bind(migration.version)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("check_migration", e))?;
        if done.is_some() {
            continue;
        }

        for statement in migration.statements(schema) {
            sqlx::raw_sql(&statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error(migration.name, e))?;
        }

        sqlx::query(&format!(
            "INSERT INTO {MIGRATIONS_TABLE} (version, name) VALUES ($1, $2)"
        ))
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("record_migration", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        info!(version = migration.version, name = migration.name, "applied migration");
        applied.push(migration.version);
    }
    Ok(applied)
}

fn name_check(table: &str) -> String {
    format!("CONSTRAINT {table}_name_check CHECK (btrim(name) <> '')")
}

fn catalog(_: &SchemaConfig) -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE shops (
                id UUID PRIMARY KEY,
                name VARCHAR({SHOP_NAME_MAX}) COLLATE \"C\" NOT NULL,
                url VARCHAR({SHOP_URL_MAX}),
                {}
            )",
            name_check("shops")
        ),
        format!(
            "CREATE TABLE categories (
                id UUID PRIMARY KEY,
                name VARCHAR({CATEGORY_NAME_MAX}) COLLATE \"C\" NOT NULL,
                {}
            )",
            name_check("categories")
        ),
        format!(
            "CREATE TABLE shop_categories (
                shop_id UUID NOT NULL,
                category_id UUID NOT NULL,
                CONSTRAINT {pair} PRIMARY KEY (shop_id, category_id),
                CONSTRAINT {shop} FOREIGN KEY (shop_id) REFERENCES shops (id) ON DELETE CASCADE,
                CONSTRAINT {category} FOREIGN KEY (category_id) REFERENCES categories (id) ON DELETE CASCADE
            )",
            pair = Constraint::ShopCategoryPair.name(),
            shop = Constraint::ShopCategoryShop.name(),
            category = Constraint::ShopCategoryCategory.name(),
        ),
        "CREATE INDEX shop_categories_category_id_idx ON shop_categories (category_id)".to_string(),
        format!(
            "CREATE TABLE products (
                id UUID PRIMARY KEY,
                name VARCHAR({PRODUCT_NAME_MAX}) COLLATE \"C\" NOT NULL,
                category_id UUID NOT NULL,
                {check},
                CONSTRAINT {category} FOREIGN KEY (category_id) REFERENCES categories (id) ON DELETE CASCADE
            )",
            check = name_check("products"),
            category = Constraint::ProductCategory.name(),
        ),
        "CREATE INDEX products_category_id_idx ON products (category_id)".to_string(),
        format!(
            "CREATE TABLE product_infos (
                id UUID PRIMARY KEY,
                product_id UUID NOT NULL,
                shop_id UUID NOT NULL,
                external_id INTEGER NOT NULL,
                name VARCHAR({PRODUCT_INFO_NAME_MAX}) COLLATE \"C\" NOT NULL,
                quantity INTEGER NOT NULL DEFAULT 0,
                price INTEGER NOT NULL DEFAULT 0,
                price_rrc INTEGER NOT NULL DEFAULT 0,
                {check},
                CONSTRAINT product_infos_external_id_check CHECK (external_id >= 0),
                CONSTRAINT product_infos_quantity_check CHECK (quantity >= 0),
                CONSTRAINT product_infos_price_check CHECK (price >= 0),
                CONSTRAINT product_infos_price_rrc_check CHECK (price_rrc >= 0),
                CONSTRAINT {product} FOREIGN KEY (product_id) REFERENCES products (id) ON DELETE CASCADE,
                CONSTRAINT {shop} FOREIGN KEY (shop_id) REFERENCES shops (id) ON DELETE CASCADE,
                CONSTRAINT {unique} UNIQUE (product_id, shop_id, external_id)
            )",
            check = name_check("product_infos"),
            product = Constraint::ProductInfoProduct.name(),
            shop = Constraint::ProductInfoShop.name(),
            unique = Constraint::UniqueProductInfo.name(),
        ),
        "CREATE INDEX product_infos_shop_id_idx ON product_infos (shop_id)".to_string(),
        format!(
            "CREATE TABLE parameters (
                id UUID PRIMARY KEY,
                name VARCHAR({PARAMETER_NAME_MAX}) COLLATE \"C\" NOT NULL,
                {}
            )",
            name_check("parameters")
        ),
        format!(
            "CREATE TABLE product_parameters (
                id UUID PRIMARY KEY,
                product_info_id UUID NOT NULL,
                parameter_id UUID NOT NULL,
                value VARCHAR({PARAMETER_VALUE_MAX}) COLLATE \"C\" NOT NULL,
                CONSTRAINT product_parameters_value_check CHECK (btrim(value) <> ''),
                CONSTRAINT {info} FOREIGN KEY (product_info_id) REFERENCES product_infos (id) ON DELETE CASCADE,
                CONSTRAINT {parameter} FOREIGN KEY (parameter_id) REFERENCES parameters (id) ON DELETE CASCADE,
                CONSTRAINT {unique} UNIQUE (product_info_id, parameter_id)
            )",
            info = Constraint::ProductParameterProductInfo.name(),
            parameter = Constraint::ProductParameterParameter.name(),
            unique = Constraint::UniqueProductParameter.name(),
        ),
        "CREATE INDEX product_parameters_parameter_id_idx ON product_parameters (parameter_id)"
            .to_string(),
    ]
}

fn orders(schema: &SchemaConfig) -> Vec<String> {
    let statuses = OrderStatus::ALL
        .iter()
        .map(|status| format!("'{}'", status.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    vec![
        format!(
            "CREATE TABLE orders (
                id UUID PRIMARY KEY,
                user_id UUID NOT NULL,
                status VARCHAR({max_status}) NOT NULL DEFAULT '{default_status}',
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                CONSTRAINT orders_status_check CHECK (status IN ({statuses})),
                CONSTRAINT {user} FOREIGN KEY (user_id) REFERENCES {user_table} ({user_key}) ON DELETE CASCADE
            )",
            max_status = OrderStatus::MAX_LEN,
            default_status = OrderStatus::default().as_str(),
            user = Constraint::OrderUser.name(),
            user_table = schema.user_table,
            user_key = schema.user_key,
        ),
        "CREATE INDEX orders_user_id_idx ON orders (user_id)".to_string(),
        format!(
            "CREATE TABLE order_items (
                id UUID PRIMARY KEY,
                order_id UUID NOT NULL,
                product_info_id UUID NOT NULL,
                quantity INTEGER NOT NULL DEFAULT 1,
                CONSTRAINT order_items_quantity_check CHECK (quantity > 0),
                CONSTRAINT {order} FOREIGN KEY (order_id) REFERENCES orders (id) ON DELETE CASCADE,
                CONSTRAINT {info} FOREIGN KEY (product_info_id) REFERENCES product_infos (id) ON DELETE CASCADE,
                CONSTRAINT {unique} UNIQUE (order_id, product_info_id)
            )",
            order = Constraint::OrderItemOrder.name(),
            info = Constraint::OrderItemProductInfo.name(),
            unique = Constraint::UniqueOrderItem.name(),
        ),
        "CREATE INDEX order_items_product_info_id_idx ON order_items (product_info_id)"
            .to_string(),
    ]
}

/// `created_at` is pinned to its inserted value; `updated_at` follows every update.
fn order_timestamps(_: &SchemaConfig) -> Vec<String> {
    vec![
        "CREATE OR REPLACE FUNCTION retail_touch_order() RETURNS trigger AS $$
        BEGIN
            NEW.created_at := OLD.created_at;
            NEW.updated_at := now();
            RETURN NEW;
        END;
        $$ LANGUAGE plpgsql"
            .to_string(),
        "CREATE TRIGGER orders_touch BEFORE UPDATE ON orders
            FOR EACH ROW EXECUTE FUNCTION retail_touch_order()"
            .to_string(),
    ]
}
