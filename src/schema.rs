//! Table bootstrap for the control plane and for tenant stores.
//!
//! Column contracts here are the ones the registry, issuer and gate query.

use percent_encoding::percent_decode_str;
use sqlx::PgPool;
use sqlx::postgres::PgConnectOptions;
use std::str::FromStr;
use url::Url;

use crate::codec::is_valid_table_prefix;
use crate::db::StoreError;
use crate::tenant::{DEFAULT_TABLE_PREFIX, DEFAULT_TENANT_ID, RoutingTarget};

const CONTROL_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS analytics_projects (
    id                    BIGSERIAL PRIMARY KEY,
    project_id            VARCHAR(64)  NOT NULL UNIQUE,
    project_name          VARCHAR(255),
    db_host               VARCHAR(255) NOT NULL,
    db_port               INTEGER      NOT NULL DEFAULT 5432,
    db_name               VARCHAR(128) NOT NULL,
    db_user               VARCHAR(128) NOT NULL,
    db_password_encrypted TEXT,
    table_prefix          VARCHAR(48)  DEFAULT 'analytics_',
    is_active             BOOLEAN      NOT NULL DEFAULT TRUE,
    created_at            TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
    updated_at            TIMESTAMPTZ  NOT NULL DEFAULT NOW()
)
"#;

const TENANT_DEVICES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS {{PREFIX}}devices (
    id              BIGSERIAL PRIMARY KEY,
    project_id      VARCHAR(64)  NOT NULL,
    device_id       VARCHAR(36)  NOT NULL,
    api_key         VARCHAR(64)  NOT NULL UNIQUE,
    secret_key      TEXT         NOT NULL,
    device_model    VARCHAR(128),
    os_version      VARCHAR(64),
    app_version     VARCHAR(32),
    is_banned       BOOLEAN      NOT NULL DEFAULT FALSE,
    ban_reason      TEXT,
    created_at      TIMESTAMPTZ  NOT NULL DEFAULT NOW(),
    last_active_at  TIMESTAMPTZ,
    UNIQUE (project_id, device_id)
)
"#;

/// Render tenant DDL for a prefix. `None` when the prefix is not a safe
/// identifier.
pub fn tenant_devices_ddl(prefix: &str) -> Option<String> {
    is_valid_table_prefix(prefix).then(|| TENANT_DEVICES_SCHEMA.replace("{{PREFIX}}", prefix))
}

/// Create `analytics_projects` if missing and seed the default tenant.
///
/// `target` is normally the control-plane database itself, with the
/// password already in stored (sealed) form.
pub async fn ensure_control_schema(pool: &PgPool, target: &RoutingTarget) -> Result<(), StoreError> {
    sqlx::query(CONTROL_SCHEMA).execute(pool).await?;

    let seeded = sqlx::query(
        r#"
        INSERT INTO analytics_projects
            (project_id, project_name, db_host, db_port, db_name, db_user,
             db_password_encrypted, table_prefix)
        VALUES ($1, 'Default Project', $2, $3, $4, $5, $6, $7)
        ON CONFLICT (project_id) DO NOTHING
        "#,
    )
    .bind(DEFAULT_TENANT_ID)
    .bind(&target.host)
    .bind(i32::from(target.port))
    .bind(&target.database)
    .bind(&target.user)
    .bind(&target.password)
    .bind(DEFAULT_TABLE_PREFIX)
    .execute(pool)
    .await?;

    if seeded.rows_affected() > 0 {
        tracing::info!("Seeded '{}' tenant", DEFAULT_TENANT_ID);
    }
    Ok(())
}

/// Routing target for the database a `postgres://` URL points at.
///
/// The password comes back percent-decoded, ready to be sealed.
pub fn routing_from_url(url: &str) -> Option<RoutingTarget> {
    let options = PgConnectOptions::from_str(url).ok()?;
    let password = Url::parse(url)
        .ok()?
        .password()
        .map(|p| percent_decode_str(p).decode_utf8_lossy().into_owned())
        .unwrap_or_default();

    Some(RoutingTarget {
        host: options.get_host().to_string(),
        port: options.get_port(),
        database: options.get_database()?.to_string(),
        user: options.get_username().to_string(),
        password,
    })
}

/// Create `<prefix>devices` if missing.
pub async fn ensure_tenant_schema(pool: &PgPool, prefix: &str) -> Result<(), StoreError> {
    let ddl = tenant_devices_ddl(prefix)
        .ok_or_else(|| StoreError::InvalidRow(format!("invalid table prefix '{prefix}'")))?;
    sqlx::query(&ddl).execute(pool).await?;
    tracing::info!("Tenant tables ready for prefix '{}'", prefix);
    Ok(())
}
