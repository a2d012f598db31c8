use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::models::catalog::{CatalogKind, CatalogStatus};
use crate::db::models::store::{MembershipEntry, Store};

/// Membership table backing a store's list for `kind`.
fn membership_table(kind: CatalogKind) -> &'static str {
    match kind {
        CatalogKind::Product => "store_products",
        CatalogKind::Category => "store_categories",
        CatalogKind::Topping => "store_toppings",
    }
}

pub async fn get_store(conn: &mut PgConnection, id: Uuid) -> Result<Option<Store>, sqlx::Error> {
    sqlx::query_as::<_, Store>("SELECT id, name, manager_id, created_at FROM stores WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn get_membership(
    conn: &mut PgConnection,
    store_id: Uuid,
    kind: CatalogKind,
    entity_id: Uuid,
) -> Result<Option<MembershipEntry>, sqlx::Error> {
    let sql = format!(
        "SELECT entity_id, store_status, added_at, last_updated FROM {} \
         WHERE store_id = $1 AND entity_id = $2",
        membership_table(kind)
    );
    sqlx::query_as::<_, MembershipEntry>(&sql)
        .bind(store_id)
        .bind(entity_id)
        .fetch_optional(conn)
        .await
}

pub async fn upsert_membership(
    conn: &mut PgConnection,
    store_id: Uuid,
    kind: CatalogKind,
    entity_id: Uuid,
    store_status: CatalogStatus,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO {} (store_id, entity_id, store_status, added_at, last_updated)
        VALUES ($1, $2, $3, $4, $4)
        ON CONFLICT (store_id, entity_id)
        DO UPDATE SET store_status = EXCLUDED.store_status, last_updated = EXCLUDED.last_updated
        "#,
        membership_table(kind)
    );
    sqlx::query(&sql)
        .bind(store_id)
        .bind(entity_id)
        .bind(store_status)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn touch_membership(
    conn: &mut PgConnection,
    store_id: Uuid,
    kind: CatalogKind,
    entity_id: Uuid,
    store_status: Option<CatalogStatus>,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE {}
        SET store_status = COALESCE($3, store_status), last_updated = $4
        WHERE store_id = $1 AND entity_id = $2
        "#,
        membership_table(kind)
    );
    let result = sqlx::query(&sql)
        .bind(store_id)
        .bind(entity_id)
        .bind(store_status)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_membership(
    conn: &mut PgConnection,
    store_id: Uuid,
    kind: CatalogKind,
    entity_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let sql = format!(
        "DELETE FROM {} WHERE store_id = $1 AND entity_id = $2",
        membership_table(kind)
    );
    let result = sqlx::query(&sql)
        .bind(store_id)
        .bind(entity_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
