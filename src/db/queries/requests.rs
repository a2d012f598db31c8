use sqlx::types::Json;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::models::requests::{ChangeRequest, PendingKey, RequestFilter, RequestStatus};

const REQUEST_COLUMNS: &str = "id, store_id, user_id, approver_id, entity, action, target_id, \
    payload, original, diff, status, reason, attachments, tags, timeline, created_at, updated_at";

pub async fn insert_request(
    conn: &mut PgConnection,
    request: &ChangeRequest,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO change_requests
            (id, store_id, user_id, approver_id, entity, action, target_id,
             payload, original, diff, status, reason, attachments, tags, timeline,
             created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#,
    )
    .bind(request.id)
    .bind(request.store_id)
    .bind(request.user_id)
    .bind(request.approver_id)
    .bind(request.entity)
    .bind(request.action)
    .bind(request.target_id)
    .bind(Json(&request.payload))
    .bind(Json(&request.original))
    .bind(Json(&request.diff))
    .bind(request.status)
    .bind(&request.reason)
    .bind(&request.attachments)
    .bind(&request.tags)
    .bind(Json(&request.timeline))
    .bind(request.created_at)
    .bind(request.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn get_request(
    conn: &mut PgConnection,
    id: Uuid,
    for_update: bool,
) -> Result<Option<ChangeRequest>, sqlx::Error> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {REQUEST_COLUMNS} FROM change_requests WHERE id = $1{lock}");
    sqlx::query_as::<_, ChangeRequest>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list_requests(
    conn: &mut PgConnection,
    filter: &RequestFilter,
) -> Result<Vec<ChangeRequest>, sqlx::Error> {
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {REQUEST_COLUMNS} FROM change_requests WHERE TRUE"));

    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(entity) = filter.entity {
        builder.push(" AND entity = ").push_bind(entity);
    }
    if let Some(store_id) = filter.store_id {
        builder.push(" AND store_id = ").push_bind(store_id);
    }
    if let Some(user_id) = filter.user_id {
        builder.push(" AND user_id = ").push_bind(user_id);
    }

    builder
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(filter.limit())
        .push(" OFFSET ")
        .push_bind(filter.offset());

    builder
        .build_query_as::<ChangeRequest>()
        .fetch_all(conn)
        .await
}

pub async fn pending_exists(conn: &mut PgConnection, key: &PendingKey) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM change_requests
            WHERE store_id = $1 AND entity = $2 AND action = $3
              AND target_id IS NOT DISTINCT FROM $4 AND status = $5
        )
        "#,
    )
    .bind(key.store_id)
    .bind(key.entity)
    .bind(key.action)
    .bind(key.target_id)
    .bind(RequestStatus::Pending)
    .fetch_one(conn)
    .await
}

/// Conditional write: only touches the row while it is still pending.
pub async fn update_pending_request(
    conn: &mut PgConnection,
    request: &ChangeRequest,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE change_requests
        SET approver_id = $2, payload = $3, original = $4, diff = $5, status = $6,
            reason = $7, attachments = $8, tags = $9, timeline = $10, updated_at = $11
        WHERE id = $1 AND status = $12
        "#,
    )
    .bind(request.id)
    .bind(request.approver_id)
    .bind(Json(&request.payload))
    .bind(Json(&request.original))
    .bind(Json(&request.diff))
    .bind(request.status)
    .bind(&request.reason)
    .bind(&request.attachments)
    .bind(&request.tags)
    .bind(Json(&request.timeline))
    .bind(request.updated_at)
    .bind(RequestStatus::Pending)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
