use sqlx::types::Json;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::models::catalog::{Category, Product, Topping};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, category_id, images, size_options, status, created_at, updated_at";
const CATEGORY_COLUMNS: &str = "id, name, description, status, created_at, updated_at";
const TOPPING_COLUMNS: &str = "id, name, description, extra_price, status, created_at, updated_at";

/// Approval writes whole rows back, so its reads lock the row until commit.
fn select_by_id(table: &str, columns: &str, for_update: bool) -> String {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    format!("SELECT {columns} FROM {table} WHERE id = $1{lock}")
}

pub async fn insert_product(conn: &mut PgConnection, product: &Product) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO products
            (id, name, description, price, category_id, images, size_options, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.category_id)
    .bind(&product.images)
    .bind(Json(&product.size_options))
    .bind(product.status)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn get_product(
    conn: &mut PgConnection,
    id: Uuid,
    for_update: bool,
) -> Result<Option<Product>, sqlx::Error> {
    let sql = select_by_id("products", PRODUCT_COLUMNS, for_update);
    sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn update_product(conn: &mut PgConnection, product: &Product) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET name = $2, description = $3, price = $4, category_id = $5, images = $6,
            size_options = $7, status = $8, updated_at = $9
        WHERE id = $1
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.category_id)
    .bind(&product.images)
    .bind(Json(&product.size_options))
    .bind(product.status)
    .bind(product.updated_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_category(conn: &mut PgConnection, category: &Category) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO categories (id, name, description, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(category.id)
    .bind(&category.name)
    .bind(&category.description)
    .bind(category.status)
    .bind(category.created_at)
    .bind(category.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn get_category(
    conn: &mut PgConnection,
    id: Uuid,
    for_update: bool,
) -> Result<Option<Category>, sqlx::Error> {
    let sql = select_by_id("categories", CATEGORY_COLUMNS, for_update);
    sqlx::query_as::<_, Category>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn update_category(conn: &mut PgConnection, category: &Category) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE categories SET name = $2, description = $3, status = $4, updated_at = $5 WHERE id = $1",
    )
    .bind(category.id)
    .bind(&category.name)
    .bind(&category.description)
    .bind(category.status)
    .bind(category.updated_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn insert_topping(conn: &mut PgConnection, topping: &Topping) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO toppings (id, name, description, extra_price, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(topping.id)
    .bind(&topping.name)
    .bind(&topping.description)
    .bind(topping.extra_price)
    .bind(topping.status)
    .bind(topping.created_at)
    .bind(topping.updated_at)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn get_topping(
    conn: &mut PgConnection,
    id: Uuid,
    for_update: bool,
) -> Result<Option<Topping>, sqlx::Error> {
    let sql = select_by_id("toppings", TOPPING_COLUMNS, for_update);
    sqlx::query_as::<_, Topping>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn update_topping(conn: &mut PgConnection, topping: &Topping) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE toppings
        SET name = $2, description = $3, extra_price = $4, status = $5, updated_at = $6
        WHERE id = $1
        "#,
    )
    .bind(topping.id)
    .bind(&topping.name)
    .bind(&topping.description)
    .bind(topping.extra_price)
    .bind(topping.status)
    .bind(topping.updated_at)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}
