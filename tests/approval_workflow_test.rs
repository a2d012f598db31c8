use std::sync::Arc;

use milktea_backend::db::memory::MemoryRepository;
use milktea_backend::db::models::catalog::{CatalogKind, CatalogStatus, Category, Product, Topping};
use milktea_backend::db::models::requests::{
    ChangeRequest, NewChangeRequest, Payload, RequestAction, RequestEntity, RequestFilter,
    RequestStatus, TimelineAction, UpdateChangeRequest,
};
use milktea_backend::db::models::store::Store;
use milktea_backend::db::repository::Repository;
use milktea_backend::middleware::auth::{Actor, Role};
use milktea_backend::services::RequestService;
use milktea_backend::utils::error::AppError;
use serde_json::{json, Value};
use uuid::Uuid;

struct Fixture {
    repo: MemoryRepository,
    service: RequestService,
    manager: Actor,
    admin: Actor,
    store: Store,
}

// Helper to build a service over a fresh in-memory backend with one managed store
async fn setup() -> Fixture {
    let repo = MemoryRepository::new();
    let manager = Actor {
        user_id: Uuid::new_v4(),
        role: Role::Manager,
    };
    let admin = Actor {
        user_id: Uuid::new_v4(),
        role: Role::Admin,
    };
    let store = Store::new("Downtown", Some(manager.user_id));
    repo.seed_store(store.clone()).await;

    let service = RequestService::new(Arc::new(repo.clone()));
    Fixture {
        repo,
        service,
        manager,
        admin,
        store,
    }
}

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

fn new_request(
    entity: RequestEntity,
    action: RequestAction,
    store_id: Uuid,
    target_id: Option<Uuid>,
    body: Value,
) -> NewChangeRequest {
    NewChangeRequest {
        entity,
        action,
        store_id,
        target_id,
        payload: payload(body),
        original: None,
        reason: None,
        attachments: Vec::new(),
        tags: Vec::new(),
    }
}

async fn find_product(repo: &MemoryRepository, id: Uuid) -> Option<Product> {
    let mut uow = repo.begin().await.expect("begin");
    uow.find_product(id).await.expect("find product")
}

async fn find_category(repo: &MemoryRepository, id: Uuid) -> Option<Category> {
    let mut uow = repo.begin().await.expect("begin");
    uow.find_category(id).await.expect("find category")
}

async fn find_topping(repo: &MemoryRepository, id: Uuid) -> Option<Topping> {
    let mut uow = repo.begin().await.expect("begin");
    uow.find_topping(id).await.expect("find topping")
}

async fn find_request(repo: &MemoryRepository, id: Uuid) -> ChangeRequest {
    let mut uow = repo.begin().await.expect("begin");
    uow.find_request(id)
        .await
        .expect("find request")
        .expect("request exists")
}

async fn seed_linked_product(fx: &Fixture, name: &str, price: i64) -> Product {
    let product = Product::new(name, price);
    fx.repo.seed_product(product.clone()).await;
    fx.repo
        .seed_membership(fx.store.id, CatalogKind::Product, product.id, CatalogStatus::Available)
        .await;
    product
}

#[tokio::test]
async fn test_product_create_round_trip() {
    let fx = setup().await;
    let category = Category::new("Milk Tea");
    fx.repo.seed_category(category.clone()).await;

    let submitted = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Create,
                fx.store.id,
                None,
                json!({ "name": "Trà Sữa Test", "price": 25000, "category": category.id }),
            ),
        )
        .await
        .expect("submit create");

    assert_eq!(submitted.status, RequestStatus::Pending);
    assert_eq!(submitted.timeline.len(), 1);
    assert_eq!(submitted.timeline[0].action, TimelineAction::Submit);
    assert!(submitted.diff.iter().any(|d| d.field == "name"));
    // submitting alone must not touch the catalog
    assert!(fx.repo.memberships(fx.store.id, CatalogKind::Product).await.is_empty());

    let approved = fx
        .service
        .approve(&fx.admin, submitted.id, Some("looks good".to_string()))
        .await
        .expect("approve");

    assert_eq!(approved.status, RequestStatus::Approved);
    assert_eq!(approved.approver_id, Some(fx.admin.user_id));
    assert_eq!(approved.timeline.len(), 2);
    assert_eq!(approved.timeline[1].action, TimelineAction::Approve);
    assert_eq!(approved.timeline[1].note.as_deref(), Some("looks good"));

    let product_id: Uuid = approved
        .payload
        .get("productId")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .expect("productId recorded in payload");

    let product = find_product(&fx.repo, product_id).await.expect("product created");
    assert_eq!(product.name, "Trà Sữa Test");
    assert_eq!(product.price, 25000);
    assert_eq!(product.category_id, Some(category.id));

    let links = fx.repo.memberships(fx.store.id, CatalogKind::Product).await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].entity_id, product_id);
    assert_eq!(links[0].store_status, CatalogStatus::Available);

    let stored = find_request(&fx.repo, submitted.id).await;
    assert_eq!(stored.status, RequestStatus::Approved);
}

#[tokio::test]
async fn test_product_create_with_unknown_category_fails_on_approval() {
    let fx = setup().await;
    let submitted = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Create,
                fx.store.id,
                None,
                json!({ "name": "Oolong", "price": 30000, "category": { "id": Uuid::new_v4() } }),
            ),
        )
        .await
        .expect("submit create");

    let err = fx
        .service
        .approve(&fx.admin, submitted.id, None)
        .await
        .expect_err("category is missing");
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(fx.repo.memberships(fx.store.id, CatalogKind::Product).await.is_empty());
    assert_eq!(find_request(&fx.repo, submitted.id).await.status, RequestStatus::Pending);
}

#[tokio::test]
async fn test_min_price_is_auto_corrected_from_size_options() {
    let fx = setup().await;
    let submitted = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Create,
                fx.store.id,
                None,
                json!({
                    "name": "Brown Sugar",
                    "sizeOptions": [
                        { "size": "S", "price": 20000 },
                        { "size": "L", "price": 30000 }
                    ]
                }),
            ),
        )
        .await
        .expect("submit create");

    assert_eq!(submitted.payload.get("price"), Some(&json!(20000)));

    // a price below the cheapest size is raised as well
    let raised = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Create,
                fx.store.id,
                None,
                json!({ "name": "Okinawa", "price": 1000, "sizeOptions": [{ "size": "M", "price": 25000 }] }),
            ),
        )
        .await
        .expect("submit create");
    assert_eq!(raised.payload.get("price"), Some(&json!(25000)));
}

#[tokio::test]
async fn test_category_update_splits_global_and_store_scope() {
    let fx = setup().await;
    let other_manager = Uuid::new_v4();
    let other_store = Store::new("Uptown", Some(other_manager));
    fx.repo.seed_store(other_store.clone()).await;

    let category = Category::new("Fruit Tea");
    fx.repo.seed_category(category.clone()).await;
    for store_id in [fx.store.id, other_store.id] {
        fx.repo
            .seed_membership(store_id, CatalogKind::Category, category.id, CatalogStatus::Available)
            .await;
    }

    let submitted = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Category,
                RequestAction::Update,
                fx.store.id,
                Some(category.id),
                json!({ "name": "Fresh Fruit Tea", "storeStatus": "unavailable" }),
            ),
        )
        .await
        .expect("submit update");
    fx.service
        .approve(&fx.admin, submitted.id, None)
        .await
        .expect("approve");

    let updated = find_category(&fx.repo, category.id).await.expect("category");
    assert_eq!(updated.name, "Fresh Fruit Tea");
    assert_eq!(updated.status, CatalogStatus::Available);

    let here = fx.repo.memberships(fx.store.id, CatalogKind::Category).await;
    assert_eq!(here[0].store_status, CatalogStatus::Unavailable);
    let there = fx.repo.memberships(other_store.id, CatalogKind::Category).await;
    assert_eq!(there[0].store_status, CatalogStatus::Available);
}

#[tokio::test]
async fn test_topping_delete_keeps_global_record() {
    let fx = setup().await;
    let topping = Topping::new("Pearl", 5000);
    fx.repo.seed_topping(topping.clone()).await;
    fx.repo
        .seed_membership(fx.store.id, CatalogKind::Topping, topping.id, CatalogStatus::Available)
        .await;

    let submitted = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Topping,
                RequestAction::Delete,
                fx.store.id,
                Some(topping.id),
                json!({}),
            ),
        )
        .await
        .expect("submit delete");
    fx.service
        .approve(&fx.admin, submitted.id, None)
        .await
        .expect("approve");

    assert!(fx.repo.memberships(fx.store.id, CatalogKind::Topping).await.is_empty());
    let kept = find_topping(&fx.repo, topping.id).await.expect("global topping kept");
    assert_eq!(kept.status, CatalogStatus::Available);
}

#[tokio::test]
async fn test_product_delete_marks_global_unavailable() {
    let fx = setup().await;
    let product = seed_linked_product(&fx, "Matcha Latte", 35000).await;

    let submitted = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Delete,
                fx.store.id,
                Some(product.id),
                json!({}),
            ),
        )
        .await
        .expect("submit delete");
    fx.service
        .approve(&fx.admin, submitted.id, None)
        .await
        .expect("approve");

    assert!(fx.repo.memberships(fx.store.id, CatalogKind::Product).await.is_empty());
    let retired = find_product(&fx.repo, product.id).await.expect("product kept");
    assert_eq!(retired.status, CatalogStatus::Unavailable);
}

#[tokio::test]
async fn test_duplicate_pending_is_rejected_until_terminal() {
    let fx = setup().await;
    let product = seed_linked_product(&fx, "Taro", 28000).await;
    let update = || {
        new_request(
            RequestEntity::Product,
            RequestAction::Update,
            fx.store.id,
            Some(product.id),
            json!({ "price": 29000 }),
        )
    };

    let first = fx.service.submit(&fx.manager, update()).await.expect("first");
    let err = fx
        .service
        .submit(&fx.manager, update())
        .await
        .expect_err("duplicate pending");
    assert!(matches!(err, AppError::Conflict(_)));

    // a delete on the same target is a different key
    fx.service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Delete,
                fx.store.id,
                Some(product.id),
                json!({}),
            ),
        )
        .await
        .expect("delete is a separate key");

    fx.service
        .reject(&fx.admin, first.id, Some("too expensive".to_string()))
        .await
        .expect("reject");
    fx.service
        .submit(&fx.manager, update())
        .await
        .expect("resubmission after rejection");
}

#[tokio::test]
async fn test_terminal_requests_are_closed() {
    let fx = setup().await;
    let product = seed_linked_product(&fx, "Jasmine", 22000).await;
    let submitted = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Update,
                fx.store.id,
                Some(product.id),
                json!({ "name": "Jasmine Green" }),
            ),
        )
        .await
        .expect("submit");

    let cancelled = fx
        .service
        .cancel_mine(&fx.manager, submitted.id, None)
        .await
        .expect("cancel");
    assert_eq!(cancelled.status, RequestStatus::Cancelled);
    assert_eq!(cancelled.approver_id, None);

    let approve = fx.service.approve(&fx.admin, submitted.id, None).await;
    assert!(matches!(approve, Err(AppError::State(_))));
    let reject = fx.service.reject(&fx.admin, submitted.id, None).await;
    assert!(matches!(reject, Err(AppError::State(_))));
    let cancel = fx.service.cancel_mine(&fx.manager, submitted.id, None).await;
    assert!(matches!(cancel, Err(AppError::State(_))));
    let revise = fx
        .service
        .update_mine(
            &fx.manager,
            submitted.id,
            UpdateChangeRequest {
                reason: Some("changed my mind".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(revise, Err(AppError::State(_))));

    let stored = find_request(&fx.repo, submitted.id).await;
    assert_eq!(stored, cancelled);
    assert_eq!(find_product(&fx.repo, product.id).await.expect("product").name, "Jasmine");
}

#[tokio::test]
async fn test_failed_product_delete_rolls_back_unlink() {
    let fx = setup().await;
    // linked to the store but missing from the global catalog
    let ghost = Uuid::new_v4();
    fx.repo
        .seed_membership(fx.store.id, CatalogKind::Product, ghost, CatalogStatus::Available)
        .await;

    let submitted = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Delete,
                fx.store.id,
                Some(ghost),
                json!({}),
            ),
        )
        .await
        .expect("submit delete");

    let err = fx
        .service
        .approve(&fx.admin, submitted.id, None)
        .await
        .expect_err("global product missing");
    assert!(matches!(err, AppError::NotFound(_)));

    let links = fx.repo.memberships(fx.store.id, CatalogKind::Product).await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].entity_id, ghost);
    let stored = find_request(&fx.repo, submitted.id).await;
    assert_eq!(stored.status, RequestStatus::Pending);
    assert_eq!(stored.timeline.len(), 1);
}

#[tokio::test]
async fn test_failed_category_update_rolls_back_global_change() {
    let fx = setup().await;
    let category = Category::new("Seasonal");
    fx.repo.seed_category(category.clone()).await;
    fx.repo
        .seed_membership(fx.store.id, CatalogKind::Category, category.id, CatalogStatus::Available)
        .await;

    let submitted = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Category,
                RequestAction::Update,
                fx.store.id,
                Some(category.id),
                json!({ "name": "Winter Specials", "status": "paused", "storeStatus": "available" }),
            ),
        )
        .await
        .expect("submit update");

    let err = fx
        .service
        .approve(&fx.admin, submitted.id, None)
        .await
        .expect_err("store cannot be available while globally paused");
    assert!(matches!(err, AppError::Validation(_)));

    let unchanged = find_category(&fx.repo, category.id).await.expect("category");
    assert_eq!(unchanged.name, "Seasonal");
    assert_eq!(unchanged.status, CatalogStatus::Available);
    assert_eq!(
        find_request(&fx.repo, submitted.id).await.status,
        RequestStatus::Pending
    );
}

#[tokio::test]
async fn test_order_approval_is_not_supported() {
    let fx = setup().await;
    let submitted = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Order,
                RequestAction::CancelOrder,
                fx.store.id,
                Some(Uuid::new_v4()),
                json!({ "reason": "customer asked" }),
            ),
        )
        .await
        .expect("order requests can be recorded");

    let err = fx
        .service
        .approve(&fx.admin, submitted.id, None)
        .await
        .expect_err("no order handler");
    match err {
        AppError::Validation(message) => assert!(message.contains("not supported")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(
        find_request(&fx.repo, submitted.id).await.status,
        RequestStatus::Pending
    );
}

#[tokio::test]
async fn test_unsupported_action_is_rejected_at_submission() {
    let fx = setup().await;
    let err = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::RefundFull,
                fx.store.id,
                None,
                json!({}),
            ),
        )
        .await
        .expect_err("refund is not a product action");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_update_by_non_manager_is_forbidden() {
    let fx = setup().await;
    let product = seed_linked_product(&fx, "Peach Tea", 27000).await;
    let stranger = Actor {
        user_id: Uuid::new_v4(),
        role: Role::Manager,
    };

    let err = fx
        .service
        .submit(
            &stranger,
            new_request(
                RequestEntity::Product,
                RequestAction::Update,
                fx.store.id,
                Some(product.id),
                json!({ "price": 1 }),
            ),
        )
        .await
        .expect_err("stranger does not manage the store");
    assert!(matches!(err, AppError::Authorization(_)));
}

#[tokio::test]
async fn test_target_outside_store_is_not_found() {
    let fx = setup().await;
    let elsewhere = Product::new("Not ours", 10000);
    fx.repo.seed_product(elsewhere.clone()).await;

    let err = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Update,
                fx.store.id,
                Some(elsewhere.id),
                json!({ "price": 12000 }),
            ),
        )
        .await
        .expect_err("product is not linked to this store");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_only_admins_decide() {
    let fx = setup().await;
    let product = seed_linked_product(&fx, "Lychee", 26000).await;
    let submitted = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Update,
                fx.store.id,
                Some(product.id),
                json!({ "price": 27000 }),
            ),
        )
        .await
        .expect("submit");

    let approve = fx.service.approve(&fx.manager, submitted.id, None).await;
    assert!(matches!(approve, Err(AppError::Authorization(_))));
    let reject = fx.service.reject(&fx.manager, submitted.id, None).await;
    assert!(matches!(reject, Err(AppError::Authorization(_))));
    assert_eq!(
        find_request(&fx.repo, submitted.id).await.status,
        RequestStatus::Pending
    );
}

#[tokio::test]
async fn test_update_mine_recomputes_diff() {
    let fx = setup().await;
    let product = seed_linked_product(&fx, "Coconut", 30000).await;
    let mut body = new_request(
        RequestEntity::Product,
        RequestAction::Update,
        fx.store.id,
        Some(product.id),
        json!({ "price": 31000 }),
    );
    body.original = Some(payload(json!({ "price": 30000 })));
    let submitted = fx.service.submit(&fx.manager, body).await.expect("submit");
    assert_eq!(submitted.diff.len(), 1);

    let revised = fx
        .service
        .update_mine(
            &fx.manager,
            submitted.id,
            UpdateChangeRequest {
                payload: Some(payload(json!({ "price": 31000, "name": "Coconut Cream" }))),
                note: Some("rename too".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("revise");

    assert_eq!(revised.status, RequestStatus::Pending);
    assert_eq!(revised.diff.len(), 2);
    assert_eq!(revised.timeline.last().map(|t| t.action), Some(TimelineAction::Update));

    let other = Actor {
        user_id: Uuid::new_v4(),
        role: Role::Manager,
    };
    let err = fx
        .service
        .update_mine(
            &other,
            submitted.id,
            UpdateChangeRequest {
                reason: Some("hijack".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect_err("only the submitter may revise");
    assert!(matches!(err, AppError::Authorization(_)));
}

#[tokio::test]
async fn test_listings_are_scoped_and_newest_first() {
    let fx = setup().await;
    let first = seed_linked_product(&fx, "A", 10000).await;
    let second = seed_linked_product(&fx, "B", 10000).await;

    let mut ids = Vec::new();
    for product in [&first, &second] {
        let request = fx
            .service
            .submit(
                &fx.manager,
                new_request(
                    RequestEntity::Product,
                    RequestAction::Update,
                    fx.store.id,
                    Some(product.id),
                    json!({ "price": 11000 }),
                ),
            )
            .await
            .expect("submit");
        ids.push(request.id);
    }

    let mine = fx
        .service
        .list_mine(&fx.manager, RequestFilter::default())
        .await
        .expect("list mine");
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].id, ids[1]);

    let stranger = Actor {
        user_id: Uuid::new_v4(),
        role: Role::Manager,
    };
    let theirs = fx
        .service
        .list_mine(
            &stranger,
            RequestFilter {
                user_id: Some(fx.manager.user_id),
                ..Default::default()
            },
        )
        .await
        .expect("list mine for stranger");
    assert!(theirs.is_empty());
    let err = fx
        .service
        .get_mine(&stranger, ids[0])
        .await
        .expect_err("not visible to others");
    assert!(matches!(err, AppError::NotFound(_)));

    let pending = fx
        .service
        .list_all(
            &fx.admin,
            RequestFilter {
                status: Some(RequestStatus::Pending),
                limit: Some(1),
                ..Default::default()
            },
        )
        .await
        .expect("admin listing");
    assert_eq!(pending.len(), 1);

    let err = fx
        .service
        .list_all(&fx.manager, RequestFilter::default())
        .await
        .expect_err("admin only");
    assert!(matches!(err, AppError::Authorization(_)));
}

async fn submit_and_approve(fx: &Fixture, request: NewChangeRequest) -> ChangeRequest {
    let submitted = fx.service.submit(&fx.manager, request).await.expect("submit");
    fx.service
        .approve(&fx.admin, submitted.id, None)
        .await
        .expect("approve")
}

fn written_back_id(request: &ChangeRequest, key: &str) -> Uuid {
    request
        .payload
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| panic!("{} recorded in payload", key))
}

#[tokio::test]
async fn test_category_create_new_record() {
    let fx = setup().await;
    let approved = submit_and_approve(
        &fx,
        new_request(
            RequestEntity::Category,
            RequestAction::Create,
            fx.store.id,
            None,
            json!({ "name": "Cheese Foam Series", "description": "Salted cream tops" }),
        ),
    )
    .await;

    let category_id = written_back_id(&approved, "categoryId");
    let category = find_category(&fx.repo, category_id).await.expect("category created");
    assert_eq!(category.name, "Cheese Foam Series");
    assert_eq!(category.description.as_deref(), Some("Salted cream tops"));
    assert_eq!(category.status, CatalogStatus::Available);

    let links = fx.repo.memberships(fx.store.id, CatalogKind::Category).await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].entity_id, category_id);
    assert_eq!(links[0].store_status, CatalogStatus::Available);
}

#[tokio::test]
async fn test_category_create_links_existing_record() {
    let fx = setup().await;
    let existing = Category::new("Coffee");
    fx.repo.seed_category(existing.clone()).await;

    let approved = submit_and_approve(
        &fx,
        new_request(
            RequestEntity::Category,
            RequestAction::Create,
            fx.store.id,
            None,
            json!({ "categoryId": existing.id, "storeStatus": "paused" }),
        ),
    )
    .await;

    assert_eq!(written_back_id(&approved, "categoryId"), existing.id);
    let links = fx.repo.memberships(fx.store.id, CatalogKind::Category).await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].entity_id, existing.id);
    assert_eq!(links[0].store_status, CatalogStatus::Paused);
    assert_eq!(find_category(&fx.repo, existing.id).await.expect("category"), existing);
}

#[tokio::test]
async fn test_topping_create_defaults_extra_price() {
    let fx = setup().await;
    let approved = submit_and_approve(
        &fx,
        new_request(
            RequestEntity::Topping,
            RequestAction::Create,
            fx.store.id,
            None,
            json!({ "name": "Grass Jelly" }),
        ),
    )
    .await;

    let topping_id = written_back_id(&approved, "toppingId");
    let topping = find_topping(&fx.repo, topping_id).await.expect("topping created");
    assert_eq!(topping.name, "Grass Jelly");
    assert_eq!(topping.extra_price, 0);

    let links = fx.repo.memberships(fx.store.id, CatalogKind::Topping).await;
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].entity_id, topping_id);
    assert_eq!(links[0].store_status, CatalogStatus::Available);
}

#[tokio::test]
async fn test_topping_update_price_and_store_status() {
    let fx = setup().await;
    let topping = Topping::new("Pudding", 6000);
    fx.repo.seed_topping(topping.clone()).await;
    fx.repo
        .seed_membership(fx.store.id, CatalogKind::Topping, topping.id, CatalogStatus::Available)
        .await;

    submit_and_approve(
        &fx,
        new_request(
            RequestEntity::Topping,
            RequestAction::Update,
            fx.store.id,
            Some(topping.id),
            json!({ "extraPrice": 7000, "storeStatus": "unavailable" }),
        ),
    )
    .await;

    let updated = find_topping(&fx.repo, topping.id).await.expect("topping");
    assert_eq!(updated.extra_price, 7000);
    assert_eq!(updated.name, "Pudding");
    assert_eq!(updated.status, CatalogStatus::Available);
    let links = fx.repo.memberships(fx.store.id, CatalogKind::Topping).await;
    assert_eq!(links[0].store_status, CatalogStatus::Unavailable);
}

#[tokio::test]
async fn test_product_update_applies_fields_and_touches_membership() {
    let fx = setup().await;
    let product = seed_linked_product(&fx, "Thai Tea", 30000).await;
    let before = fx.repo.memberships(fx.store.id, CatalogKind::Product).await[0].clone();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    submit_and_approve(
        &fx,
        new_request(
            RequestEntity::Product,
            RequestAction::Update,
            fx.store.id,
            Some(product.id),
            json!({
                "name": "Thai Milk Tea",
                "description": "Brewed strong",
                "price": 32000,
                "images": ["https://cdn.example.com/thai.png"]
            }),
        ),
    )
    .await;

    let updated = find_product(&fx.repo, product.id).await.expect("product");
    assert_eq!(updated.name, "Thai Milk Tea");
    assert_eq!(updated.description.as_deref(), Some("Brewed strong"));
    assert_eq!(updated.price, 32000);
    assert_eq!(updated.images, vec!["https://cdn.example.com/thai.png".to_string()]);
    assert_eq!(updated.status, CatalogStatus::Available);

    let after = fx.repo.memberships(fx.store.id, CatalogKind::Product).await[0].clone();
    assert_eq!(after.store_status, before.store_status);
    assert_eq!(after.added_at, before.added_at);
    assert!(after.last_updated > before.last_updated);
}

#[tokio::test]
async fn test_update_with_only_an_id_is_rejected() {
    let fx = setup().await;
    let topping = Topping::new("Aloe", 5000);
    fx.repo.seed_topping(topping.clone()).await;
    fx.repo
        .seed_membership(fx.store.id, CatalogKind::Topping, topping.id, CatalogStatus::Available)
        .await;

    let err = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Topping,
                RequestAction::Update,
                fx.store.id,
                Some(topping.id),
                json!({ "toppingId": topping.id }),
            ),
        )
        .await
        .expect_err("nothing to apply");
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_concurrent_approvals_on_one_product_both_apply() {
    let fx = setup().await;
    let product = seed_linked_product(&fx, "Hong Kong Milk Tea", 28000).await;

    let other_manager = Actor {
        user_id: Uuid::new_v4(),
        role: Role::Manager,
    };
    let other_store = Store::new("Harbour", Some(other_manager.user_id));
    fx.repo.seed_store(other_store.clone()).await;
    fx.repo
        .seed_membership(other_store.id, CatalogKind::Product, product.id, CatalogStatus::Available)
        .await;

    let rename = fx
        .service
        .submit(
            &fx.manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Update,
                fx.store.id,
                Some(product.id),
                json!({ "name": "HK Silk Stocking Tea" }),
            ),
        )
        .await
        .expect("submit rename");
    let retire = fx
        .service
        .submit(
            &other_manager,
            new_request(
                RequestEntity::Product,
                RequestAction::Delete,
                other_store.id,
                Some(product.id),
                json!({}),
            ),
        )
        .await
        .expect("submit delete");

    let (renamed, retired) = tokio::join!(
        fx.service.approve(&fx.admin, rename.id, None),
        fx.service.approve(&fx.admin, retire.id, None),
    );
    renamed.expect("rename approved");
    retired.expect("delete approved");

    let stored = find_product(&fx.repo, product.id).await.expect("product");
    assert_eq!(stored.name, "HK Silk Stocking Tea");
    assert_eq!(stored.status, CatalogStatus::Unavailable);
    assert_eq!(fx.repo.memberships(fx.store.id, CatalogKind::Product).await.len(), 1);
    assert!(fx.repo.memberships(other_store.id, CatalogKind::Product).await.is_empty());
}
