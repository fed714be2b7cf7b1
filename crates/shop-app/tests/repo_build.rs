use shop_repo::{build_repo, Repo};
use shop_types::domain::product::{NewProduct, Product};
use shop_types::ports::order_repository::{OrderFilter, OrderRepository};
use shop_types::ports::product_repository::ProductRepository;

#[tokio::test]
async fn builds_sqlite_repo_from_url() {
    // Use a temp DB path for isolation.
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shop-test.db");
    let url = format!("sqlite://{}", db_path.display());

    let repo: Repo = build_repo(Some(&url)).await.expect("build repo");
    assert_eq!(repo.backend(), "sqlite");
    assert_eq!(repo.count_products().await.expect("count"), 0);
    assert_eq!(repo.count_orders(OrderFilter::default()).await.expect("count"), 0);

    let product = Product::new(NewProduct {
        name: "Kettle".into(),
        description: "Electric kettle".into(),
        price_cents: Some(2599),
        stock: Some(4),
        category: "kitchen".into(),
    })
    .unwrap();
    repo.create_product(product.clone()).await.expect("insert");

    // a second handle on the same file sees the migrated schema and the row
    let reopened = build_repo(Some(&url)).await.expect("reopen");
    let fetched = reopened.get_product(product.id).await.expect("get");
    assert_eq!(fetched.map(|p| p.stock), Some(4));
}

#[tokio::test]
async fn defaults_to_memory_without_url() {
    let repo = build_repo(None).await.expect("build repo");
    assert_eq!(repo.backend(), "memory");
    assert_eq!(repo.count_products().await.expect("count"), 0);
}
