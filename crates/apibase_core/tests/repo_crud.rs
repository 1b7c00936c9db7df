mod common;

use apibase_core::filter::{FieldFilter, FilterError, FilterType, Pager, RawFilter};
use apibase_core::{filter_args, EntityRepository, FilterValue, RepoError, SqliteEntityRepository};
use common::{products_db, seed_products, Product};

#[test]
fn create_assigns_id_and_get_by_id_roundtrips() {
    let conn = products_db();
    let repo = SqliteEntityRepository::<Product>::new(&conn);

    let created = repo.create(Product::new("bolt", 10, true)).unwrap();
    assert_eq!(created.id, 1);

    let loaded = repo.get_by_id(created.id).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn create_keeps_explicit_id() {
    let conn = products_db();
    let repo = SqliteEntityRepository::<Product>::new(&conn);

    let mut product = Product::new("gear", 30, false);
    product.id = 42;
    let created = repo.create(product).unwrap();

    assert_eq!(created.id, 42);
    assert!(!repo.get_by_id(42).unwrap().active);
}

#[test]
fn missing_id_is_a_client_facing_not_found() {
    let conn = products_db();
    let repo = SqliteEntityRepository::<Product>::new(&conn);

    let err = repo.get_by_id(99).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.is_client_error());
    assert_eq!(err.to_string(), "products not found: 99");
}

#[test]
fn update_and_delete_report_whether_rows_changed() {
    let conn = products_db();
    let repo = SqliteEntityRepository::<Product>::new(&conn);

    let mut product = repo.create(Product::new("nut", 20, true)).unwrap();
    product.price = 25;
    assert!(repo.update(&product).unwrap());
    assert_eq!(repo.get_by_id(product.id).unwrap().price, 25);

    let ghost = Product {
        id: 500,
        ..Product::default()
    };
    assert!(!repo.update(&ghost).unwrap());

    assert!(repo.delete(&product).unwrap());
    assert!(!repo.delete(&product).unwrap());
    assert!(repo.get_by_id(product.id).unwrap_err().is_not_found());
}

#[test]
fn get_by_ids_returns_matching_rows_in_id_order() {
    let conn = products_db();
    seed_products(&conn);
    let repo = SqliteEntityRepository::<Product>::new(&conn);

    let names: Vec<String> = repo
        .get_by_ids(&[4, 2, 77])
        .unwrap()
        .into_iter()
        .map(|product| product.name)
        .collect();
    assert_eq!(names, vec!["nut", "belt"]);
    assert!(repo.get_by_ids(&[]).unwrap().is_empty());
}

#[test]
fn get_by_field_checks_filterability() {
    let conn = products_db();
    seed_products(&conn);
    let repo = SqliteEntityRepository::<Product>::new(&conn);

    let found = repo.get_by_field("name", FilterValue::text("gear")).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].price, 30);

    let err = repo.get_by_field("secret", FilterValue::from(1)).unwrap_err();
    assert!(matches!(err, RepoError::NotFilterable { ref field } if field == "secret"));
    assert!(err.is_client_error());

    let err = repo
        .get_by_field("name = name OR 1", FilterValue::from(1))
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFilterable { .. }));
}

#[test]
fn get_one_returns_first_match_or_not_found() {
    let conn = products_db();
    seed_products(&conn);
    let repo = SqliteEntityRepository::<Product>::new(&conn);

    let first_active = repo.get_one(filter_args!["active = ?", true]).unwrap();
    assert_eq!(first_active.name, "bolt");

    let err = repo
        .get_one(filter_args![FieldFilter::new("price", FilterType::Greater, 1_000)])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound { entity: "products", ref key } if key == "price > ?"
    ));
}

#[test]
fn count_ignores_paging() {
    let conn = products_db();
    seed_products(&conn);
    let repo = SqliteEntityRepository::<Product>::new(&conn);

    assert_eq!(repo.count(filter_args![]).unwrap(), 4);
    assert_eq!(
        repo.count(filter_args!["active = ?", 1, Pager::new(0, 1)])
            .unwrap(),
        3
    );
}

#[test]
fn construction_errors_abort_before_sql() {
    let conn = products_db();
    let repo = SqliteEntityRepository::<Product>::new(&conn);

    let err = repo
        .get_results(filter_args!["price > ? AND price < ?", 1])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Filter(FilterError::ArityDeficit {
            expected: 2,
            actual: 1,
            ..
        })
    ));
    assert!(err.is_client_error());
}

#[test]
fn store_failures_carry_operation_context() {
    let conn = products_db();
    let repo = SqliteEntityRepository::<Product>::new(&conn);

    let err = repo
        .get_results(filter_args![RawFilter::new("missing_column = 1")])
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Query {
            operation: "get_results",
            entity: "products",
            ..
        }
    ));
    assert!(!err.is_client_error());
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn new_empty_helpers_return_defaults() {
    let conn = products_db();
    let repo = SqliteEntityRepository::<Product>::new(&conn);

    assert_eq!(repo.new_empty(), Product::default());
    assert!(repo.new_empty_slice().is_empty());
}
