use chrono::{Duration, Utc};
use log::*;
use qpg_common::Rupiah;
use qris_payment_engine::{
    db_types::{ExpectationStatus, NewExpectation, OrderRef},
    expectation_objects::ExpectationQueryFilter,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    ExpectationsApi,
    ReconciliationDatabase,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::runtime::Runtime;

async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn tear_down(mut db: SqliteDatabase) {
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(db.url()).await.unwrap();
}

/// Registers three expectations with descending ages and completes the middle one.
async fn seed(db: &SqliteDatabase) {
    let orders = [("S-1001", 10_000, 30), ("S-1002", 20_000, 20), ("S-1003", 20_000, 10)];
    for (reference, amount, age) in orders {
        let mut request = NewExpectation::new(OrderRef::from(reference.to_string()), Rupiah::from(amount));
        request.created_at = Utc::now() - Duration::minutes(age);
        db.insert_expectation(request).await.expect("Error inserting expectation");
    }
    db.complete_expectation(&OrderRef::from("S-1002".to_string()))
        .await
        .expect("Error completing expectation")
        .expect("S-1002 should have been pending");
}

#[test]
fn filters_compose_in_the_search_api() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = setup().await;
        seed(&db).await;
        let api = ExpectationsApi::new(db.clone());

        let query = ExpectationQueryFilter::default().with_order_reference(OrderRef::from("S-1001".to_string()));
        let result = api.search_expectations(query).await.expect("Error searching");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].order_reference.as_str(), "S-1001");

        let query = ExpectationQueryFilter::default().with_reference_like("S-10".to_string());
        let result = api.search_expectations(query).await.expect("Error searching");
        assert_eq!(result.len(), 3);
        // ascending created_at, so the oldest comes first
        assert_eq!(result[0].order_reference.as_str(), "S-1001");
        assert_eq!(result[2].order_reference.as_str(), "S-1003");

        let query = ExpectationQueryFilter::default().with_amount(Rupiah::from(20_000));
        let result = api.search_expectations(query).await.expect("Error searching");
        assert_eq!(result.len(), 2);

        let query = ExpectationQueryFilter::default().with_status(ExpectationStatus::Completed);
        let result = api.search_expectations(query).await.expect("Error searching");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].order_reference.as_str(), "S-1002");

        let query = ExpectationQueryFilter::default()
            .with_status(ExpectationStatus::Pending)
            .with_amount(Rupiah::from(20_000));
        let result = api.search_expectations(query).await.expect("Error searching");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].order_reference.as_str(), "S-1003");

        tear_down(db).await;
    });
}

#[test]
fn time_bounds_trim_the_search() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = setup().await;
        seed(&db).await;
        let api = ExpectationsApi::new(db.clone());

        let query = ExpectationQueryFilter::default()
            .since(Utc::now() - Duration::minutes(25))
            .expect("Error building query");
        let result = api.search_expectations(query).await.expect("Error searching");
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].order_reference.as_str(), "S-1002");

        let query = ExpectationQueryFilter::default()
            .until(Utc::now() - Duration::minutes(25))
            .expect("Error building query");
        let result = api.search_expectations(query).await.expect("Error searching");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].order_reference.as_str(), "S-1001");

        tear_down(db).await;
    });
}

#[test]
fn reservations_are_visible_through_the_read_api() {
    let rt = Runtime::new().unwrap();
    rt.block_on(async {
        let db = setup().await;
        let reference = OrderRef::from("S-2001".to_string());
        let request = NewExpectation::new(reference.clone(), Rupiah::from(65_000));
        db.insert_expectation(request).await.expect("Error inserting expectation");
        let reservation = db.reserve_unique_amount(&reference).await.expect("Error reserving a value");
        let api = ExpectationsApi::new(db.clone());

        let expectation = api
            .expectation_by_reference(&reference)
            .await
            .expect("Error fetching expectation")
            .expect("The expectation should exist");
        assert_eq!(expectation.original_amount, Rupiah::from(65_000));

        let visible = api
            .reservation_for_reference(&reference)
            .await
            .expect("Error fetching reservation")
            .expect("The reservation should be active");
        assert_eq!(visible.value, reservation.value);

        let amount = api.active_unique_amount(&reference).await.expect("Error fetching amount");
        assert_eq!(amount, Some(reservation.amount()));

        let missing = api
            .expectation_by_reference(&OrderRef::from("S-9999".to_string()))
            .await
            .expect("Error fetching expectation");
        assert!(missing.is_none());

        tear_down(db).await;
    });
}
