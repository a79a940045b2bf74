use std::sync::{atomic::AtomicI32, Arc};

use futures_util::FutureExt;
use log::*;
use qpg_common::Rupiah;
use qris_payment_engine::{
    db_types::{ExpectationStatus, MatchType, NewExpectation, OrderRef, PaymentNotification},
    events::{EventHandlers, EventHooks, PaymentMatchedEvent},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    PaymentFlowApi,
    ReconciliationDatabase,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::{runtime::Runtime, sync::mpsc};

const STATIC_QR: &str = "00020101021126370014ID.EXAMPLE.WWW0215ID10200211223345204541153033605802ID5914TOKO \
                         SEJAHTERA6007JAKARTA6105101106304ABCD";

async fn setup() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

async fn tear_down(mut api: PaymentFlowApi<SqliteDatabase>) {
    if let Err(e) = api.db_mut().close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(api.db().url()).await.unwrap();
}

#[derive(Default, Clone)]
struct HookCalled {
    called: Arc<AtomicI32>,
}

impl HookCalled {
    pub fn called(&self) {
        let _ = self.called.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn count(&self) -> i32 {
        self.called.load(std::sync::atomic::Ordering::Relaxed)
    }
}

async fn hooked_api(
    db: SqliteDatabase,
    probe: HookCalled,
    tx: mpsc::Sender<PaymentMatchedEvent>,
) -> PaymentFlowApi<SqliteDatabase> {
    let mut hooks = EventHooks::default();
    hooks.on_payment_matched(move |matched| {
        info!("🪝️ {matched:?}");
        probe.called();
        let tx = tx.clone();
        async move {
            let _ = tx.send(matched).await;
        }
        .boxed()
    });
    let handlers = EventHandlers::new(8, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;
    PaymentFlowApi::new(db, producers)
}

#[test]
fn the_payment_matched_hook_fires_once_per_match() {
    let rt = Runtime::new().unwrap();
    let event = HookCalled::default();
    let event_copy = event.clone();
    let (tx, mut rx) = mpsc::channel(10);
    rt.block_on(async move {
        let db = setup().await;
        let api = hooked_api(db, event_copy, tx).await;
        let request = NewExpectation::new(OrderRef::from("HOOK-01".to_string()), Rupiah::from(42_000))
            .with_callback_url("https://merchant.example/callback".to_string());
        api.issue_dynamic_qr(STATIC_QR, request, None).await.expect("Error issuing QR");
        let notification = PaymentNotification::new("42000", "Payment received", "HOOK-01 settled");
        let outcome = api.process_notification(notification.clone()).await.expect("Error processing");
        assert!(outcome.is_some());
        let redelivered = api.process_notification(notification).await.expect("Error processing the duplicate");
        assert!(redelivered.is_none());
        let matched = rx.recv().await.expect("The hook should have delivered the event");
        assert_eq!(matched.expectation.order_reference.as_str(), "HOOK-01");
        assert_eq!(matched.expectation.callback_url.as_deref(), Some("https://merchant.example/callback"));
        assert_eq!(matched.payload.order_reference, "HOOK-01");
        assert_eq!(matched.payload.amount, Rupiah::from(42_000));
        assert_eq!(matched.payload.expected_amount, Rupiah::from(42_000));
        assert_eq!(matched.payload.status, ExpectationStatus::Completed);
        assert_eq!(matched.payload.match_type, MatchType::OrderReferenceMatch);
        assert!(matched.payload.raw_text.contains("HOOK-01"));
        let json = matched.payload.as_json();
        assert!(json.contains(r#""order_reference":"HOOK-01""#));
        assert!(json.contains(r#""match_type":"order_reference_match""#));
        tear_down(api).await;
    });
    assert_eq!(event.count(), 1);
    info!("🪝️ test complete");
}

#[test]
fn no_hook_fires_when_the_match_stands_aside() {
    let rt = Runtime::new().unwrap();
    let event = HookCalled::default();
    let event_copy = event.clone();
    let (tx, mut rx) = mpsc::channel(10);
    rt.block_on(async move {
        let db = setup().await;
        let api = hooked_api(db, event_copy, tx).await;
        for reference in ["HOOK-11", "HOOK-12"] {
            let request = NewExpectation::new(OrderRef::from(reference.to_string()), Rupiah::from(19_000));
            api.issue_dynamic_qr(STATIC_QR, request, None).await.expect("Error issuing QR");
        }
        let notification = PaymentNotification::new("19000", "Payment received", "Incoming transfer");
        let outcome = api.process_notification(notification).await.expect("Error processing");
        assert!(outcome.is_none());
        // nothing was published, so nothing can ever arrive
        assert!(rx.try_recv().is_err());
        tear_down(api).await;
    });
    assert_eq!(event.count(), 0);
    info!("🪝️ test complete");
}
