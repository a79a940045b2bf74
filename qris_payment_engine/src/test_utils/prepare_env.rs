use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::sqlite::db::new_pool;

/// Creates an empty database at `url` and brings the schema up to date. Any database already at that path is
/// dropped first, so every test starts from a clean slate.
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("🚀️ Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    run_migrations(url).await;
    info!("🚀️ Test database at {url} is ready");
}

/// A fresh database path under the shared data directory, so concurrently running test binaries never collide.
pub fn random_db_path() -> String {
    format!("sqlite://../data/test_qris_store_{}", rand::random::<u64>())
}

pub async fn run_migrations(url: &str) {
    let pool = new_pool(url, 1).await.expect("Error connecting to the test database");
    migrate!("./src/sqlite/migrations").run(&pool).await.expect("Error running DB migrations");
    pool.close().await;
    info!("🚀️ Migrations complete");
}
