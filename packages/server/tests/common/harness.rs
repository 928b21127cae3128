//! Test harnesses.
//!
//! `TestHarness` wires the real router to the in-memory store and mock
//! email/image services. `PgHarness` starts a shared Postgres container for
//! store-level tests; those tests are `#[ignore]`d because they need Docker.

use std::sync::Arc;

use anyhow::{Context, Result};
use marketplace_core::kernel::test_dependencies::{MockClock, MockEmailService, MockImageStorage};
use marketplace_core::kernel::{MemoryStore, ServerDeps, TestDependencies};
use marketplace_core::server::{build_app, AppOptions, AppState};
use sqlx::PgPool;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

use super::ApiClient;

fn init_tracing() {
    // Run tests with: RUST_LOG=debug cargo test -- --nocapture
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Router + mocks for one test. Every harness has its own empty store.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let response = ctx.api().get("/health", None).await;
/// }
/// ```
pub struct TestHarness {
    pub test_deps: TestDependencies,
    pub deps: Arc<ServerDeps>,
    api: ApiClient,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }

    async fn teardown(self) {}
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_deps(TestDependencies::new())
    }

    /// Harness over customised mocks, e.g. a failing mailer.
    pub fn with_deps(test_deps: TestDependencies) -> Self {
        init_tracing();
        let deps = test_deps.clone().into_deps();
        let app = build_app(
            AppState {
                deps: deps.clone(),
                secure_cookies: true,
            },
            AppOptions {
                rate_limit_enabled: false,
                allowed_origins: Vec::new(),
            },
        );
        Self {
            test_deps,
            deps,
            api: ApiClient::new(app),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn email(&self) -> &MockEmailService {
        &self.test_deps.email
    }

    pub fn images(&self) -> &MockImageStorage {
        &self.test_deps.images
    }

    pub fn clock(&self) -> &MockClock {
        &self.test_deps.clock
    }

    pub fn store(&self) -> &MemoryStore {
        &self.test_deps.store
    }
}

/// Shared Postgres container, started once and reused by every test.
struct SharedTestInfra {
    db_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        init_tracing();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let db_url = format!(
            "postgresql://postgres:postgres@{}:{}/postgres",
            pg_host, pg_port
        );

        let pool = PgPool::connect(&db_url)
            .await
            .context("Failed to connect to Postgres for migrations")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self {
            db_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Fresh pool on the shared database. Tests share rows, so use unique emails.
pub struct PgHarness {
    pub db_pool: PgPool,
}

impl AsyncTestContext for PgHarness {
    async fn setup() -> Self {
        let infra = SharedTestInfra::get().await;
        let db_pool = PgPool::connect(&infra.db_url)
            .await
            .expect("Failed to connect to test database");
        Self { db_pool }
    }

    async fn teardown(self) {
        self.db_pool.close().await;
    }
}
