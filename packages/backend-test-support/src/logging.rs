//! Test logging initialization shared by unit and integration tests.

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Quiet unless asked otherwise: sqlx statement logging stays off even at
/// `TEST_LOG=debug` so lock and position logs remain readable.
const SQLX_DIRECTIVE: &str = "sqlx=warn";

/// Install a test subscriber once per process.
///
/// Level precedence:
///
/// 1. `TEST_LOG` (preferred)
/// 2. `RUST_LOG`
/// 3. `"warn"`
///
/// Output goes through `with_test_writer()` so the harness captures it.
pub fn init() {
    INITIALIZED.get_or_init(|| {
        let directives = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "warn".to_string());
        let filter = EnvFilter::try_new(format!("{directives},{SQLX_DIRECTIVE}"))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .with_target(false)
            .try_init()
            .ok(); // another harness may already own the global subscriber
    });
}
