//! Shared test helpers for the ISOXML prescription crates.
//!
//! Pulled in as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

use std::sync::Once;

static LOGGING: Once = Once::new();

/// Install a test tracing subscriber once per process.
///
/// Honours `RUST_LOG`. Output goes through the test harness writer so it only
/// shows up for failing tests.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Absolute float equality within `epsilon`.
///
/// ```
/// test_utils::assert_approx_eq!(100.0001, 100.0, 0.001);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (l, r, eps) = ($left as f64, $right as f64, $epsilon as f64);
        assert!(
            (l - r).abs() <= eps,
            "approx assertion failed: {} vs {} (epsilon {})",
            l,
            r,
            eps
        );
    }};
}

/// Float equality relative to the larger magnitude (floored at 1).
///
/// Unit scales span many orders of magnitude, so rate checks use this.
///
/// ```
/// test_utils::assert_relative_eq!(1.0e9 + 1.0, 1.0e9, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_relative_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let (l, r, tol) = ($left as f64, $right as f64, $tolerance as f64);
        let scale = l.abs().max(r.abs()).max(1.0);
        assert!(
            (l - r).abs() <= tol * scale,
            "relative assertion failed: {} vs {} (tolerance {} at scale {})",
            l,
            r,
            tol,
            scale
        );
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx() {
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "approx assertion failed")]
    fn test_approx_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "relative assertion failed")]
    fn test_relative_fails() {
        assert_relative_eq!(1.0e9 + 1.0e6, 1.0e9, 1e-6);
    }

    #[test]
    fn test_logging_installs_once() {
        super::init_test_logging();
        super::init_test_logging();
    }
}
