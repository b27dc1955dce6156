//! The editor's monotonic timestamp.
//!
//! Natively this is tokio's [`Instant`](tokio::time::Instant), so sessions can
//! sleep on it and tests can pause it. In the browser `std::time::Instant`
//! is unavailable; there it is milliseconds from the page's clock, supplied
//! by the host.

#[cfg(not(target_arch = "wasm32"))]
pub use tokio::time::Instant;

#[cfg(target_arch = "wasm32")]
pub use self::host::Instant;

#[cfg(target_arch = "wasm32")]
mod host {
    use std::ops::{Add, Sub};
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Instant(Duration);

    impl Instant {
        /// From a host timestamp such as `performance.now()` or `Date.now()`.
        pub fn from_millis(ms: f64) -> Self {
            Instant(Duration::from_secs_f64(ms.max(0.0) / 1000.0))
        }

        pub fn now() -> Self {
            Self::from_millis(js_sys::Date::now())
        }

        pub fn as_millis(self) -> f64 {
            self.0.as_secs_f64() * 1000.0
        }

        pub fn saturating_duration_since(self, earlier: Instant) -> Duration {
            self.0.saturating_sub(earlier.0)
        }
    }

    impl Add<Duration> for Instant {
        type Output = Instant;

        fn add(self, rhs: Duration) -> Instant {
            Instant(self.0 + rhs)
        }
    }

    impl Sub for Instant {
        type Output = Duration;

        fn sub(self, rhs: Instant) -> Duration {
            self.saturating_duration_since(rhs)
        }
    }
}
