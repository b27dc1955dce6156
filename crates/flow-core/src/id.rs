use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner shared by node and edge ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Tie-breaker for ids minted within the same millisecond.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
#[cfg(not(target_arch = "wasm32"))]
pub fn timestamp_millis() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Milliseconds since the Unix epoch, from the page's `Date`.
#[cfg(target_arch = "wasm32")]
pub fn timestamp_millis() -> u128 {
    js_sys::Date::now().max(0.0) as u128
}

/// A timestamp-based suffix, unique within this process.
fn unique_suffix() -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{}-{seq}", timestamp_millis())
}

macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string, or return the existing id for it.
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            /// Resolve back to the original string.
            pub fn as_str(&self) -> &'static str {
                INTERNER.resolve(&self.0)
            }

            /// Mint `<base>-<millis>-<seq>`, retrying until `taken` rejects it.
            pub fn unique(base: &str, taken: impl Fn(Self) -> bool) -> Self {
                loop {
                    let candidate = Self::intern(&format!("{base}-{}", unique_suffix()));
                    if !taken(candidate) {
                        return candidate;
                    }
                }
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::intern(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

interned_id!(
    /// Identifier of a diagram node. Interned: 4 bytes, `Copy`, O(1) `Eq`/`Hash`.
    NodeId
);

interned_id!(
    /// Identifier of a diagram edge.
    EdgeId
);
