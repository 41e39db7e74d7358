//! Client correlation keys.

/// Opaque correlation key identifying one session's pings in a shared
/// broadcast stream.
///
/// Drawn from the OS entropy source at session creation; immutable, and with
/// 64 random bits effectively never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientIdentity(u64);

impl ClientIdentity {
    /// Draw a fresh random identity.
    ///
    /// Falls back to a time-derived value if the entropy source fails.
    #[must_use]
    pub fn random() -> Self {
        let mut buf = [0u8; 8];
        if getrandom::getrandom(&mut buf).is_ok() {
            Self(u64::from_le_bytes(buf))
        } else {
            // Fallback to system time
            use std::time::{SystemTime, UNIX_EPOCH};
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x5DEE_CE66);
            Self(nanos)
        }
    }

    /// The raw key value as it appears on the wire.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
