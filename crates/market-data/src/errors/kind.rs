/// Classification of a provider failure.
///
/// The orchestrator picks a client's cooldown duration by matching on this
/// value, never by inspecting error text.
///
/// | Kind | Typical cause | Default cooldown |
/// |------|---------------|------------------|
/// | `Transient` | timeout, connection reset, 5xx | 180s |
/// | `RateLimited` | HTTP 429, provider quota message | 300s |
/// | `InvalidResponse` | undecodable body, missing price, empty history | 180s |
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FailureKind {
    /// Network-level or server-side failure that may clear up on its own.
    Transient,

    /// The upstream explicitly throttled us.
    RateLimited,

    /// The upstream answered, but not with anything usable.
    InvalidResponse,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transient => write!(f, "Transient"),
            Self::RateLimited => write!(f, "RateLimited"),
            Self::InvalidResponse => write!(f, "InvalidResponse"),
        }
    }
}
