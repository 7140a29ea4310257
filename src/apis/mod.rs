/// Typed clients for the external data providers.
///
/// Every operation in this module fails soft: timeouts, auth failures,
/// malformed payloads and transport errors all collapse to a typed "absent"
/// sentinel (empty list, `None`, zeroed struct). Nothing here panics or
/// propagates an error into the enrichment path.
pub mod client;
pub mod graduated;
pub mod holders;
pub mod moralis;
pub mod pairs;
pub mod swaps;

pub use client::{ApiStats, HttpClient, KeyRing, RateLimiter};
pub use moralis::MoralisTransport;
pub use graduated::{GraduatedClient, GraduatedToken};
pub use holders::{HolderStats, HoldersClient, TopHolder};
pub use pairs::{PairsClient, TokenPair};
pub use swaps::{ProviderSwap, SwapsClient};
