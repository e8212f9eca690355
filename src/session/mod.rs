/*!
 * Server-side session storage.
 *
 * This module provides:
 * - A SQL-backed session provider (read, regenerate, destroy, GC, count)
 * - Lock-guarded per-request session stores
 * - A registry of named providers for the host's session manager
 */

pub mod codec;
pub mod provider;
pub mod registry;
pub mod store;

// Re-export main types
pub use codec::SessionValues;
pub use provider::{Provider, VitessProvider, PROVIDER_NAME};
pub use registry::ProviderRegistry;
pub use store::{SessionStore, Store};

/// Fresh random session identifier
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
