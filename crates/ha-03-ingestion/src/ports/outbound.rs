//! Outbound Ports (Driven Ports)
//!
//! - `Authorizer`: decides whether a reporter may submit (pluggable)
//! - `RebuildTrigger`: asks ha-02 for a new filter after a commit

pub use ha_02_contagion_filter::RebuildTrigger;
use shared_types::Credential;

use crate::domain::AuthError;

/// Proof that a credential was accepted, valid until consumed or released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    /// Authorizer-specific identity of the credential (e.g. its nonce)
    pub id: String,
    /// Unix seconds after which the credential is void anyway
    pub expires_at: i64,
}

/// Capability deciding which reporters may disclose records.
///
/// ## Protocol
///
/// ```text
/// authorize ──ok──> commit ok   ──> consume (credential spent)
///                   commit fail ──> release (credential usable again)
/// ```
///
/// A credential between `authorize` and `consume`/`release` is reserved:
/// a concurrent submission with the same credential is refused.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, credential: &Credential) -> Result<AuthGrant, AuthError>;

    fn consume(&self, grant: AuthGrant);

    fn release(&self, grant: AuthGrant);
}
