//! `quorum-auth`: the access-control core.
//!
//! This crate is intentionally decoupled from HTTP and storage: it consumes a
//! credential extracted from a request plus a requested capability and
//! produces an authorization decision. Transports feed it `Credentials`;
//! storage plugs in through the `PrincipalStore` trait.

pub mod authenticate;
pub mod capability;
pub mod crypto;
pub mod gate;
pub mod policy;
pub mod principal;
pub mod role;
pub mod token;

pub use authenticate::{AccessError, Authenticator, Credentials};
pub use capability::Capability;
pub use crypto::{CryptoError, CryptoService, SecretHash};
pub use gate::{CapabilityRequirement, Gatekeeper};
pub use policy::{PolicyError, RoleConfig, RoleTable};
pub use principal::{Principal, PrincipalStore, StoreError};
pub use role::Role;
pub use token::{AccessClaims, TokenError, TokenService};
