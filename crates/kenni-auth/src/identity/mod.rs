//! National identifiers and local user resolution.

pub mod kennitala;
pub mod resolver;

pub use kennitala::{KennitalaKind, NationalIdError, NationalIdentity, mask_kennitala, parse_kennitala};
pub use resolver::{IdentityResolver, Resolution, ResolutionAction, ResolveError};
