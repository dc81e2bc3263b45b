//! Rust toolkit for Croatian fiscalization (CIS): credential loading, security codes (ZKI),
//! signed XML requests and reply parsing.
//!
//! # Examples
//! ```rust
//! use fiskal_core::config::{Config, EnvironmentType};
//!
//! let config = Config::new(EnvironmentType::Test);
//! assert!(config.endpoint_url().starts_with("https://cistest"));
//! ```
pub mod api;
pub mod bill;
pub mod business;
pub mod config;
pub mod credential;
pub mod security_code;
pub mod session;
pub mod sign;
pub mod validation;
pub mod xml;

pub use api::{ProtocolClient, ResponseOutcome, Transport, TransportError};
pub use credential::{Credential, CredentialError, CredentialStore, Pkcs12Store};
pub use security_code::{RsaSecurityCodeEngine, SecurityCode, SecurityCodeEngine};
pub use session::Session;
pub use sign::{EnvelopedSigner, SigningError, XmlSigner};
pub use validation::ValidationError;
pub use xml::{CanonicalXml, DocumentError, SignedXml, ToXml};

use thiserror::Error;

/// Top-level error wrapper for pipeline operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Document(DocumentError),
    #[error(transparent)]
    Signing(#[from] SigningError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

// Validation failures found while rendering are reported as validation errors,
// so callers can branch on them without unwrapping the document layer.
impl From<DocumentError> for Error {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Validation(inner) => Error::Validation(inner),
            other => Error::Document(other),
        }
    }
}
