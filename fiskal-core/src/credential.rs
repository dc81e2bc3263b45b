//! Signing credentials loaded from PKCS#12 containers.
use crate::sign::SigningError;
use openssl::{
    hash::MessageDigest,
    pkcs12::Pkcs12,
    pkey::{Id, PKey, Private},
    sign::Signer,
    x509::X509,
};
use std::{fmt, path::Path};
use thiserror::Error;
use tracing::{debug, warn};

/// Credential loading errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential container is unreadable: {0}")]
    Unreadable(String),
    #[error("wrong passphrase or corrupted container")]
    BadPassphrase,
    #[error("credential container has no {0}")]
    Incomplete(&'static str),
    #[error("certificate does not belong to the private key")]
    KeyMismatch,
}

/// Opaque private key handle.
///
/// The only thing it can do is sign on behalf of this crate; key bytes are never exposed.
#[derive(Clone)]
pub struct SigningKey(PKey<Private>);

impl SigningKey {
    /// RSA PKCS#1 v1.5 signature over SHA-1.
    pub(crate) fn sign_sha1(&self, data: &[u8]) -> Result<Vec<u8>, SigningError> {
        if self.0.id() != Id::RSA {
            return Err(SigningError::KeyUnavailable(
                "signing key is not an RSA key".into(),
            ));
        }
        let mut signer = Signer::new(MessageDigest::sha1(), &self.0)
            .map_err(|e| SigningError::KeyUnavailable(e.to_string()))?;
        signer
            .update(data)
            .map_err(|e| SigningError::KeyUnavailable(e.to_string()))?;
        signer
            .sign_to_vec()
            .map_err(|e| SigningError::KeyUnavailable(e.to_string()))
    }

    pub fn bits(&self) -> u32 {
        self.0.bits()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("bits", &self.0.bits())
            .finish_non_exhaustive()
    }
}

/// Private key plus signer certificate.
///
/// # Examples
/// ```rust,no_run
/// use fiskal_core::credential::Credential;
///
/// let credential = Credential::from_pkcs12_file("fiskal.p12", "secret")?;
/// let _ = credential.certificate();
/// # Ok::<(), fiskal_core::CredentialError>(())
/// ```
#[derive(Clone)]
pub struct Credential {
    key: SigningKey,
    certificate: X509,
}

impl Credential {
    /// Pair a key and certificate, rejecting certificates issued for another key.
    fn new(key: PKey<Private>, certificate: X509) -> Result<Self, CredentialError> {
        let public = certificate
            .public_key()
            .map_err(|e| CredentialError::Unreadable(e.to_string()))?;
        if !key.public_eq(&public) {
            return Err(CredentialError::KeyMismatch);
        }
        Ok(Self {
            key: SigningKey(key),
            certificate,
        })
    }

    pub fn from_pkcs12(container: &[u8], passphrase: &str) -> Result<Self, CredentialError> {
        let pkcs12 = Pkcs12::from_der(container)
            .map_err(|e| CredentialError::Unreadable(e.to_string()))?;
        let parsed = pkcs12.parse2(passphrase).map_err(|e| {
            debug!(error = %e, "pkcs12 decryption failed");
            CredentialError::BadPassphrase
        })?;
        let key = parsed.pkey.ok_or(CredentialError::Incomplete("private key"))?;
        let certificate = parsed.cert.ok_or(CredentialError::Incomplete("certificate"))?;
        Self::new(key, certificate)
    }

    pub fn from_pkcs12_file(
        path: impl AsRef<Path>,
        passphrase: &str,
    ) -> Result<Self, CredentialError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            warn!(path = %path.display(), "cannot read credential container");
            CredentialError::Unreadable(format!("{}: {e}", path.display()))
        })?;
        Self::from_pkcs12(&bytes, passphrase)
    }

    /// Build from a PEM certificate and a PEM private key (PKCS#8 or PKCS#1).
    pub fn from_pem(certificate_pem: &[u8], key_pem: &[u8]) -> Result<Self, CredentialError> {
        let certificate = X509::from_pem(certificate_pem)
            .map_err(|e| CredentialError::Unreadable(format!("certificate: {e}")))?;
        let key = PKey::private_key_from_pem(key_pem)
            .map_err(|e| CredentialError::Unreadable(format!("private key: {e}")))?;
        Self::new(key, certificate)
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }

    pub fn certificate_der(&self) -> Result<Vec<u8>, SigningError> {
        self.certificate
            .to_der()
            .map_err(|e| SigningError::Certificate(e.to_string()))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.key)
            .field("subject", &self.certificate.subject_name())
            .finish()
    }
}

/// Source of signing credentials.
pub trait CredentialStore {
    fn load(&self, container: &[u8], passphrase: &str) -> Result<Credential, CredentialError>;
}

/// PKCS#12 (`.p12` / `.pfx`) credential store.
///
/// Containers protected with legacy RC2 encryption need the OpenSSL legacy provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pkcs12Store;

impl Pkcs12Store {
    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        passphrase: &str,
    ) -> Result<Credential, CredentialError> {
        Credential::from_pkcs12_file(path, passphrase)
    }
}

impl CredentialStore for Pkcs12Store {
    fn load(&self, container: &[u8], passphrase: &str) -> Result<Credential, CredentialError> {
        Credential::from_pkcs12(container, passphrase)
    }
}
