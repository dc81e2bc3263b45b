//! Issuer security code (ZKI).
use crate::{
    bill::Bill,
    credential::SigningKey,
    sign::SigningError,
    validation::{Field, ValidationError},
    xml::{FixedPrecision, constants::DATE_TIME_FORMAT},
};
use chrono::NaiveDateTime;
use md5::{Digest, Md5};
use rust_decimal::Decimal;
use std::fmt;
use tracing::debug;

/// 32 lower-case hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityCode(String);

impl SecurityCode {
    pub fn parse(s: impl Into<String>) -> Result<Self, ValidationError> {
        let s = s.into();
        if s.len() != 32 || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(ValidationError::malformed(
                Field::SecurityCode,
                "expected 32 lower-case hex characters",
            ));
        }
        Ok(SecurityCode(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered inputs of the security code.
#[derive(Debug, Clone, Copy)]
pub struct SecurityCodeFields<'a> {
    pub tax_id: &'a str,
    pub issued_at: NaiveDateTime,
    pub sequence_number: u64,
    pub business_area_code: &'a str,
    pub device_code: &'a str,
    pub total: Decimal,
}

impl SecurityCodeFields<'_> {
    /// Signed input: all fields joined without separators, total rounded to cents
    /// exactly as it appears in the rendered bill.
    pub fn concatenated(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.tax_id,
            self.issued_at.format(DATE_TIME_FORMAT),
            self.sequence_number,
            self.business_area_code,
            self.device_code,
            FixedPrecision::amount(self.total)
        )
    }
}

impl<'a> From<&'a Bill> for SecurityCodeFields<'a> {
    fn from(bill: &'a Bill) -> Self {
        let number = bill.bill_number();
        Self {
            tax_id: bill.tax_id().as_str(),
            issued_at: bill.issued_at(),
            sequence_number: number.sequence_number(),
            business_area_code: number.business_area_code(),
            device_code: number.device_code(),
            total: bill.total(),
        }
    }
}

/// Derives security codes from a private key.
pub trait SecurityCodeEngine {
    fn compute(
        &self,
        key: &SigningKey,
        fields: &SecurityCodeFields<'_>,
    ) -> Result<SecurityCode, SigningError>;
}

/// RSA-SHA1 signature of the concatenated fields, hashed with MD5 and hex encoded.
///
/// # Examples
/// ```rust,no_run
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
/// use fiskal_core::credential::Credential;
/// use fiskal_core::security_code::{RsaSecurityCodeEngine, SecurityCodeEngine, SecurityCodeFields};
///
/// let credential = Credential::from_pkcs12_file("fiskal.p12", "secret")?;
/// let fields = SecurityCodeFields {
///     tax_id: "32314900695",
///     issued_at: NaiveDate::from_ymd_opt(2014, 7, 15)
///         .and_then(|d| d.and_hms_opt(20, 0, 0))
///         .expect("valid timestamp"),
///     sequence_number: 1,
///     business_area_code: "ODV1",
///     device_code: "1",
///     total: dec!(456.10),
/// };
/// let code = RsaSecurityCodeEngine.compute(credential.signing_key(), &fields)?;
/// assert_eq!(code.as_str().len(), 32);
/// # Ok::<(), fiskal_core::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RsaSecurityCodeEngine;

impl SecurityCodeEngine for RsaSecurityCodeEngine {
    fn compute(
        &self,
        key: &SigningKey,
        fields: &SecurityCodeFields<'_>,
    ) -> Result<SecurityCode, SigningError> {
        let signature = key.sign_sha1(fields.concatenated().as_bytes())?;
        let code = hex::encode(Md5::digest(&signature));
        debug!(tax_id = fields.tax_id, "security code computed");
        Ok(SecurityCode(code))
    }
}
