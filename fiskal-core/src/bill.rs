//! Fiscal bill model.
mod builder;

pub use builder::{BillBuilder, RequiredBillFields};

use crate::{
    credential::SigningKey,
    security_code::{SecurityCode, SecurityCodeEngine, SecurityCodeFields},
    sign::SigningError,
    validation::{Field, ValidationError},
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Croatian personal or company tax number (OIB).
///
/// # Examples
/// ```rust
/// use fiskal_core::bill::TaxId;
///
/// let oib = TaxId::parse("32314900695")?;
/// assert!(oib.has_valid_checksum());
/// # Ok::<(), fiskal_core::ValidationError>(())
/// ```
///
/// # Errors
/// Returns [`ValidationError::MalformedRecord`] unless the input is exactly 11 ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxId(String);

impl TaxId {
    pub fn parse<S: Into<String>>(s: S) -> Result<Self, ValidationError> {
        let s = s.into().trim().to_string();
        if s.is_empty() {
            return Err(ValidationError::MissingField(Field::TaxId));
        }
        if s.len() != 11 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::malformed(
                Field::TaxId,
                format!("expected 11 digits, got {s:?}"),
            ));
        }
        Ok(TaxId(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ISO 7064 MOD 11,10 control digit check. Not enforced on construction.
    pub fn has_valid_checksum(&self) -> bool {
        let digits: Vec<u32> = self.0.bytes().map(|b| u32::from(b - b'0')).collect();
        let mut acc = 10;
        for d in &digits[..10] {
            acc = (acc + d) % 10;
            if acc == 0 {
                acc = 10;
            }
            acc = (acc * 2) % 11;
        }
        let control = match 11 - acc {
            10 => 0,
            c => c,
        };
        control == digits[10]
    }
}

impl AsRef<str> for TaxId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for TaxId {
    type Err = ValidationError;
    fn from_str(s: &str) -> Result<Self, ValidationError> {
        TaxId::parse(s)
    }
}

impl TryFrom<&str> for TaxId {
    type Error = ValidationError;
    fn try_from(value: &str) -> Result<Self, ValidationError> {
        TaxId::parse(value)
    }
}

/// Bill number: sequence number, business area code and device code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillNumber {
    sequence_number: u64,
    business_area_code: String,
    device_code: String,
}

impl BillNumber {
    pub fn new(
        sequence_number: u64,
        business_area_code: impl Into<String>,
        device_code: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if sequence_number == 0 {
            return Err(ValidationError::malformed(
                Field::SequenceNumber,
                "sequence number must be positive",
            ));
        }
        let business_area_code = business_area_code.into();
        let device_code = device_code.into();
        check_code(Field::BusinessAreaCode, &business_area_code)?;
        check_code(Field::DeviceCode, &device_code)?;
        Ok(Self {
            sequence_number,
            business_area_code,
            device_code,
        })
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn business_area_code(&self) -> &str {
        &self.business_area_code
    }

    pub fn device_code(&self) -> &str {
        &self.device_code
    }
}

pub(crate) fn check_code(field: Field, code: &str) -> Result<(), ValidationError> {
    if code.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::malformed(
            field,
            format!("{code:?} is not alphanumeric"),
        ));
    }
    Ok(())
}

/// One tax line: optional label, rate in percent, base and tax amount.
///
/// Values are kept as given and rounded to cents half away from zero when rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate {
    pub name: Option<String>,
    pub rate: Decimal,
    pub base: Decimal,
    pub amount: Decimal,
}

impl TaxRate {
    /// Unlabeled entry, used for VAT and consumption tax.
    pub fn new(rate: Decimal, base: Decimal, amount: Decimal) -> Self {
        Self {
            name: None,
            rate,
            base,
            amount,
        }
    }

    /// Labeled entry for other levies.
    pub fn named(
        name: impl Into<String>,
        rate: Decimal,
        base: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            name: Some(name.into()),
            rate,
            base,
            amount,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Refund (`Naknada`) line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    pub name: String,
    pub amount: Decimal,
}

impl Refund {
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Payment method (`NacinPlac`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentType {
    Cash,
    Card,
    Cheque,
    BankTransfer,
    Other,
}

impl PaymentType {
    pub fn code(&self) -> &'static str {
        match self {
            PaymentType::Cash => "G",
            PaymentType::Card => "K",
            PaymentType::Cheque => "C",
            PaymentType::BankTransfer => "T",
            PaymentType::Other => "O",
        }
    }
}

/// Sequence numbering scope (`OznSlijed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequenceMark {
    /// Numbered per business area.
    BusinessArea,
    /// Numbered per charging device.
    Device,
}

impl SequenceMark {
    pub fn code(&self) -> &'static str {
        match self {
            SequenceMark::BusinessArea => "P",
            SequenceMark::Device => "N",
        }
    }
}

/// Validated fiscal bill. Immutable once built.
///
/// The security code stays unset until [`Bill::seal`] (or [`Bill::with_security_code`])
/// produces a sealed copy.
#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    tax_id: TaxId,
    vat_registered: bool,
    issued_at: NaiveDateTime,
    sequence_mark: Option<SequenceMark>,
    bill_number: BillNumber,
    vat: Vec<TaxRate>,
    consumption_tax: Vec<TaxRate>,
    other_taxes: Vec<TaxRate>,
    tax_free_amount: Option<Decimal>,
    margin_amount: Option<Decimal>,
    non_taxable_amount: Option<Decimal>,
    refunds: Vec<Refund>,
    total: Decimal,
    payment_type: PaymentType,
    operator_tax_id: TaxId,
    security_code: Option<SecurityCode>,
    redelivery: bool,
    paragon_number: Option<String>,
    specific_purpose: Option<String>,
}

impl Bill {
    pub fn tax_id(&self) -> &TaxId {
        &self.tax_id
    }

    pub fn vat_registered(&self) -> bool {
        self.vat_registered
    }

    pub fn issued_at(&self) -> NaiveDateTime {
        self.issued_at
    }

    pub fn sequence_mark(&self) -> Option<SequenceMark> {
        self.sequence_mark
    }

    pub fn bill_number(&self) -> &BillNumber {
        &self.bill_number
    }

    pub fn vat(&self) -> &[TaxRate] {
        &self.vat
    }

    pub fn consumption_tax(&self) -> &[TaxRate] {
        &self.consumption_tax
    }

    pub fn other_taxes(&self) -> &[TaxRate] {
        &self.other_taxes
    }

    pub fn tax_free_amount(&self) -> Option<Decimal> {
        self.tax_free_amount
    }

    pub fn margin_amount(&self) -> Option<Decimal> {
        self.margin_amount
    }

    pub fn non_taxable_amount(&self) -> Option<Decimal> {
        self.non_taxable_amount
    }

    pub fn refunds(&self) -> &[Refund] {
        &self.refunds
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn payment_type(&self) -> PaymentType {
        self.payment_type
    }

    pub fn operator_tax_id(&self) -> &TaxId {
        &self.operator_tax_id
    }

    pub fn security_code(&self) -> Option<&SecurityCode> {
        self.security_code.as_ref()
    }

    pub fn redelivery(&self) -> bool {
        self.redelivery
    }

    pub fn paragon_number(&self) -> Option<&str> {
        self.paragon_number.as_deref()
    }

    pub fn specific_purpose(&self) -> Option<&str> {
        self.specific_purpose.as_deref()
    }

    pub fn is_sealed(&self) -> bool {
        self.security_code.is_some()
    }

    pub fn with_security_code(self, security_code: SecurityCode) -> Bill {
        Bill {
            security_code: Some(security_code),
            ..self
        }
    }

    /// Compute the security code from this bill's fields and return the sealed bill.
    pub fn seal<E: SecurityCodeEngine + ?Sized>(
        self,
        engine: &E,
        key: &SigningKey,
    ) -> Result<Bill, SigningError> {
        let code = engine.compute(key, &SecurityCodeFields::from(&self))?;
        debug!(
            sequence_number = self.bill_number.sequence_number,
            business_area = %self.bill_number.business_area_code,
            device = %self.bill_number.device_code,
            "bill sealed"
        );
        Ok(self.with_security_code(code))
    }
}
