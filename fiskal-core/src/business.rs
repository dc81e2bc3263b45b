//! Business premises (`PoslovniProstor`) registration data.
use crate::{
    bill::{TaxId, check_code},
    validation::{Field, ValidationError, require_text},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Street address of a business area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub house_number: String,
    pub house_number_suffix: Option<String>,
    pub postal_code: String,
    pub settlement: String,
    pub municipality: String,
}

impl Address {
    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn house_number(&self) -> &str {
        &self.house_number
    }

    pub fn house_number_suffix(&self) -> Option<&str> {
        self.house_number_suffix.as_deref()
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn settlement(&self) -> &str {
        &self.settlement
    }

    pub fn municipality(&self) -> &str {
        &self.municipality
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require_text(Field::Street, &self.street)?;
        require_text(Field::HouseNumber, &self.house_number)?;
        if let Some(suffix) = self.house_number_suffix.as_deref() {
            require_text(Field::HouseNumber, suffix)?;
        }
        require_text(Field::PostalCode, &self.postal_code)?;
        if !self.postal_code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::malformed(
                Field::PostalCode,
                format!("{:?} is not numeric", self.postal_code),
            ));
        }
        require_text(Field::Settlement, &self.settlement)?;
        require_text(Field::Municipality, &self.municipality)
    }
}

/// Location of a business area: a street address or another premises type
/// such as a mobile shop or an internet store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressData {
    Address(Address),
    Other(String),
}

/// Closing mark (`OznakaZatvaranja`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosingMark {
    Closed,
}

impl ClosingMark {
    pub fn code(&self) -> &'static str {
        match self {
            ClosingMark::Closed => "Z",
        }
    }
}

/// Registered business area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessArea {
    tax_id: TaxId,
    code: String,
    address: AddressData,
    working_hours: String,
    usage_date: NaiveDate,
    closing_mark: Option<ClosingMark>,
    specific_purpose: Option<String>,
}

impl BusinessArea {
    pub fn builder(
        tax_id: TaxId,
        code: impl Into<String>,
        address: AddressData,
        working_hours: impl Into<String>,
        usage_date: NaiveDate,
    ) -> BusinessAreaBuilder {
        BusinessAreaBuilder {
            area: BusinessArea {
                tax_id,
                code: code.into(),
                address,
                working_hours: working_hours.into(),
                usage_date,
                closing_mark: None,
                specific_purpose: None,
            },
        }
    }

    pub fn tax_id(&self) -> &TaxId {
        &self.tax_id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn address(&self) -> &AddressData {
        &self.address
    }

    pub fn working_hours(&self) -> &str {
        &self.working_hours
    }

    pub fn usage_date(&self) -> NaiveDate {
        self.usage_date
    }

    pub fn closing_mark(&self) -> Option<ClosingMark> {
        self.closing_mark
    }

    pub fn specific_purpose(&self) -> Option<&str> {
        self.specific_purpose.as_deref()
    }
}

/// Builder for [`BusinessArea`].
///
/// # Examples
/// ```rust
/// use chrono::NaiveDate;
/// use fiskal_core::bill::TaxId;
/// use fiskal_core::business::{AddressData, BusinessArea};
///
/// let area = BusinessArea::builder(
///     TaxId::parse("32314900695")?,
///     "WEB1",
///     AddressData::Other("Internet trgovina".into()),
///     "0-24",
///     NaiveDate::from_ymd_opt(2014, 7, 15).expect("valid date"),
/// )
/// .build()?;
/// assert_eq!(area.code(), "WEB1");
/// # Ok::<(), fiskal_core::ValidationError>(())
/// ```
pub struct BusinessAreaBuilder {
    area: BusinessArea,
}

impl BusinessAreaBuilder {
    pub fn closing_mark(mut self, mark: ClosingMark) -> Self {
        self.area.closing_mark = Some(mark);
        self
    }

    pub fn specific_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.area.specific_purpose = Some(purpose.into());
        self
    }

    pub fn build(self) -> Result<BusinessArea, ValidationError> {
        let area = self.area;
        check_code(Field::BusinessAreaCode, &area.code)?;
        match &area.address {
            AddressData::Address(address) => address.validate()?,
            AddressData::Other(kind) => require_text(Field::OtherPremisesType, kind)?,
        }
        require_text(Field::WorkingHours, &area.working_hours)?;
        if let Some(purpose) = area.specific_purpose.as_deref() {
            require_text(Field::SpecificPurpose, purpose)?;
        }
        Ok(area)
    }
}
