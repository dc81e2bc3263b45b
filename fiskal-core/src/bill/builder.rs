use super::{Bill, BillNumber, PaymentType, Refund, SequenceMark, TaxId, TaxRate};
use crate::validation::{Field, ValidationError, require_text};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// Fields every bill must carry.
#[derive(Debug, Clone)]
pub struct RequiredBillFields {
    pub tax_id: TaxId,
    pub vat_registered: bool,
    pub issued_at: NaiveDateTime,
    pub bill_number: BillNumber,
    pub total: Decimal,
    pub payment_type: PaymentType,
    pub operator_tax_id: TaxId,
}

/// Validating builder for [`Bill`].
///
/// # Examples
/// ```rust
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
/// use fiskal_core::bill::{
///     BillBuilder, BillNumber, PaymentType, RequiredBillFields, TaxId, TaxRate,
/// };
///
/// let issued_at = NaiveDate::from_ymd_opt(2014, 7, 15)
///     .and_then(|d| d.and_hms_opt(20, 0, 0))
///     .expect("valid timestamp");
/// let bill = BillBuilder::new(RequiredBillFields {
///     tax_id: TaxId::parse("32314900695")?,
///     vat_registered: true,
///     issued_at,
///     bill_number: BillNumber::new(1, "ODV1", "1")?,
///     total: dec!(456.10),
///     payment_type: PaymentType::Cash,
///     operator_tax_id: TaxId::parse("34562123431")?,
/// })
/// .vat(TaxRate::new(dec!(25), dec!(400), dec!(100)))
/// .build()?;
/// assert!(!bill.is_sealed());
/// # Ok::<(), fiskal_core::ValidationError>(())
/// ```
pub struct BillBuilder {
    bill: Bill,
}

impl BillBuilder {
    pub fn new(fields: RequiredBillFields) -> Self {
        let RequiredBillFields {
            tax_id,
            vat_registered,
            issued_at,
            bill_number,
            total,
            payment_type,
            operator_tax_id,
        } = fields;
        Self {
            bill: Bill {
                tax_id,
                vat_registered,
                issued_at,
                sequence_mark: None,
                bill_number,
                vat: Vec::new(),
                consumption_tax: Vec::new(),
                other_taxes: Vec::new(),
                tax_free_amount: None,
                margin_amount: None,
                non_taxable_amount: None,
                refunds: Vec::new(),
                total,
                payment_type,
                operator_tax_id,
                security_code: None,
                redelivery: false,
                paragon_number: None,
                specific_purpose: None,
            },
        }
    }

    pub fn sequence_mark(mut self, mark: SequenceMark) -> Self {
        self.bill.sequence_mark = Some(mark);
        self
    }

    pub fn vat(mut self, rate: TaxRate) -> Self {
        self.bill.vat.push(rate);
        self
    }

    pub fn consumption_tax(mut self, rate: TaxRate) -> Self {
        self.bill.consumption_tax.push(rate);
        self
    }

    pub fn other_tax(mut self, rate: TaxRate) -> Self {
        self.bill.other_taxes.push(rate);
        self
    }

    pub fn tax_free_amount(mut self, amount: Decimal) -> Self {
        self.bill.tax_free_amount = Some(amount);
        self
    }

    pub fn margin_amount(mut self, amount: Decimal) -> Self {
        self.bill.margin_amount = Some(amount);
        self
    }

    pub fn non_taxable_amount(mut self, amount: Decimal) -> Self {
        self.bill.non_taxable_amount = Some(amount);
        self
    }

    pub fn refund(mut self, refund: Refund) -> Self {
        self.bill.refunds.push(refund);
        self
    }

    /// Mark the bill as delivered late (`NakDost`), e.g. after a connectivity outage.
    pub fn redelivery(mut self, redelivery: bool) -> Self {
        self.bill.redelivery = redelivery;
        self
    }

    pub fn paragon_number(mut self, number: impl Into<String>) -> Self {
        self.bill.paragon_number = Some(number.into());
        self
    }

    pub fn specific_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.bill.specific_purpose = Some(purpose.into());
        self
    }

    pub fn build(self) -> Result<Bill, ValidationError> {
        let bill = self.bill;

        for rate in bill.vat.iter().chain(&bill.consumption_tax) {
            if rate.name.is_some() {
                return Err(ValidationError::malformed(
                    Field::TaxRate,
                    "VAT and consumption tax entries cannot carry a name",
                ));
            }
        }
        for rate in &bill.other_taxes {
            match rate.name.as_deref() {
                Some(name) => require_text(Field::TaxRate, name)?,
                None => {
                    return Err(ValidationError::malformed(
                        Field::TaxRate,
                        "other tax entries need a name",
                    ));
                }
            }
        }
        for refund in &bill.refunds {
            require_text(Field::Refund, &refund.name)?;
        }
        if let Some(number) = bill.paragon_number.as_deref() {
            require_text(Field::ParagonNumber, number)?;
        }
        if let Some(purpose) = bill.specific_purpose.as_deref() {
            require_text(Field::SpecificPurpose, purpose)?;
        }

        Ok(bill)
    }
}
