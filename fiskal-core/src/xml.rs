//! XML rendering of fiscalization requests.
use crate::{
    bill::{Bill, Refund, TaxRate},
    business::{Address, AddressData, BusinessArea},
    security_code::SecurityCode,
    validation::ValidationError,
};
use chrono::{Local, NaiveDateTime};
use constants::{
    BILL_REQUEST_ID, BUSINESS_AREA_REQUEST_ID, DATE_FORMAT, DATE_TIME_FORMAT, TYPES_NS,
};
pub(crate) use helpers::FixedPrecision;
use quick_xml::se::{SeError, Serializer as QuickXmlSerializer};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub(crate) mod constants;

/// Request rendering error.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("failed to serialize request to XML: {source}")]
    Serialize {
        #[from]
        source: SeError,
    },
}

/// Unsigned request document, ready for the signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalXml(String);

impl CanonicalXml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for CanonicalXml {
    fn from(xml: String) -> Self {
        CanonicalXml(xml)
    }
}

/// Request document carrying an enveloped signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedXml(String);

impl SignedXml {
    /// Wrap a document signed elsewhere, e.g. by an external [`XmlSigner`](crate::sign::XmlSigner).
    pub fn new(xml: String) -> Self {
        SignedXml(xml)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SignedXml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message header (`Zaglavlje`) shared by all requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub message_id: Uuid,
    pub sent_at: NaiveDateTime,
}

impl RequestHeader {
    /// Fresh v4 message id stamped with the local time.
    pub fn now() -> Self {
        Self {
            message_id: Uuid::new_v4(),
            sent_at: Local::now().naive_local(),
        }
    }

    pub fn new(message_id: Uuid, sent_at: NaiveDateTime) -> Self {
        Self {
            message_id,
            sent_at,
        }
    }
}

/// Render records to XML.
///
/// # Examples
/// ```rust,no_run
/// use fiskal_core::bill::Bill;
/// use fiskal_core::xml::{BillRequest, ToXml};
///
/// let bill: Bill = unimplemented!();
/// let xml = BillRequest::new(&bill).to_xml()?;
/// # let _ = xml;
/// # Ok::<(), fiskal_core::xml::DocumentError>(())
/// ```
pub trait ToXml {
    fn to_xml(&self) -> Result<CanonicalXml, DocumentError>;
}

/// Bill fiscalization request (`RacunZahtjev`).
#[derive(Debug, Clone, Copy)]
pub struct BillRequest<'a> {
    header: RequestHeader,
    bill: &'a Bill,
}

impl<'a> BillRequest<'a> {
    pub fn new(bill: &'a Bill) -> Self {
        Self::with_header(bill, RequestHeader::now())
    }

    pub fn with_header(bill: &'a Bill, header: RequestHeader) -> Self {
        Self { header, bill }
    }

    pub fn header(&self) -> &RequestHeader {
        &self.header
    }
}

impl ToXml for BillRequest<'_> {
    fn to_xml(&self) -> Result<CanonicalXml, DocumentError> {
        let security_code = self
            .bill
            .security_code()
            .ok_or(ValidationError::MissingSecurityCode)?;
        render(&BillRequestXml {
            header: &self.header,
            bill: self.bill,
            security_code,
        })
    }
}

/// Business area registration request (`PoslovniProstorZahtjev`).
#[derive(Debug, Clone, Copy)]
pub struct BusinessAreaRequest<'a> {
    header: RequestHeader,
    area: &'a BusinessArea,
}

impl<'a> BusinessAreaRequest<'a> {
    pub fn new(area: &'a BusinessArea) -> Self {
        Self::with_header(area, RequestHeader::now())
    }

    pub fn with_header(area: &'a BusinessArea, header: RequestHeader) -> Self {
        Self { header, area }
    }

    pub fn header(&self) -> &RequestHeader {
        &self.header
    }
}

impl ToXml for BusinessAreaRequest<'_> {
    fn to_xml(&self) -> Result<CanonicalXml, DocumentError> {
        render(&BusinessAreaRequestXml {
            header: &self.header,
            area: self.area,
        })
    }
}

fn render<T: Serialize>(value: &T) -> Result<CanonicalXml, DocumentError> {
    let mut buffer = String::with_capacity(2048);
    value.serialize(QuickXmlSerializer::new(&mut buffer))?;
    Ok(CanonicalXml(buffer))
}

mod helpers {
    use rust_decimal::{Decimal, RoundingStrategy};
    use serde::ser::{Serialize, Serializer};
    use std::fmt::{self, Display, Formatter};

    /// Decimal rendered with a fixed number of fractional digits, ties rounded
    /// away from zero.
    pub(crate) struct FixedPrecision {
        value: Decimal,
        precision: usize,
    }

    impl FixedPrecision {
        pub(crate) fn amount(value: Decimal) -> Self {
            let mut value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            // -0.004 rounds to a signed zero
            if value.is_zero() {
                value.set_sign_positive(true);
            }
            Self {
                value,
                precision: 2,
            }
        }
    }

    impl Display for FixedPrecision {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            write!(f, "{:.*}", self.precision, self.value)
        }
    }

    impl Serialize for FixedPrecision {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.collect_str(self)
        }
    }
}

struct HeaderXml<'a>(&'a RequestHeader);

impl Serialize for HeaderXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct("tns:Zaglavlje", 2)?;
        st.serialize_field("tns:IdPoruke", &self.0.message_id.to_string())?;
        st.serialize_field(
            "tns:DatumVrijeme",
            &self.0.sent_at.format(DATE_TIME_FORMAT).to_string(),
        )?;
        st.end()
    }
}

struct BillRequestXml<'a> {
    header: &'a RequestHeader,
    bill: &'a Bill,
    security_code: &'a SecurityCode,
}

impl Serialize for BillRequestXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut root = s.serialize_struct("tns:RacunZahtjev", 0)?;
        root.serialize_field("@xmlns:tns", TYPES_NS)?;
        root.serialize_field("@Id", BILL_REQUEST_ID)?;
        root.serialize_field("tns:Zaglavlje", &HeaderXml(self.header))?;
        root.serialize_field(
            "tns:Racun",
            &BillXml {
                bill: self.bill,
                security_code: self.security_code,
            },
        )?;
        root.end()
    }
}

struct BillXml<'a> {
    bill: &'a Bill,
    security_code: &'a SecurityCode,
}

impl Serialize for BillXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let bill = self.bill;
        let number = bill.bill_number();
        let mut st = s.serialize_struct("tns:Racun", 0)?;

        st.serialize_field("tns:Oib", bill.tax_id().as_str())?;
        st.serialize_field("tns:USustPdv", &bill.vat_registered())?;
        st.serialize_field(
            "tns:DatVrijeme",
            &bill.issued_at().format(DATE_TIME_FORMAT).to_string(),
        )?;
        if let Some(mark) = bill.sequence_mark() {
            st.serialize_field("tns:OznSlijed", mark.code())?;
        }
        st.serialize_field("tns:BrRac", &BillNumberXml(number))?;

        // ---- taxes ----
        if !bill.vat().is_empty() {
            st.serialize_field("tns:Pdv", &TaxListXml("tns:Pdv", bill.vat()))?;
        }
        if !bill.consumption_tax().is_empty() {
            st.serialize_field("tns:Pnp", &TaxListXml("tns:Pnp", bill.consumption_tax()))?;
        }
        if !bill.other_taxes().is_empty() {
            st.serialize_field(
                "tns:OstaliPor",
                &TaxListXml("tns:OstaliPor", bill.other_taxes()),
            )?;
        }

        // ---- amounts ----
        if let Some(amount) = bill.tax_free_amount() {
            st.serialize_field("tns:IznosOslobPdv", &FixedPrecision::amount(amount))?;
        }
        if let Some(amount) = bill.margin_amount() {
            st.serialize_field("tns:IznosMarza", &FixedPrecision::amount(amount))?;
        }
        if let Some(amount) = bill.non_taxable_amount() {
            st.serialize_field("tns:IznosNePodlOpor", &FixedPrecision::amount(amount))?;
        }
        if !bill.refunds().is_empty() {
            st.serialize_field("tns:Naknade", &RefundListXml(bill.refunds()))?;
        }
        st.serialize_field("tns:IznosUkupno", &FixedPrecision::amount(bill.total()))?;

        st.serialize_field("tns:NacinPlac", bill.payment_type().code())?;
        st.serialize_field("tns:OibOper", bill.operator_tax_id().as_str())?;
        st.serialize_field("tns:ZastKod", self.security_code.as_str())?;
        st.serialize_field("tns:NakDost", &bill.redelivery())?;
        if let Some(number) = bill.paragon_number() {
            st.serialize_field("tns:ParagonBrRac", number)?;
        }
        if let Some(purpose) = bill.specific_purpose() {
            st.serialize_field("tns:SpecNamj", purpose)?;
        }
        st.end()
    }
}

struct BillNumberXml<'a>(&'a crate::bill::BillNumber);

impl Serialize for BillNumberXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct("tns:BrRac", 3)?;
        st.serialize_field("tns:BrOznRac", &self.0.sequence_number())?;
        st.serialize_field("tns:OznPosPr", self.0.business_area_code())?;
        st.serialize_field("tns:OznNapUr", self.0.device_code())?;
        st.end()
    }
}

struct TaxListXml<'a>(&'static str, &'a [TaxRate]);

impl Serialize for TaxListXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries: Vec<TaxRateXml<'_>> = self.1.iter().map(TaxRateXml).collect();
        let mut st = s.serialize_struct(self.0, 1)?;
        st.serialize_field("tns:Porez", &entries)?;
        st.end()
    }
}

struct TaxRateXml<'a>(&'a TaxRate);

impl Serialize for TaxRateXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let rate = self.0;
        let mut st = s.serialize_struct("tns:Porez", 4)?;
        if let Some(name) = rate.name() {
            st.serialize_field("tns:Naziv", name)?;
        }
        st.serialize_field("tns:Stopa", &FixedPrecision::amount(rate.rate))?;
        st.serialize_field("tns:Osnovica", &FixedPrecision::amount(rate.base))?;
        st.serialize_field("tns:Iznos", &FixedPrecision::amount(rate.amount))?;
        st.end()
    }
}

struct RefundListXml<'a>(&'a [Refund]);

impl Serialize for RefundListXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries: Vec<RefundXml<'_>> = self.0.iter().map(RefundXml).collect();
        let mut st = s.serialize_struct("tns:Naknade", 1)?;
        st.serialize_field("tns:Naknada", &entries)?;
        st.end()
    }
}

struct RefundXml<'a>(&'a Refund);

impl Serialize for RefundXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct("tns:Naknada", 2)?;
        st.serialize_field("tns:NazivN", &self.0.name)?;
        st.serialize_field("tns:IznosN", &FixedPrecision::amount(self.0.amount))?;
        st.end()
    }
}

struct BusinessAreaRequestXml<'a> {
    header: &'a RequestHeader,
    area: &'a BusinessArea,
}

impl Serialize for BusinessAreaRequestXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut root = s.serialize_struct("tns:PoslovniProstorZahtjev", 0)?;
        root.serialize_field("@xmlns:tns", TYPES_NS)?;
        root.serialize_field("@Id", BUSINESS_AREA_REQUEST_ID)?;
        root.serialize_field("tns:Zaglavlje", &HeaderXml(self.header))?;
        root.serialize_field("tns:PoslovniProstor", &BusinessAreaXml(self.area))?;
        root.end()
    }
}

struct BusinessAreaXml<'a>(&'a BusinessArea);

impl Serialize for BusinessAreaXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let area = self.0;
        let mut st = s.serialize_struct("tns:PoslovniProstor", 0)?;
        st.serialize_field("tns:Oib", area.tax_id().as_str())?;
        st.serialize_field("tns:OznPoslProstora", area.code())?;
        st.serialize_field("tns:AdresniPodatak", &AddressDataXml(area.address()))?;
        st.serialize_field("tns:RadnoVrijeme", area.working_hours())?;
        st.serialize_field(
            "tns:DatumPocetkaPrimjene",
            &area.usage_date().format(DATE_FORMAT).to_string(),
        )?;
        if let Some(mark) = area.closing_mark() {
            st.serialize_field("tns:OznakaZatvaranja", mark.code())?;
        }
        if let Some(purpose) = area.specific_purpose() {
            st.serialize_field("tns:SpecNamj", purpose)?;
        }
        st.end()
    }
}

struct AddressDataXml<'a>(&'a AddressData);

impl Serialize for AddressDataXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut st = s.serialize_struct("tns:AdresniPodatak", 1)?;
        match self.0 {
            AddressData::Address(address) => {
                st.serialize_field("tns:Adresa", &AddressXml(address))?;
            }
            AddressData::Other(kind) => {
                st.serialize_field("tns:OstaliTipoviPP", kind)?;
            }
        }
        st.end()
    }
}

struct AddressXml<'a>(&'a Address);

impl Serialize for AddressXml<'_> {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let address = self.0;
        let mut st = s.serialize_struct("tns:Adresa", 6)?;
        st.serialize_field("tns:Ulica", address.street())?;
        st.serialize_field("tns:KucniBroj", address.house_number())?;
        if let Some(suffix) = address.house_number_suffix() {
            st.serialize_field("tns:KucniBrojDodatak", suffix)?;
        }
        st.serialize_field("tns:BrojPoste", address.postal_code())?;
        st.serialize_field("tns:Naselje", address.settlement())?;
        st.serialize_field("tns:Opcina", address.municipality())?;
        st.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::{
        BillBuilder, BillNumber, PaymentType, RequiredBillFields, SequenceMark, TaxId,
    };
    use crate::business::ClosingMark;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const MESSAGE_ID: &str = "5c6c0f4e-3d2b-4f8a-9b1e-2a7d4c9e8f10";

    fn header() -> RequestHeader {
        RequestHeader::new(
            Uuid::parse_str(MESSAGE_ID).expect("uuid"),
            NaiveDate::from_ymd_opt(2014, 7, 15)
                .and_then(|d| d.and_hms_opt(20, 0, 5))
                .expect("timestamp"),
        )
    }

    fn bill() -> Bill {
        BillBuilder::new(RequiredBillFields {
            tax_id: TaxId::parse("32314900695").expect("oib"),
            vat_registered: true,
            issued_at: NaiveDate::from_ymd_opt(2014, 7, 15)
                .and_then(|d| d.and_hms_opt(20, 0, 0))
                .expect("timestamp"),
            bill_number: BillNumber::new(1, "ODV1", "1").expect("bill number"),
            total: dec!(456.1),
            payment_type: PaymentType::Cash,
            operator_tax_id: TaxId::parse("34562123431").expect("operator oib"),
        })
        .sequence_mark(SequenceMark::BusinessArea)
        .vat(TaxRate::new(dec!(25.1), dec!(400.1), dec!(20.1)))
        .vat(TaxRate::new(dec!(10.1), dec!(500.1), dec!(15.444)))
        .consumption_tax(TaxRate::new(dec!(30.1), dec!(100.1), dec!(10.1)))
        .other_tax(TaxRate::named("Naziv1", dec!(40.1), dec!(453.3), dec!(12.1)))
        .tax_free_amount(dec!(23.5))
        .margin_amount(dec!(32))
        .non_taxable_amount(dec!(5.1))
        .refund(Refund::new("Naziv naknade", dec!(5.44)))
        .build()
        .expect("bill")
    }

    fn sealed_bill() -> Bill {
        bill().with_security_code(
            SecurityCode::parse("ca58f4eb5c1b437a4f5f321141b9aeb0").expect("code"),
        )
    }

    #[test]
    fn unsealed_bill_is_rejected() {
        let bill = bill();
        let err = BillRequest::with_header(&bill, header())
            .to_xml()
            .expect_err("unsealed");
        assert!(matches!(
            err,
            DocumentError::Validation(ValidationError::MissingSecurityCode)
        ));
    }

    #[test]
    fn bill_request_golden() {
        let bill = sealed_bill();
        let xml = BillRequest::with_header(&bill, header())
            .to_xml()
            .expect("render");
        let expected = concat!(
            r#"<tns:RacunZahtjev xmlns:tns="http://www.apis-it.hr/fin/2012/types/f73" Id="RacunZahtjev">"#,
            "<tns:Zaglavlje>",
            "<tns:IdPoruke>5c6c0f4e-3d2b-4f8a-9b1e-2a7d4c9e8f10</tns:IdPoruke>",
            "<tns:DatumVrijeme>15.07.2014T20:00:05</tns:DatumVrijeme>",
            "</tns:Zaglavlje>",
            "<tns:Racun>",
            "<tns:Oib>32314900695</tns:Oib>",
            "<tns:USustPdv>true</tns:USustPdv>",
            "<tns:DatVrijeme>15.07.2014T20:00:00</tns:DatVrijeme>",
            "<tns:OznSlijed>P</tns:OznSlijed>",
            "<tns:BrRac><tns:BrOznRac>1</tns:BrOznRac><tns:OznPosPr>ODV1</tns:OznPosPr><tns:OznNapUr>1</tns:OznNapUr></tns:BrRac>",
            "<tns:Pdv>",
            "<tns:Porez><tns:Stopa>25.10</tns:Stopa><tns:Osnovica>400.10</tns:Osnovica><tns:Iznos>20.10</tns:Iznos></tns:Porez>",
            "<tns:Porez><tns:Stopa>10.10</tns:Stopa><tns:Osnovica>500.10</tns:Osnovica><tns:Iznos>15.44</tns:Iznos></tns:Porez>",
            "</tns:Pdv>",
            "<tns:Pnp>",
            "<tns:Porez><tns:Stopa>30.10</tns:Stopa><tns:Osnovica>100.10</tns:Osnovica><tns:Iznos>10.10</tns:Iznos></tns:Porez>",
            "</tns:Pnp>",
            "<tns:OstaliPor>",
            "<tns:Porez><tns:Naziv>Naziv1</tns:Naziv><tns:Stopa>40.10</tns:Stopa><tns:Osnovica>453.30</tns:Osnovica><tns:Iznos>12.10</tns:Iznos></tns:Porez>",
            "</tns:OstaliPor>",
            "<tns:IznosOslobPdv>23.50</tns:IznosOslobPdv>",
            "<tns:IznosMarza>32.00</tns:IznosMarza>",
            "<tns:IznosNePodlOpor>5.10</tns:IznosNePodlOpor>",
            "<tns:Naknade><tns:Naknada><tns:NazivN>Naziv naknade</tns:NazivN><tns:IznosN>5.44</tns:IznosN></tns:Naknada></tns:Naknade>",
            "<tns:IznosUkupno>456.10</tns:IznosUkupno>",
            "<tns:NacinPlac>G</tns:NacinPlac>",
            "<tns:OibOper>34562123431</tns:OibOper>",
            "<tns:ZastKod>ca58f4eb5c1b437a4f5f321141b9aeb0</tns:ZastKod>",
            "<tns:NakDost>false</tns:NakDost>",
            "</tns:Racun>",
            "</tns:RacunZahtjev>",
        );
        assert_eq!(xml.as_str(), expected);
    }

    #[test]
    fn optional_bill_blocks_are_omitted() {
        let bill = BillBuilder::new(RequiredBillFields {
            tax_id: TaxId::parse("32314900695").expect("oib"),
            vat_registered: false,
            issued_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .and_then(|d| d.and_hms_opt(9, 5, 0))
                .expect("timestamp"),
            bill_number: BillNumber::new(7, "POS2", "3").expect("bill number"),
            total: dec!(10),
            payment_type: PaymentType::Card,
            operator_tax_id: TaxId::parse("32314900695").expect("operator oib"),
        })
        .redelivery(true)
        .paragon_number("123/458/5")
        .specific_purpose("Bilješka & napomena")
        .build()
        .expect("bill")
        .with_security_code(
            SecurityCode::parse("08ade226a91c6d6b8ca5eddda23deffd").expect("code"),
        );
        let xml = BillRequest::with_header(&bill, header())
            .to_xml()
            .expect("render")
            .into_string();

        for absent in [
            "OznSlijed",
            "<tns:Pdv>",
            "Pnp",
            "OstaliPor",
            "IznosOslobPdv",
            "IznosMarza",
            "IznosNePodlOpor",
            "Naknade",
        ] {
            assert!(!xml.contains(absent), "unexpected {absent} in {xml}");
        }
        assert!(xml.contains("<tns:USustPdv>false</tns:USustPdv>"));
        assert!(xml.contains("<tns:DatVrijeme>01.03.2024T09:05:00</tns:DatVrijeme>"));
        assert!(xml.contains("<tns:IznosUkupno>10.00</tns:IznosUkupno><tns:NacinPlac>K</tns:NacinPlac>"));
        assert!(xml.contains(
            "<tns:NakDost>true</tns:NakDost><tns:ParagonBrRac>123/458/5</tns:ParagonBrRac><tns:SpecNamj>Bilješka &amp; napomena</tns:SpecNamj></tns:Racun>"
        ));
    }

    #[test]
    fn business_area_request_golden() {
        let area = BusinessArea::builder(
            TaxId::parse("32314900695").expect("oib"),
            "ODV1",
            AddressData::Address(Address {
                street: "Sv. Mateja".into(),
                house_number: "19".into(),
                house_number_suffix: Some("A".into()),
                postal_code: "10000".into(),
                settlement: "Zagreb".into(),
                municipality: "Zagreb".into(),
            }),
            "Pon:08-11h Uto:15-17",
            NaiveDate::from_ymd_opt(2014, 7, 15).expect("date"),
        )
        .specific_purpose("spec namjena")
        .build()
        .expect("area");

        let xml = BusinessAreaRequest::with_header(&area, header())
            .to_xml()
            .expect("render");
        let expected = concat!(
            r#"<tns:PoslovniProstorZahtjev xmlns:tns="http://www.apis-it.hr/fin/2012/types/f73" Id="PoslovniProstorZahtjev">"#,
            "<tns:Zaglavlje>",
            "<tns:IdPoruke>5c6c0f4e-3d2b-4f8a-9b1e-2a7d4c9e8f10</tns:IdPoruke>",
            "<tns:DatumVrijeme>15.07.2014T20:00:05</tns:DatumVrijeme>",
            "</tns:Zaglavlje>",
            "<tns:PoslovniProstor>",
            "<tns:Oib>32314900695</tns:Oib>",
            "<tns:OznPoslProstora>ODV1</tns:OznPoslProstora>",
            "<tns:AdresniPodatak><tns:Adresa>",
            "<tns:Ulica>Sv. Mateja</tns:Ulica>",
            "<tns:KucniBroj>19</tns:KucniBroj>",
            "<tns:KucniBrojDodatak>A</tns:KucniBrojDodatak>",
            "<tns:BrojPoste>10000</tns:BrojPoste>",
            "<tns:Naselje>Zagreb</tns:Naselje>",
            "<tns:Opcina>Zagreb</tns:Opcina>",
            "</tns:Adresa></tns:AdresniPodatak>",
            "<tns:RadnoVrijeme>Pon:08-11h Uto:15-17</tns:RadnoVrijeme>",
            "<tns:DatumPocetkaPrimjene>15.07.2014</tns:DatumPocetkaPrimjene>",
            "<tns:SpecNamj>spec namjena</tns:SpecNamj>",
            "</tns:PoslovniProstor>",
            "</tns:PoslovniProstorZahtjev>",
        );
        assert_eq!(xml.as_str(), expected);
    }

    #[test]
    fn other_premises_and_closing_mark() {
        let area = BusinessArea::builder(
            TaxId::parse("32314900695").expect("oib"),
            "WEB1",
            AddressData::Other("Internet trgovina".into()),
            "0-24",
            NaiveDate::from_ymd_opt(2024, 12, 31).expect("date"),
        )
        .closing_mark(ClosingMark::Closed)
        .build()
        .expect("area");
        let xml = BusinessAreaRequest::with_header(&area, header())
            .to_xml()
            .expect("render")
            .into_string();
        assert!(xml.contains(
            "<tns:AdresniPodatak><tns:OstaliTipoviPP>Internet trgovina</tns:OstaliTipoviPP></tns:AdresniPodatak>"
        ));
        assert!(xml.contains(
            "<tns:DatumPocetkaPrimjene>31.12.2024</tns:DatumPocetkaPrimjene><tns:OznakaZatvaranja>Z</tns:OznakaZatvaranja></tns:PoslovniProstor>"
        ));
        assert!(!xml.contains("SpecNamj"));
    }

    #[test]
    fn amounts_round_half_away_from_zero() {
        let cases = [
            (dec!(0.625), "0.63"),
            (dec!(0.125), "0.13"),
            (dec!(2.675), "2.68"),
            (dec!(-0.625), "-0.63"),
            (dec!(15.444), "15.44"),
            (dec!(456.1), "456.10"),
            (dec!(-0.004), "0.00"),
            (dec!(-0), "0.00"),
            (dec!(7), "7.00"),
        ];
        for (value, expected) in cases {
            assert_eq!(FixedPrecision::amount(value).to_string(), expected, "{value}");
        }
    }

    #[test]
    fn tie_total_renders_rounded_up() {
        let bill = BillBuilder::new(RequiredBillFields {
            tax_id: TaxId::parse("32314900695").expect("oib"),
            vat_registered: true,
            issued_at: NaiveDate::from_ymd_opt(2014, 7, 15)
                .and_then(|d| d.and_hms_opt(20, 0, 0))
                .expect("timestamp"),
            bill_number: BillNumber::new(2, "ODV1", "1").expect("bill number"),
            total: dec!(0.625),
            payment_type: PaymentType::Cash,
            operator_tax_id: TaxId::parse("34562123431").expect("operator oib"),
        })
        .vat(TaxRate::new(dec!(25), dec!(0.5), dec!(0.125)))
        .build()
        .expect("bill")
        .with_security_code(
            SecurityCode::parse("ca58f4eb5c1b437a4f5f321141b9aeb0").expect("code"),
        );
        let xml = BillRequest::with_header(&bill, header())
            .to_xml()
            .expect("render")
            .into_string();
        assert!(xml.contains("<tns:Iznos>0.13</tns:Iznos>"));
        assert!(xml.contains("<tns:IznosUkupno>0.63</tns:IznosUkupno>"));
    }

    #[test]
    fn fresh_headers_get_distinct_ids() {
        assert_ne!(RequestHeader::now().message_id, RequestHeader::now().message_id);
    }
}
