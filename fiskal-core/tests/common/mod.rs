use chrono::NaiveDate;
use fiskal_core::api::{HttpReply, Transport};
use fiskal_core::bill::{
    Bill, BillBuilder, BillNumber, PaymentType, RequiredBillFields, SequenceMark, TaxId, TaxRate,
};
use fiskal_core::business::{Address, AddressData, BusinessArea};
use fiskal_core::{Credential, CredentialStore, Pkcs12Store, TransportError};
use rust_decimal_macros::dec;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[allow(dead_code)]
pub const DEMO_PASSWORD: &str = "password";
#[allow(dead_code)]
pub const GOLDEN_ZKI: &str = "ca58f4eb5c1b437a4f5f321141b9aeb0";

#[allow(dead_code)]
pub const BILL_REPLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><tns:RacunOdgovor xmlns:tns="http://www.apis-it.hr/fin/2012/types/f73" Id="RacunOdgovor"><tns:Zaglavlje><tns:IdPoruke>5c6c0f4e-3d2b-4f8a-9b1e-2a7d4c9e8f10</tns:IdPoruke><tns:DatumVrijeme>15.07.2014T20:00:06</tns:DatumVrijeme></tns:Zaglavlje><tns:Jir>6b2b4fcf-7e66-4e1f-a1d5-6a0b1d3a2c11</tns:Jir></tns:RacunOdgovor></soap:Body></soap:Envelope>"#;

#[allow(dead_code)]
pub const AREA_REPLY: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><tns:PoslovniProstorOdgovor xmlns:tns="http://www.apis-it.hr/fin/2012/types/f73" Id="PoslovniProstorOdgovor"><tns:Zaglavlje><tns:IdPoruke>a1e4d7b2-0000-4000-8000-000000000001</tns:IdPoruke><tns:DatumVrijeme>15.07.2014T20:00:06</tns:DatumVrijeme></tns:Zaglavlje></tns:PoslovniProstorOdgovor></soap:Body></soap:Envelope>"#;

#[allow(dead_code)]
pub const ERROR_REPLY: &str = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><tns:RacunOdgovor xmlns:tns="http://www.apis-it.hr/fin/2012/types/f73"><tns:Zaglavlje><tns:IdPoruke>5c6c0f4e-3d2b-4f8a-9b1e-2a7d4c9e8f10</tns:IdPoruke></tns:Zaglavlje><tns:Greske><tns:Greska><tns:SifraGreske>s005</tns:SifraGreske><tns:PorukaGreske>OIB iz poruke zahtjeva nije jednak OIB-u iz certifikata.</tns:PorukaGreske></tns:Greska></tns:Greske></tns:RacunOdgovor></soap:Body></soap:Envelope>"#;

#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[allow(dead_code)]
pub fn demo_credential() -> Credential {
    let container = std::fs::read(fixture_path("demo.p12")).expect("read demo.p12");
    Pkcs12Store
        .load(&container, DEMO_PASSWORD)
        .expect("load demo credential")
}

#[allow(dead_code)]
pub fn scenario_bill() -> Bill {
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
    .consumption_tax(TaxRate::new(dec!(20.1), dec!(200.1), dec!(20.1)))
    .other_tax(TaxRate::named("Naziv1", dec!(40.1), dec!(453.3), dec!(12.1)))
    .other_tax(TaxRate::named("Naziv2", dec!(27.1), dec!(445.1), dec!(50.1)))
    .tax_free_amount(dec!(23.5))
    .margin_amount(dec!(32))
    .non_taxable_amount(dec!(5.1))
    .build()
    .expect("scenario bill")
}

#[allow(dead_code)]
pub fn scenario_area() -> BusinessArea {
    BusinessArea::builder(
        TaxId::parse("32314900695").expect("oib"),
        "ODV1",
        AddressData::Address(Address {
            street: "Sv. Mateja".into(),
            house_number: "19".into(),
            house_number_suffix: None,
            postal_code: "10000".into(),
            settlement: "Zagreb".into(),
            municipality: "Zagreb".into(),
        }),
        "Pon:08-11h Uto:15-17",
        NaiveDate::from_ymd_opt(2014, 7, 15).expect("date"),
    )
    .specific_purpose("spec namjena")
    .build()
    .expect("scenario area")
}

/// Transport double that records every envelope and answers with a fixed reply.
#[allow(dead_code)]
pub struct RecordingTransport {
    reply: HttpReply,
    calls: AtomicUsize,
    envelopes: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn replying(status: u16, body: &str) -> Self {
        Self {
            reply: HttpReply {
                status,
                body: body.to_string(),
            },
            calls: AtomicUsize::new(0),
            envelopes: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_envelope(&self) -> Option<String> {
        self.envelopes.lock().expect("lock").last().cloned()
    }
}

impl Transport for RecordingTransport {
    async fn post(&self, _endpoint: &str, envelope: String) -> Result<HttpReply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.envelopes.lock().expect("lock").push(envelope);
        Ok(self.reply.clone())
    }
}
