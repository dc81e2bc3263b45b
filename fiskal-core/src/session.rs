//! Fiscalization pipeline: seal, render, sign and send.
use crate::{
    Error,
    api::{HttpTransport, ProtocolClient, ResponseOutcome, Transport},
    bill::Bill,
    business::BusinessArea,
    credential::Credential,
    security_code::{RsaSecurityCodeEngine, SecurityCodeEngine},
    sign::{EnvelopedSigner, XmlSigner},
    xml::{BillRequest, BusinessAreaRequest, SignedXml, ToXml},
};
use tracing::info;

/// Owns a credential, a signer and a protocol client and runs the request pipeline.
///
/// Every local step (validation, rendering, signing) completes before the
/// transport is used. The credential's key seals bills; `S` signs the rendered
/// requests.
///
/// # Examples
/// ```rust,no_run
/// use fiskal_core::{Credential, ProtocolClient, Session};
/// use fiskal_core::bill::Bill;
/// use fiskal_core::config::Config;
///
/// # async fn run(bill: Bill) -> Result<(), fiskal_core::Error> {
/// let credential = Credential::from_pkcs12_file("fiskal.p12", "secret")?;
/// let session = Session::new(credential, ProtocolClient::new(&Config::default())?);
/// let outcome = session.fiscalize(bill).await?;
/// println!("{outcome:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Session<T = HttpTransport, E = RsaSecurityCodeEngine, S = EnvelopedSigner> {
    credential: Credential,
    client: ProtocolClient<T>,
    engine: E,
    signer: S,
}

impl<T: Transport> Session<T, RsaSecurityCodeEngine, EnvelopedSigner> {
    pub fn new(credential: Credential, client: ProtocolClient<T>) -> Self {
        let signer = EnvelopedSigner::new(credential.clone());
        Self::with_parts(credential, client, RsaSecurityCodeEngine, signer)
    }
}

impl<T: Transport, E: SecurityCodeEngine> Session<T, E, EnvelopedSigner> {
    pub fn with_engine(credential: Credential, client: ProtocolClient<T>, engine: E) -> Self {
        let signer = EnvelopedSigner::new(credential.clone());
        Self::with_parts(credential, client, engine, signer)
    }
}

impl<T: Transport, E: SecurityCodeEngine, S: XmlSigner> Session<T, E, S> {
    pub fn with_parts(
        credential: Credential,
        client: ProtocolClient<T>,
        engine: E,
        signer: S,
    ) -> Self {
        Self {
            credential,
            client,
            engine,
            signer,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn client(&self) -> &ProtocolClient<T> {
        &self.client
    }

    pub fn signer(&self) -> &S {
        &self.signer
    }

    /// Compute the security code and return the sealed bill.
    pub fn seal(&self, bill: Bill) -> Result<Bill, Error> {
        Ok(bill.seal(&self.engine, self.credential.signing_key())?)
    }

    pub fn prepare_bill(&self, bill: &Bill) -> Result<SignedXml, Error> {
        let document = BillRequest::new(bill).to_xml()?;
        Ok(self.signer.sign(&document)?)
    }

    pub fn prepare_business_area(&self, area: &BusinessArea) -> Result<SignedXml, Error> {
        let document = BusinessAreaRequest::new(area).to_xml()?;
        Ok(self.signer.sign(&document)?)
    }

    /// Submit an already sealed bill.
    ///
    /// # Errors
    /// Returns [`Error::Validation`] for an unsealed bill without contacting the registry.
    pub async fn submit_bill(&self, bill: &Bill) -> Result<ResponseOutcome, Error> {
        let signed = self.prepare_bill(bill)?;
        let outcome = self.client.send(&signed).await?;
        info!(
            acknowledged = outcome.is_acknowledged(),
            sequence_number = bill.bill_number().sequence_number(),
            "bill submitted"
        );
        Ok(outcome)
    }

    /// Seal and submit a bill.
    pub async fn fiscalize(&self, bill: Bill) -> Result<ResponseOutcome, Error> {
        let sealed = self.seal(bill)?;
        self.submit_bill(&sealed).await
    }

    pub async fn register_business_area(
        &self,
        area: &BusinessArea,
    ) -> Result<ResponseOutcome, Error> {
        let signed = self.prepare_business_area(area)?;
        let outcome = self.client.send(&signed).await?;
        info!(
            acknowledged = outcome.is_acknowledged(),
            business_area = area.code(),
            "business area registered"
        );
        Ok(outcome)
    }
}
