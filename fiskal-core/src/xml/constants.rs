pub(crate) const TYPES_NS: &str = "http://www.apis-it.hr/fin/2012/types/f73";
pub(crate) const DS_NS: &str = "http://www.w3.org/2000/09/xmldsig#";
pub(crate) const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

pub(crate) const EXC_C14N_ALGORITHM: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
pub(crate) const RSA_SHA1_ALGORITHM: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";
pub(crate) const SHA1_DIGEST_ALGORITHM: &str = "http://www.w3.org/2000/09/xmldsig#sha1";
pub(crate) const ENVELOPED_SIGNATURE_TRANSFORM: &str =
    "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

pub(crate) const BILL_REQUEST_ID: &str = "RacunZahtjev";
pub(crate) const BUSINESS_AREA_REQUEST_ID: &str = "PoslovniProstorZahtjev";

/// `dd.MM.yyyyTHH:mm:ss`
pub(crate) const DATE_TIME_FORMAT: &str = "%d.%m.%YT%H:%M:%S";
pub(crate) const DATE_FORMAT: &str = "%d.%m.%Y";
