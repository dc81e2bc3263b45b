//! Enveloped XML digital signatures (XMLDSig, RSA-SHA1, exclusive c14n).
use crate::{
    credential::Credential,
    xml::{
        CanonicalXml, SignedXml,
        constants::{
            DS_NS, ENVELOPED_SIGNATURE_TRANSFORM, EXC_C14N_ALGORITHM, RSA_SHA1_ALGORITHM,
            SHA1_DIGEST_ALGORITHM,
        },
    },
};
use base64ct::{Base64, Encoding};
use libxml::{
    parser::Parser,
    tree::{Document, Node, c14n},
    xpath,
};
use openssl::{hash::MessageDigest, sign::Verifier, x509::X509};
use quick_xml::escape::escape;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::{debug, warn};
use x509_cert::{Certificate, der::Decode, name::Name};

#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signing key unavailable: {0}")]
    KeyUnavailable(String),
    #[error("canonicalization failed: {0}")]
    CanonicalizationFailed(String),
    #[error("certificate error: {0}")]
    Certificate(String),
}

/// Result of checking an enveloped signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Valid,
    DigestMismatch,
    BadSignature,
    MissingSignature,
}

/// Signs request documents.
pub trait XmlSigner {
    fn sign(&self, document: &CanonicalXml) -> Result<SignedXml, SigningError>;
}

/// Appends a `Signature` element as the last child of the document root,
/// referencing the root through its `Id` attribute.
///
/// # Examples
/// ```rust,no_run
/// use fiskal_core::credential::Credential;
/// use fiskal_core::sign::{EnvelopedSigner, Verification, XmlSigner, verify};
/// use fiskal_core::xml::CanonicalXml;
///
/// let credential = Credential::from_pkcs12_file("fiskal.p12", "secret")?;
/// let unsigned = CanonicalXml::from(r#"<Doc Id="Doc"><A>1</A></Doc>"#.to_string());
/// let signed = EnvelopedSigner::new(credential).sign(&unsigned)?;
/// assert_eq!(verify(signed.as_str())?, Verification::Valid);
/// # Ok::<(), fiskal_core::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct EnvelopedSigner {
    credential: Credential,
}

impl EnvelopedSigner {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

impl XmlSigner for EnvelopedSigner {
    fn sign(&self, document: &CanonicalXml) -> Result<SignedXml, SigningError> {
        let mut doc = parse(document.as_str())?;
        let mut root = doc
            .get_root_element()
            .ok_or_else(|| SigningError::CanonicalizationFailed("document has no root".into()))?;
        let reference_id = root.get_attribute("Id").ok_or_else(|| {
            SigningError::CanonicalizationFailed("root element has no Id attribute".into())
        })?;

        let digest_b64 = reference_digest_base64(&doc, &format!("#{reference_id}"))?;
        let signed_info = signed_info_xml(&reference_id, &digest_b64);
        let signed_info_c14n = exclusive_c14n(&parse(&signed_info)?)?;
        let signature = self
            .credential
            .signing_key()
            .sign_sha1(signed_info_c14n.as_bytes())?;

        let certificate_der = self.credential.certificate_der()?;
        let (issuer, serial) = issuer_and_serial(&certificate_der)?;
        let signature_xml = format!(
            concat!(
                r#"<Signature xmlns="{ns}">{signed_info}"#,
                "<SignatureValue>{signature}</SignatureValue>",
                "<KeyInfo><X509Data>",
                "<X509Certificate>{certificate}</X509Certificate>",
                "<X509IssuerSerial>",
                "<X509IssuerName>{issuer}</X509IssuerName>",
                "<X509SerialNumber>{serial}</X509SerialNumber>",
                "</X509IssuerSerial>",
                "</X509Data></KeyInfo></Signature>"
            ),
            ns = DS_NS,
            signed_info = signed_info,
            signature = Base64::encode_string(&signature),
            certificate = Base64::encode_string(&certificate_der),
            issuer = escape(issuer.as_str()),
            serial = serial,
        );

        let mut signature_node = import_fragment(&mut doc, &signature_xml)?;
        root.add_child(&mut signature_node)
            .map_err(|e| SigningError::CanonicalizationFailed(e.to_string()))?;
        debug!(reference = %reference_id, "document signed");
        Ok(SignedXml::new(doc.node_to_string(&root)))
    }
}

/// Check the first enveloped signature of a document against its embedded certificate.
///
/// The reference is resolved through its `URI` (`""` for the whole document, `#id` for
/// the element carrying that `Id`), and `SignedInfo` is canonicalized where it sits, so
/// prefixed signatures and signatures over nested elements verify as well.
pub fn verify(signed: &str) -> Result<Verification, SigningError> {
    let doc = parse(signed)?;
    let ctx = ds_context(&doc)?;

    let Some(mut signed_info) = first_node(&ctx, "(//ds:Signature)[1]/ds:SignedInfo")? else {
        return Ok(Verification::MissingSignature);
    };
    let reference_uri = node_text(&ctx, "(//ds:Signature)[1]/ds:SignedInfo/ds:Reference/@URI")?;
    let digest_value = node_text(
        &ctx,
        "(//ds:Signature)[1]/ds:SignedInfo/ds:Reference/ds:DigestValue",
    )?;
    let signature_value = node_text(&ctx, "(//ds:Signature)[1]/ds:SignatureValue")?;
    let certificate_b64 = node_text(
        &ctx,
        "(//ds:Signature)[1]/ds:KeyInfo/ds:X509Data/ds:X509Certificate",
    )?;

    if reference_digest_base64(&doc, &reference_uri)? != digest_value {
        warn!(reference = %reference_uri, "reference digest mismatch");
        return Ok(Verification::DigestMismatch);
    }

    let signed_info_c14n = exclusive_c14n_node(&mut signed_info)?;
    let Ok(signature) = Base64::decode_vec(&signature_value) else {
        return Ok(Verification::BadSignature);
    };
    let certificate_der = Base64::decode_vec(&certificate_b64)
        .map_err(|e| SigningError::Certificate(format!("invalid certificate encoding: {e}")))?;
    let public_key = X509::from_der(&certificate_der)
        .and_then(|cert| cert.public_key())
        .map_err(|e| SigningError::Certificate(e.to_string()))?;

    let mut verifier = Verifier::new(MessageDigest::sha1(), &public_key)
        .map_err(|e| SigningError::Certificate(e.to_string()))?;
    let matches = verifier
        .update(signed_info_c14n.as_bytes())
        .and_then(|_| verifier.verify(&signature))
        .unwrap_or(false);
    if matches {
        Ok(Verification::Valid)
    } else {
        Ok(Verification::BadSignature)
    }
}

fn parse(xml: &str) -> Result<Document, SigningError> {
    Parser::default()
        .parse_string(xml)
        .map_err(|e| SigningError::CanonicalizationFailed(format!("XML parse error: {e:?}")))
}

fn ds_context(doc: &Document) -> Result<xpath::Context, SigningError> {
    let ctx = xpath::Context::new(doc)
        .map_err(|e| SigningError::CanonicalizationFailed(format!("XPath context error: {e:?}")))?;
    ctx.register_namespace("ds", DS_NS)
        .map_err(|e| SigningError::CanonicalizationFailed(format!("XPath context error: {e:?}")))?;
    Ok(ctx)
}

fn first_node(ctx: &xpath::Context, expr: &str) -> Result<Option<Node>, SigningError> {
    let nodes = ctx
        .evaluate(expr)
        .map_err(|e| SigningError::CanonicalizationFailed(format!("XPath error: {e:?}")))?
        .get_nodes_as_vec();
    Ok(nodes.into_iter().next())
}

fn node_text(ctx: &xpath::Context, expr: &str) -> Result<String, SigningError> {
    first_node(ctx, expr)?
        .map(|node| node.get_content().trim().to_string())
        .ok_or_else(|| SigningError::CanonicalizationFailed(format!("missing {expr}")))
}

fn exclusive_options() -> c14n::CanonicalizationOptions {
    c14n::CanonicalizationOptions {
        mode: c14n::CanonicalizationMode::ExclusiveCanonical1_0,
        inclusive_ns_prefixes: vec![],
        with_comments: false,
    }
}

fn exclusive_c14n(doc: &Document) -> Result<String, SigningError> {
    doc.canonicalize(exclusive_options(), None)
        .map_err(|e| SigningError::CanonicalizationFailed(format!("{e:?}")))
}

// Subtree canonicalization; namespaces in scope from ancestors are rendered
// where the subtree uses them.
fn exclusive_c14n_node(node: &mut Node) -> Result<String, SigningError> {
    node.canonicalize(exclusive_options())
        .map_err(|e| SigningError::CanonicalizationFailed(format!("{e:?}")))
}

fn element_by_id(ctx: &xpath::Context, id: &str) -> Result<Option<Node>, SigningError> {
    let nodes = ctx
        .evaluate("//*[@Id]")
        .map_err(|e| SigningError::CanonicalizationFailed(format!("XPath error: {e:?}")))?
        .get_nodes_as_vec();
    Ok(nodes
        .into_iter()
        .find(|node| node.get_attribute("Id").as_deref() == Some(id)))
}

/// SHA-1 of the referenced content in exclusive canonical form, with the
/// enveloped signature removed.
fn reference_digest_base64(doc: &Document, uri: &str) -> Result<String, SigningError> {
    let copy = doc.dup().map_err(|e| {
        SigningError::CanonicalizationFailed(format!("failed to duplicate xml: {e:?}"))
    })?;
    let ctx = ds_context(&copy)?;
    if let Some(mut signature) = first_node(&ctx, "(//ds:Signature)[1]")? {
        signature.unlink();
    }
    let canonical = match uri.strip_prefix('#') {
        Some(id) => {
            let mut target = element_by_id(&ctx, id)?.ok_or_else(|| {
                SigningError::CanonicalizationFailed(format!("no element with Id {id:?}"))
            })?;
            exclusive_c14n_node(&mut target)?
        }
        None if uri.is_empty() => exclusive_c14n(&copy)?,
        None => {
            return Err(SigningError::CanonicalizationFailed(format!(
                "unsupported reference URI {uri:?}"
            )));
        }
    };
    Ok(Base64::encode_string(&Sha1::digest(canonical.as_bytes())))
}

// SignedInfo repeats the namespace declaration so it stays self-contained when
// serialized on its own.
fn signed_info_xml(reference_id: &str, digest_b64: &str) -> String {
    format!(
        concat!(
            r#"<SignedInfo xmlns="{ns}">"#,
            r#"<CanonicalizationMethod Algorithm="{c14n}"/>"#,
            r#"<SignatureMethod Algorithm="{rsa_sha1}"/>"#,
            r##"<Reference URI="#{reference}">"##,
            "<Transforms>",
            r#"<Transform Algorithm="{enveloped}"/>"#,
            r#"<Transform Algorithm="{c14n}"/>"#,
            "</Transforms>",
            r#"<DigestMethod Algorithm="{sha1}"/>"#,
            "<DigestValue>{digest}</DigestValue>",
            "</Reference>",
            "</SignedInfo>"
        ),
        ns = DS_NS,
        c14n = EXC_C14N_ALGORITHM,
        rsa_sha1 = RSA_SHA1_ALGORITHM,
        reference = escape(reference_id),
        enveloped = ENVELOPED_SIGNATURE_TRANSFORM,
        sha1 = SHA1_DIGEST_ALGORITHM,
        digest = digest_b64,
    )
}

fn import_fragment(doc: &mut Document, xml: &str) -> Result<Node, SigningError> {
    let fragment = parse(xml)?;
    let mut node = fragment
        .get_root_element()
        .ok_or_else(|| SigningError::CanonicalizationFailed("missing fragment root".into()))?;
    node.unlink();
    doc.import_node(&mut node)
        .map_err(|_| SigningError::CanonicalizationFailed("failed to import fragment".into()))
}

fn issuer_and_serial(certificate_der: &[u8]) -> Result<(String, String), SigningError> {
    let cert = Certificate::from_der(certificate_der)
        .map_err(|e| SigningError::Certificate(format!("certificate parse error: {e}")))?;
    let serial = serial_bytes_to_decimal_string(cert.tbs_certificate.serial_number.as_bytes());
    Ok((issuer_name(&cert.tbs_certificate.issuer), serial))
}

/// RFC 4514 form, most specific RDN first, joined with `", "`. Values keep their
/// escaping, so `O=Firma\, d.o.o.` stays one RDN.
fn issuer_name(name: &Name) -> String {
    name.0
        .iter()
        .rev()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn serial_bytes_to_decimal_string(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "0".to_string();
    }

    let mut digits: Vec<u8> = vec![0];
    for &byte in bytes {
        let mut carry = u32::from(byte);
        for digit in digits.iter_mut() {
            let value = u32::from(*digit) * 256 + carry;
            *digit = (value % 10) as u8;
            carry = value / 10;
        }
        while carry > 0 {
            digits.push((carry % 10) as u8);
            carry /= 10;
        }
    }

    while digits.len() > 1 && matches!(digits.last(), Some(0)) {
        digits.pop();
    }

    digits.iter().rev().map(|d| (b'0' + *d) as char).collect()
}
