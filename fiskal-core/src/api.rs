//! CIS SOAP client and reply types.
use crate::{config::Config, xml::SignedXml, xml::constants::SOAP_ENV_NS};
use libxml::{parser::Parser, tree::Node, xpath};
use reqwest::{Client, header::CONTENT_TYPE};
use std::future::Future;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors raised before a reply could be interpreted.
///
/// A registry rejection is not an error; see [`ResponseOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("TLS setup failed: {0}")]
    Tls(String),
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

/// Interpreted registry reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// `reference_id` is the JIR for bills, the echoed message id otherwise.
    Acknowledged {
        reference_id: String,
        reply_element: String,
    },
    Rejected {
        fault_code: String,
        fault_message: String,
    },
}

impl ResponseOutcome {
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, ResponseOutcome::Acknowledged { .. })
    }

    pub fn reference_id(&self) -> Option<&str> {
        match self {
            ResponseOutcome::Acknowledged { reference_id, .. } => Some(reference_id),
            ResponseOutcome::Rejected { .. } => None,
        }
    }
}

/// Raw HTTP reply handed back by a [`Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

/// Delivers a SOAP envelope to an endpoint.
pub trait Transport {
    fn post(
        &self,
        endpoint: &str,
        envelope: String,
    ) -> impl Future<Output = Result<HttpReply, TransportError>> + Send;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// # Errors
    /// Returns [`TransportError::Tls`] if a root certificate is invalid or the client cannot be built.
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout());
        for pem in config.root_certificates() {
            let certificate = reqwest::Certificate::from_pem(pem)
                .map_err(|e| TransportError::Tls(format!("invalid root certificate: {e}")))?;
            builder = builder.add_root_certificate(certificate);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::Tls(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn post(&self, endpoint: &str, envelope: String) -> Result<HttpReply, TransportError> {
        let response = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(envelope)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpReply { status, body })
    }
}

/// CIS protocol client. Sends each request once; retries are up to the caller.
///
/// # Examples
/// ```rust,no_run
/// use fiskal_core::api::ProtocolClient;
/// use fiskal_core::config::Config;
///
/// let client = ProtocolClient::new(&Config::default())?;
/// assert!(client.endpoint().starts_with("https://"));
/// # Ok::<(), fiskal_core::TransportError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ProtocolClient<T = HttpTransport> {
    transport: T,
    endpoint: String,
}

impl ProtocolClient<HttpTransport> {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        Ok(Self::with_transport(
            HttpTransport::new(config)?,
            config.endpoint_url(),
        ))
    }
}

impl<T: Transport> ProtocolClient<T> {
    pub fn with_transport(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn send(&self, signed: &SignedXml) -> Result<ResponseOutcome, TransportError> {
        self.send_to(signed, &self.endpoint).await
    }

    pub async fn send_to(
        &self,
        signed: &SignedXml,
        endpoint: &str,
    ) -> Result<ResponseOutcome, TransportError> {
        let envelope = soap_envelope(signed);
        info!(endpoint, bytes = envelope.len(), "sending fiscalization request");
        let reply = self.transport.post(endpoint, envelope).await?;
        debug!(status = reply.status, "reply received");
        interpret(reply)
    }
}

/// Wrap a signed request in a SOAP 1.1 envelope.
pub fn soap_envelope(signed: &SignedXml) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<soapenv:Envelope xmlns:soapenv="{ns}">"#,
            "<soapenv:Body>{body}</soapenv:Body>",
            "</soapenv:Envelope>"
        ),
        ns = SOAP_ENV_NS,
        body = signed.as_str(),
    )
}

fn interpret(reply: HttpReply) -> Result<ResponseOutcome, TransportError> {
    let success = (200..300).contains(&reply.status);
    match parse_reply(&reply.body) {
        Ok(ResponseOutcome::Rejected {
            fault_code,
            fault_message,
        }) => {
            warn!(status = reply.status, fault_code = %fault_code, "request rejected");
            Ok(ResponseOutcome::Rejected {
                fault_code,
                fault_message,
            })
        }
        Ok(outcome) if success => Ok(outcome),
        Err(err) if success => Err(err),
        _ => Err(TransportError::UnexpectedStatus {
            status: reply.status,
            body: reply.body,
        }),
    }
}

/// Parse a SOAP reply body into an outcome.
///
/// # Errors
/// Returns [`TransportError::MalformedReply`] if the body is not a SOAP envelope
/// or carries neither an error list nor an identifier.
pub fn parse_reply(body: &str) -> Result<ResponseOutcome, TransportError> {
    let doc = Parser::default()
        .parse_string(body)
        .map_err(|e| TransportError::MalformedReply(format!("XML parse error: {e:?}")))?;
    let ctx = xpath::Context::new(&doc)
        .map_err(|e| TransportError::MalformedReply(format!("XPath context error: {e:?}")))?;

    let reply_element = first_node(
        &ctx,
        "/*[local-name()='Envelope']/*[local-name()='Body']/*[1]",
    )?
    .ok_or_else(|| TransportError::MalformedReply("missing SOAP body".into()))?;

    if reply_element.get_name() == "Fault" {
        return Ok(ResponseOutcome::Rejected {
            fault_code: text(&ctx, "//*[local-name()='Fault']/*[local-name()='faultcode']")?
                .unwrap_or_default(),
            fault_message: text(&ctx, "//*[local-name()='Fault']/*[local-name()='faultstring']")?
                .unwrap_or_default(),
        });
    }

    if let Some(fault_code) = text(
        &ctx,
        "(//*[local-name()='Greska'])[1]/*[local-name()='SifraGreske']",
    )? {
        let fault_message = text(
            &ctx,
            "(//*[local-name()='Greska'])[1]/*[local-name()='PorukaGreske']",
        )?
        .unwrap_or_default();
        return Ok(ResponseOutcome::Rejected {
            fault_code,
            fault_message,
        });
    }

    let reference_id = match text(&ctx, "//*[local-name()='Jir']")? {
        Some(jir) => jir,
        None => text(
            &ctx,
            "//*[local-name()='Zaglavlje']/*[local-name()='IdPoruke']",
        )?
        .ok_or_else(|| TransportError::MalformedReply("reply carries no identifier".into()))?,
    };
    Ok(ResponseOutcome::Acknowledged {
        reference_id,
        reply_element: reply_element.get_name(),
    })
}

fn first_node(ctx: &xpath::Context, expr: &str) -> Result<Option<Node>, TransportError> {
    let nodes = ctx
        .evaluate(expr)
        .map_err(|e| TransportError::MalformedReply(format!("XPath error: {e:?}")))?
        .get_nodes_as_vec();
    Ok(nodes.into_iter().next())
}

// Trimmed text of the first match; blank text counts as absent.
fn text(ctx: &xpath::Context, expr: &str) -> Result<Option<String>, TransportError> {
    Ok(first_node(ctx, expr)?
        .map(|node| node.get_content().trim().to_string())
        .filter(|value| !value.is_empty()))
}
