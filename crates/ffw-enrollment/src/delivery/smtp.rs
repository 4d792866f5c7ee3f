use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use super::{DeliveryError, DeliveryReceipt, DeliveryRequest, DocumentMailer, MESSAGE_SUBJECT};
use crate::config::MailConfig;

const IMPLICIT_TLS_PORT: u16 = 465;

/// Sends documents through an authenticated SMTP relay.
///
/// Built from possibly incomplete settings: every delivery then fails with
/// [`DeliveryError::NotConfigured`] instead of the service refusing to start.
pub struct SmtpMailer {
    relay: Option<Relay>,
    recipient: String,
}

struct Relay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("configured", &self.relay.is_some())
            .field("recipient", &self.recipient)
            .finish()
    }
}

impl SmtpMailer {
    pub fn from_config(config: &MailConfig) -> Result<Self, DeliveryError> {
        let relay = match (&config.smtp_server, &config.sender, &config.password) {
            (Some(server), Some(sender), Some(password)) => {
                let address = parse_address(sender)?;
                let credentials = Credentials::new(sender.clone(), password.clone());
                let builder = if config.smtp_port == IMPLICIT_TLS_PORT {
                    AsyncSmtpTransport::<Tokio1Executor>::relay(server)?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)?
                };
                let transport = builder
                    .port(config.smtp_port)
                    .credentials(credentials)
                    .timeout(Some(config.timeout))
                    .build();
                Some(Relay {
                    transport,
                    from: Mailbox::new(Some(config.sender_name.clone()), address),
                })
            }
            _ => None,
        };

        Ok(Self {
            relay,
            recipient: config.recipient.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.relay.is_some()
    }

    fn message(&self, from: &Mailbox, request: DeliveryRequest) -> Result<Message, DeliveryError> {
        let to = Mailbox::new(None, parse_address(&self.recipient)?);
        let attachment = Attachment::new(request.file_name.clone())
            .body(request.document.clone(), ContentType::parse("application/pdf")?);

        let message = Message::builder()
            .from(from.clone())
            .to(to)
            .subject(MESSAGE_SUBJECT)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(request.body()))
                    .singlepart(attachment),
            )?;
        Ok(message)
    }
}

impl DocumentMailer for SmtpMailer {
    fn recipient(&self) -> &str {
        &self.recipient
    }

    async fn deliver(&self, request: DeliveryRequest) -> Result<DeliveryReceipt, DeliveryError> {
        let Some(relay) = &self.relay else {
            error!("missing required email configuration settings");
            return Err(DeliveryError::NotConfigured);
        };

        info!(
            recipient = %self.recipient,
            file_name = %request.file_name,
            bytes = request.document.len(),
            "sending registration form"
        );
        let message = self.message(&relay.from, request)?;
        relay.transport.send(message).await?;
        info!(recipient = %self.recipient, "email sent");

        Ok(DeliveryReceipt {
            recipient: self.recipient.clone(),
        })
    }
}

fn parse_address(value: &str) -> Result<Address, DeliveryError> {
    value
        .parse::<Address>()
        .map_err(|source| DeliveryError::Address {
            value: value.to_string(),
            source,
        })
}
