use super::{MessageReceipt, MessageSender, NotifyError};
use crate::config::Settings;
use crate::notify_info_with_fields;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error};
use url::Url;

const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Sends WhatsApp messages through the Twilio Messages API.
pub struct TwilioWhatsApp {
    client: reqwest::Client,
    endpoint: Url,
    account_sid: String,
    auth_token: String,
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Prefix a phone number with the WhatsApp channel marker once.
pub fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    if number.starts_with(WHATSAPP_PREFIX) {
        number.to_string()
    } else {
        format!("{}{}", WHATSAPP_PREFIX, number)
    }
}

impl TwilioWhatsApp {
    pub fn new(settings: &Settings) -> Result<Self, NotifyError> {
        let raw = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            settings.twilio_api_base.trim_end_matches('/'),
            settings.twilio_sid
        );
        let endpoint = Url::parse(&raw).map_err(|e| NotifyError::InvalidEndpoint {
            url: raw.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            account_sid: settings.twilio_sid.clone(),
            auth_token: settings.twilio_key.clone(),
            from: whatsapp_address(&settings.twilio_from),
            to: whatsapp_address(&settings.twilio_to),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn form<'a>(&'a self, body: &'a str) -> [(&'static str, &'a str); 3] {
        [("From", self.from.as_str()), ("To", self.to.as_str()), ("Body", body)]
    }
}

#[async_trait]
impl MessageSender for TwilioWhatsApp {
    async fn send(&self, body: &str) -> Result<MessageReceipt, NotifyError> {
        debug!(category = "notify", to = %self.to, "posting message to {}", self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&self.form(body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<TwilioErrorBody>(&text)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or(text);
            error!(category = "notify", status = status.as_u16(), "Twilio rejected message: {}", message);
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let message: TwilioMessage = response.json().await?;
        let receipt = MessageReceipt {
            sid: message.sid,
            status: message.status.unwrap_or_else(|| "unknown".to_string()),
        };
        notify_info_with_fields!(
            sid = receipt.sid.as_str(),
            status = receipt.status.as_str();
            "WhatsApp message accepted"
        );
        Ok(receipt)
    }

    fn channel(&self) -> &'static str {
        "whatsapp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Form;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn settings(api_base: &str) -> Settings {
        Settings {
            mysql_database: "db".to_string(),
            mysql_user: "u".to_string(),
            mysql_password: "p".to_string(),
            mysql_host: "h".to_string(),
            mysql_port: 3306,
            database_url_override: None,
            twilio_sid: "AC42".to_string(),
            twilio_key: "token".to_string(),
            twilio_from: "+14155238886".to_string(),
            twilio_to: "whatsapp:+5215512345678".to_string(),
            twilio_api_base: api_base.to_string(),
        }
    }

    type Captured = Arc<Mutex<Vec<(Option<String>, HashMap<String, String>)>>>;

    async fn fake_twilio(reject: bool) -> (String, Captured) {
        let captured: Captured = Arc::default();
        let sink = captured.clone();
        let app = Router::new().route(
            "/2010-04-01/Accounts/AC42/Messages.json",
            post(move |headers: HeaderMap, Form(form): Form<HashMap<String, String>>| {
                let sink = sink.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    sink.lock().unwrap().push((auth, form));
                    if reject {
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({"code": 63007, "message": "Invalid From number"})),
                        )
                    } else {
                        (
                            StatusCode::CREATED,
                            Json(json!({"sid": "SM123", "status": "queued"})),
                        )
                    }
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), captured)
    }

    #[test]
    fn prefix_is_added_once() {
        assert_eq!(whatsapp_address("+123"), "whatsapp:+123");
        assert_eq!(whatsapp_address("whatsapp:+123"), "whatsapp:+123");
        assert_eq!(whatsapp_address(" +123 "), "whatsapp:+123");
    }

    #[test]
    fn endpoint_targets_account_messages() {
        let sender = TwilioWhatsApp::new(&settings("https://api.twilio.com/")).unwrap();
        assert_eq!(
            sender.endpoint().as_str(),
            "https://api.twilio.com/2010-04-01/Accounts/AC42/Messages.json"
        );
    }

    #[test]
    fn bad_api_base_is_rejected() {
        let err = TwilioWhatsApp::new(&settings("not a url")).err().unwrap();
        assert!(matches!(err, NotifyError::InvalidEndpoint { .. }));
    }

    #[tokio::test]
    async fn sends_form_with_basic_auth() {
        let (base, captured) = fake_twilio(false).await;
        let sender = TwilioWhatsApp::new(&settings(&base)).unwrap();

        let receipt = sender.send("tank level low").await.unwrap();
        assert_eq!(
            receipt,
            MessageReceipt {
                sid: "SM123".to_string(),
                status: "queued".to_string()
            }
        );

        let calls = captured.lock().unwrap();
        let (auth, form) = &calls[0];
        // base64("AC42:token")
        assert_eq!(auth.as_deref(), Some("Basic QUM0Mjp0b2tlbg=="));
        assert_eq!(form["From"], "whatsapp:+14155238886");
        assert_eq!(form["To"], "whatsapp:+5215512345678");
        assert_eq!(form["Body"], "tank level low");
    }

    #[tokio::test]
    async fn provider_error_message_is_surfaced() {
        let (base, _) = fake_twilio(true).await;
        let sender = TwilioWhatsApp::new(&settings(&base)).unwrap();

        match sender.send("hi").await {
            Err(NotifyError::Rejected { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "Invalid From number");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn error_body_without_message_falls_back() {
        let parsed: Value = json!({"code": 1});
        let body: TwilioErrorBody = serde_json::from_value(parsed).unwrap();
        assert!(body.message.is_none());
    }
}
