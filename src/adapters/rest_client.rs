use {
    crate::domain::{
        error::{HttpErrorKind, PayError},
        id::{AuthorizationId, RemoteOrderId, SubscriptionId},
        money::{Currency, Money},
        order::{Intent, PaymentMode},
        provider::PaymentProvider,
        remote::{
            Authorization, AuthorizationStatus, CardAuthenticationResult, CardDetails, Item,
            ItemCategory, LiabilityShift, PaymentSource, PurchaseUnit, PurchaseUnitPayments,
            RemoteOrder, RemoteOrderStatus,
        },
        webhook::{WebhookSubscription, WebhookTransmission},
    },
    async_trait::async_trait,
    chrono::{DateTime, Duration, Utc},
    reqwest::{Method, StatusCode},
    serde::Deserialize,
    tokio::sync::RwLock,
    uuid::Uuid,
};

const REQUEST_ID_HEADER: &str = "PayPal-Request-Id";

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// reqwest-backed `PaymentProvider`. Pure request/response mapping; every
/// decision about retrying or compensating lives in the services layer.
pub struct RestClient {
    http: reqwest::Client,
    base_url: &'static str,
    client_id: String,
    client_secret: String,
    token: RwLock<Option<CachedToken>>,
}

impl RestClient {
    pub fn new(mode: PaymentMode, client_id: String, client_secret: String) -> Self {
        let base_url = match mode {
            PaymentMode::Live => "https://api-m.paypal.com",
            PaymentMode::Sandbox => "https://api-m.sandbox.paypal.com",
        };
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            http,
            base_url,
            client_id,
            client_secret,
            token: RwLock::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, PayError> {
        {
            let cached = self.token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Utc::now() {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let mut cached = self.token.write().await;
        // Another task may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.access_token.clone());
            }
        }

        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| PayError::remote(HttpErrorKind::Network, e.to_string()))?;

        if !response.status().is_success() {
            let kind = HttpErrorKind::from_status(response.status().as_u16());
            let body = response.text().await.unwrap_or_default();
            return Err(PayError::remote(kind, format!("token fetch: {body}")));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: i64,
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PayError::remote(HttpErrorKind::Network, e.to_string()))?;

        let access_token = token.access_token.clone();
        // Refresh a minute early so in-flight calls never carry a dead token.
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in - 60),
        });
        Ok(access_token)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        request_id: Option<Uuid>,
    ) -> Result<(StatusCode, serde_json::Value), PayError> {
        let token = self.access_token().await?;
        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path))
            .bearer_auth(token);
        if method != Method::GET {
            request = request.header("Prefer", "return=representation");
        }
        if let Some(id) = request_id {
            request = request.header(REQUEST_ID_HEADER, id.to_string());
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PayError::remote(HttpErrorKind::Network, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| PayError::remote(HttpErrorKind::Network, e.to_string()))?;

        if !status.is_success() {
            let kind = HttpErrorKind::from_status(status.as_u16());
            return Err(PayError::remote(kind, format!("{path}: {text}")));
        }

        let value = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        Ok((status, value))
    }
}

#[async_trait]
impl PaymentProvider for RestClient {
    async fn fetch_order(&self, id: &RemoteOrderId) -> Result<RemoteOrder, PayError> {
        let (_, body) = self
            .send(
                Method::GET,
                &format!("/v2/checkout/orders/{}", id.as_str()),
                None,
                None,
            )
            .await?;
        convert_order(serde_json::from_value(body)?)
    }

    async fn patch_order(
        &self,
        current: &RemoteOrder,
        units: Vec<PurchaseUnit>,
        request_id: Uuid,
    ) -> Result<RemoteOrder, PayError> {
        let ops: Vec<serde_json::Value> = units
            .iter()
            .map(|unit| {
                serde_json::json!({
                    "op": "replace",
                    "path": format!("/purchase_units/@reference_id=='{}'", unit.reference_id),
                    "value": unit_to_wire(unit),
                })
            })
            .collect();
        self.send(
            Method::PATCH,
            &format!("/v2/checkout/orders/{}", current.id.as_str()),
            Some(serde_json::Value::Array(ops)),
            Some(request_id),
        )
        .await?;
        // PATCH returns 204; the updated representation needs a fresh GET.
        self.fetch_order(&current.id).await
    }

    async fn capture(
        &self,
        id: &RemoteOrderId,
        request_id: Uuid,
    ) -> Result<RemoteOrder, PayError> {
        let (_, body) = self
            .send(
                Method::POST,
                &format!("/v2/checkout/orders/{}/capture", id.as_str()),
                Some(serde_json::json!({})),
                Some(request_id),
            )
            .await?;
        convert_order(serde_json::from_value(body)?)
    }

    async fn authorize(
        &self,
        id: &RemoteOrderId,
        request_id: Uuid,
    ) -> Result<RemoteOrder, PayError> {
        let (_, body) = self
            .send(
                Method::POST,
                &format!("/v2/checkout/orders/{}/authorize", id.as_str()),
                Some(serde_json::json!({})),
                Some(request_id),
            )
            .await?;
        convert_order(serde_json::from_value(body)?)
    }

    async fn capture_authorization(
        &self,
        id: &AuthorizationId,
        request_id: Uuid,
    ) -> Result<Authorization, PayError> {
        let (_, body) = self
            .send(
                Method::POST,
                &format!("/v2/payments/authorizations/{}/capture", id.as_str()),
                Some(serde_json::json!({})),
                Some(request_id),
            )
            .await?;
        convert_authorization(serde_json::from_value(body)?)
    }

    async fn void_authorization(
        &self,
        id: &AuthorizationId,
        request_id: Uuid,
    ) -> Result<(), PayError> {
        self.send(
            Method::POST,
            &format!("/v2/payments/authorizations/{}/void", id.as_str()),
            None,
            Some(request_id),
        )
        .await?;
        Ok(())
    }

    async fn create_webhook(
        &self,
        url: &str,
        event_types: &[String],
    ) -> Result<WebhookSubscription, PayError> {
        let types: Vec<serde_json::Value> = event_types
            .iter()
            .map(|name| serde_json::json!({ "name": name }))
            .collect();
        let (_, body) = self
            .send(
                Method::POST,
                "/v1/notifications/webhooks",
                Some(serde_json::json!({ "url": url, "event_types": types })),
                None,
            )
            .await?;
        let wire: WireSubscription = serde_json::from_value(body)?;
        Ok(WebhookSubscription {
            id: SubscriptionId::new(wire.id)?,
            url: wire.url,
            event_types: wire.event_types.into_iter().map(|t| t.name).collect(),
        })
    }

    async fn delete_webhook(&self, id: &SubscriptionId) -> Result<(), PayError> {
        self.send(
            Method::DELETE,
            &format!("/v1/notifications/webhooks/{}", id.as_str()),
            None,
            None,
        )
        .await?;
        Ok(())
    }

    async fn verify_webhook_signature(
        &self,
        transmission: &WebhookTransmission,
        subscription_id: &SubscriptionId,
    ) -> Result<bool, PayError> {
        let event: serde_json::Value = serde_json::from_str(&transmission.body)?;
        let (_, body) = self
            .send(
                Method::POST,
                "/v1/notifications/verify-webhook-signature",
                Some(serde_json::json!({
                    "auth_algo": transmission.auth_algo,
                    "cert_url": transmission.cert_url,
                    "transmission_id": transmission.transmission_id,
                    "transmission_sig": transmission.transmission_sig,
                    "transmission_time": transmission.transmission_time,
                    "webhook_id": subscription_id.as_str(),
                    "webhook_event": event,
                })),
                None,
            )
            .await?;
        Ok(body.get("verification_status").and_then(|v| v.as_str()) == Some("SUCCESS"))
    }
}

// ── Wire types ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WireAmount {
    currency_code: String,
    value: String,
}

#[derive(Deserialize)]
struct WireAuthorization {
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct WireCapture {
    id: String,
    status: String,
}

#[derive(Deserialize, Default)]
struct WirePayments {
    #[serde(default)]
    authorizations: Vec<WireAuthorization>,
    #[serde(default)]
    captures: Vec<WireCapture>,
}

#[derive(Deserialize)]
struct WireItem {
    name: String,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Deserialize)]
struct WirePurchaseUnit {
    #[serde(default)]
    reference_id: Option<String>,
    amount: WireAmount,
    #[serde(default)]
    items: Vec<WireItem>,
    #[serde(default)]
    payments: Option<WirePayments>,
}

#[derive(Deserialize)]
struct WireThreeDs {
    #[serde(default)]
    authentication_status: Option<String>,
}

#[derive(Deserialize)]
struct WireAuthResult {
    #[serde(default)]
    liability_shift: Option<String>,
    #[serde(default)]
    three_d_secure: Option<WireThreeDs>,
}

#[derive(Deserialize)]
struct WireCard {
    #[serde(default)]
    last_digits: Option<String>,
    #[serde(default)]
    authentication_result: Option<WireAuthResult>,
}

#[derive(Deserialize)]
struct WirePaymentSource {
    #[serde(default)]
    card: Option<WireCard>,
}

#[derive(Deserialize)]
struct WireOrder {
    id: String,
    intent: String,
    status: String,
    #[serde(default)]
    purchase_units: Vec<WirePurchaseUnit>,
    #[serde(default)]
    payment_source: Option<WirePaymentSource>,
}

#[derive(Deserialize)]
struct WireEventType {
    name: String,
}

#[derive(Deserialize)]
struct WireSubscription {
    id: String,
    url: String,
    #[serde(default)]
    event_types: Vec<WireEventType>,
}

// ── Conversions ─────────────────────────────────────────────────────────────

fn convert_amount(wire: &WireAmount) -> Result<Money, PayError> {
    let currency = Currency::try_from(wire.currency_code.as_str())?;
    Money::from_wire(&wire.value, currency)
}

fn convert_authorization(wire: WireAuthorization) -> Result<Authorization, PayError> {
    Ok(Authorization {
        id: AuthorizationId::new(wire.id)?,
        status: AuthorizationStatus::try_from(wire.status.as_str())?,
    })
}

fn convert_item(wire: WireItem) -> Item {
    // Absent category means the merchant never classified the item; treat it
    // as shippable so the virtual-only shortcut stays conservative.
    let category = match wire.category.as_deref() {
        Some("DIGITAL_GOODS") => ItemCategory::DigitalGoods,
        _ => ItemCategory::PhysicalGoods,
    };
    Item {
        name: wire.name,
        category,
    }
}

fn convert_purchase_unit(wire: WirePurchaseUnit) -> Result<PurchaseUnit, PayError> {
    let payments = match wire.payments {
        Some(p) => Some(PurchaseUnitPayments {
            authorizations: p
                .authorizations
                .into_iter()
                .map(convert_authorization)
                .collect::<Result<_, _>>()?,
            captures: p
                .captures
                .into_iter()
                .map(|c| {
                    Ok::<_, PayError>(crate::domain::remote::Capture {
                        id: c.id,
                        status: AuthorizationStatus::try_from(c.status.as_str())?,
                    })
                })
                .collect::<Result<_, _>>()?,
        }),
        None => None,
    };
    Ok(PurchaseUnit {
        reference_id: wire.reference_id.unwrap_or_else(|| "default".to_string()),
        amount: convert_amount(&wire.amount)?,
        items: wire.items.into_iter().map(convert_item).collect(),
        payments,
    })
}

fn convert_liability_shift(raw: &str) -> Option<LiabilityShift> {
    match raw {
        "POSSIBLE" | "YES" => Some(LiabilityShift::Possible),
        "NO" => Some(LiabilityShift::No),
        "UNKNOWN" => Some(LiabilityShift::Unknown),
        _ => None,
    }
}

fn convert_payment_source(wire: WirePaymentSource) -> PaymentSource {
    PaymentSource {
        card: wire.card.map(|card| CardDetails {
            last_digits: card.last_digits,
            authentication_result: card.authentication_result.map(|auth| {
                CardAuthenticationResult {
                    liability_shift: auth
                        .liability_shift
                        .as_deref()
                        .and_then(convert_liability_shift),
                    authentication_status: auth
                        .three_d_secure
                        .and_then(|t| t.authentication_status),
                }
            }),
        }),
    }
}

fn convert_order(wire: WireOrder) -> Result<RemoteOrder, PayError> {
    Ok(RemoteOrder {
        id: RemoteOrderId::new(wire.id)?,
        intent: Intent::try_from(wire.intent.as_str())?,
        status: RemoteOrderStatus::try_from(wire.status.as_str())?,
        purchase_units: wire
            .purchase_units
            .into_iter()
            .map(convert_purchase_unit)
            .collect::<Result<_, _>>()?,
        payment_source: wire.payment_source.map(convert_payment_source),
    })
}

fn unit_to_wire(unit: &PurchaseUnit) -> serde_json::Value {
    serde_json::json!({
        "reference_id": unit.reference_id,
        "amount": {
            "currency_code": unit.amount.currency().as_str(),
            "value": unit.amount.wire_value(),
        },
    })
}
