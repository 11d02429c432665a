//! The gateway client shared by every handler.
//!
//! Most calls carry only the cached access token. Signed calls add an `X-VERIFY`
//! computed over the base64 body and path, and status lookups sign the path.

use std::time::Duration;

use chrono::Utc;
use gateway_auth::credentials::Credentials;
use gateway_auth::error::upstream_error;
use gateway_auth::http::{AuthorizationScheme, GatewayClientBuilder};
use gateway_auth::oauth::providers::ClientCredentialsProvider;
use gateway_auth::oauth::token::Manager;
use gateway_auth::signature::{SignatureInput, Signer};
use gateway_auth::webhook::XVerifyWebhookValidator;
use log::*;
use reqwest::header::{HeaderValue, ACCEPT};
use reqwest::RequestBuilder;
use serde::Serialize;
use serde_json::Value;
use service::config::{Config, SetupVariant};

use super::call::{Authentication, CallKind, StatusPath};
use super::envelope::{self, SignedEnvelope};
use super::payload::{self, PayloadContext};
use crate::error::{config_error, DomainErrorKind, Error, ExternalErrorKind};
use crate::subscription::{PaymentRequest, RedemptionRequest, SetupRequest};

const X_VERIFY: &str = "X-VERIFY";
const X_MERCHANT_ID: &str = "X-MERCHANT-ID";
const X_CLIENT_ID: &str = "X-CLIENT-ID";

/// Client for the gateway's subscription APIs.
///
/// One instance serves every call kind. It owns the only shared mutable state in
/// the integration, the cached access token.
pub struct AutoPayClient {
    http_client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    signer: Signer,
    tokens: Manager<ClientCredentialsProvider>,
    auth_scheme: AuthorizationScheme,
    setup_variant: SetupVariant,
    redirect_url: String,
    webhook_url: String,
}

/// Settings the client is built from, resolved from [`Config`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub merchant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub client_version: String,
    pub key_index: u32,
    pub api_base_url: String,
    pub redirect_url: Option<String>,
    pub webhook_url: Option<String>,
    pub auth_scheme: AuthorizationScheme,
    pub setup_variant: SetupVariant,
    pub request_timeout: Duration,
}

impl From<&Config> for ClientSettings {
    fn from(config: &Config) -> Self {
        Self {
            merchant_id: config.merchant_id(),
            client_id: config.client_id(),
            client_secret: config.client_secret(),
            client_version: config.client_version().to_string(),
            key_index: config.key_index,
            api_base_url: config.api_base_url().to_string(),
            redirect_url: config.redirect_url(),
            webhook_url: config.webhook_url(),
            auth_scheme: config.auth_scheme,
            setup_variant: config.setup_variant,
            request_timeout: config.request_timeout(),
        }
    }
}

/// Result of a subscription setup, whichever contract was used.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupOutcome {
    pub setup_variant: String,
    pub merchant_subscription_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_transaction_id: Option<String>,
    /// Gateway-side order id, when returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_url: Option<String>,
    pub data: Value,
}

/// Result of a signed call that created a merchant transaction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOutcome {
    pub merchant_transaction_id: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VpaValidationOutcome {
    pub valid: bool,
    /// Account holder name, when the gateway discloses it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub data: Value,
}

impl AutoPayClient {
    /// Build a client from configuration.
    ///
    /// Fails with a configuration error naming the first required setting that is absent.
    pub fn new(config: &Config) -> Result<Self, Error> {
        Self::from_settings(ClientSettings::from(config))
    }

    pub fn from_settings(settings: ClientSettings) -> Result<Self, Error> {
        let credentials = Credentials::from_parts(
            settings.merchant_id,
            settings.client_id,
            settings.client_secret,
            Some(settings.client_version),
            settings.key_index,
        )?;
        let redirect_url = required_url(settings.redirect_url, "redirect_url")?;
        let webhook_url = required_url(settings.webhook_url, "webhook_url")?;

        let http_client = GatewayClientBuilder::new()
            .with_timeout(settings.request_timeout)
            .build()?;
        let base_url = settings.api_base_url.trim_end_matches('/').to_string();
        let provider =
            ClientCredentialsProvider::new(&base_url, credentials.clone(), http_client.clone());

        info!(
            "AutoPay client ready for merchant {} at {} (setup variant {}, {} auth)",
            credentials.merchant_id(),
            base_url,
            settings.setup_variant,
            settings.auth_scheme
        );

        Ok(Self {
            http_client,
            base_url,
            signer: Signer::new(credentials.clone()),
            credentials,
            tokens: Manager::new(provider),
            auth_scheme: settings.auth_scheme,
            setup_variant: settings.setup_variant,
            redirect_url,
            webhook_url,
        })
    }

    pub fn merchant_id(&self) -> &str {
        self.credentials.merchant_id()
    }

    pub fn setup_variant(&self) -> SetupVariant {
        self.setup_variant
    }

    /// Validator for notifications signed with this merchant's secret.
    pub fn webhook_validator(&self) -> XVerifyWebhookValidator {
        XVerifyWebhookValidator::from_credentials(&self.credentials)
    }

    /// Set up a subscription using the configured contract.
    pub async fn setup_subscription(&self, request: &SetupRequest) -> Result<SetupOutcome, Error> {
        let ctx = self.payload_context();
        info!(
            "Setting up subscription for {} installments of {} ({})",
            request.installments, request.installment_amount, self.setup_variant
        );

        let outcome = match self.setup_variant {
            SetupVariant::AutoDebit => {
                let payload = payload::auto_debit_setup(&ctx, request)?;
                let data = self
                    .post_authenticated(CallKind::SubscriptionSetup, &payload)
                    .await?;
                SetupOutcome::new(
                    self.setup_variant,
                    payload.merchant_subscription_id,
                    Some(payload.merchant_order_id),
                    None,
                    data,
                )
            }
            SetupVariant::PaymentFlow => {
                let payload = payload::payment_flow_setup(&ctx, request)?;
                let data = self
                    .post_authenticated(CallKind::SubscriptionSetup, &payload)
                    .await?;
                SetupOutcome::new(
                    self.setup_variant,
                    payload.payment_flow.merchant_subscription_id,
                    Some(payload.merchant_order_id),
                    None,
                    data,
                )
            }
            SetupVariant::RecurringAuthInit => {
                let payload = payload::recurring_auth_init(&ctx, request)?;
                let data = self
                    .post_signed(CallKind::RecurringAuthInit, &payload)
                    .await?;
                SetupOutcome::new(
                    self.setup_variant,
                    payload.subscription_details.subscription_id,
                    Some(payload.merchant_order_id),
                    Some(payload.merchant_transaction_id),
                    data,
                )
            }
            SetupVariant::RecurringDebitInit => {
                let outcome = self.recurring_debit(request).await?;
                SetupOutcome::new(
                    self.setup_variant,
                    request.subscription_id.clone().unwrap_or_default(),
                    None,
                    Some(outcome.merchant_transaction_id),
                    outcome.data,
                )
            }
        };

        info!(
            "Subscription {} setup accepted (state {:?})",
            outcome.merchant_subscription_id, outcome.state
        );
        Ok(outcome)
    }

    /// Debit against an existing mandate through the signed debit call.
    pub async fn recurring_debit(&self, request: &SetupRequest) -> Result<SignedOutcome, Error> {
        let payload = payload::recurring_debit_init(&self.payload_context(), request)?;
        let data = self
            .post_signed(CallKind::RecurringDebitInit, &payload)
            .await?;
        Ok(SignedOutcome {
            merchant_transaction_id: payload.merchant_transaction_id,
            data,
        })
    }

    pub async fn order_status(&self, order_id: &str) -> Result<Value, Error> {
        self.get_authenticated(CallKind::OrderStatus { order_id })
            .await
    }

    /// Subscription status, at the path matching the configured setup contract.
    pub async fn subscription_status(&self, subscription_id: &str) -> Result<Value, Error> {
        let layout = match self.setup_variant {
            SetupVariant::PaymentFlow => StatusPath::Nested,
            _ => StatusPath::Flat,
        };
        self.get_authenticated(CallKind::SubscriptionStatus {
            subscription_id,
            layout,
        })
        .await
    }

    /// Tell the gateway a debit is coming so the customer can be notified.
    pub async fn notify_redemption(&self, request: &RedemptionRequest) -> Result<Value, Error> {
        let payload = payload::redemption(self.merchant_id(), request)?;
        self.post_authenticated(CallKind::RedemptionNotify, &payload)
            .await
    }

    /// Execute a previously notified debit.
    pub async fn execute_redemption(&self, request: &RedemptionRequest) -> Result<Value, Error> {
        let payload = payload::redemption(self.merchant_id(), request)?;
        self.post_authenticated(CallKind::RedemptionExecute, &payload)
            .await
    }

    pub async fn cancel_subscription(&self, subscription_id: &str) -> Result<Value, Error> {
        let payload = payload::cancellation(self.merchant_id());
        self.post_authenticated(CallKind::Cancel { subscription_id }, &payload)
            .await
    }

    /// Ask the gateway whether a VPA exists before collecting against it.
    pub async fn validate_vpa(&self, vpa: &str) -> Result<VpaValidationOutcome, Error> {
        let data = self
            .post_authenticated(CallKind::VpaValidation, &payload::vpa_validation(vpa))
            .await?;

        // Some responses nest the verdict under `data`
        let verdict = data.get("data").filter(|d| d.is_object()).unwrap_or(&data);
        let valid = verdict
            .get("valid")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let name = verdict
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);

        debug!("VPA validation result: valid={}", valid);
        Ok(VpaValidationOutcome { valid, name, data })
    }

    /// One-off collect payment through the signed pay call.
    pub async fn legacy_pay(&self, request: &PaymentRequest) -> Result<SignedOutcome, Error> {
        let payload = payload::legacy_pay(&self.payload_context(), request)?;
        let data = self.post_signed(CallKind::LegacyPay, &payload).await?;
        Ok(SignedOutcome {
            merchant_transaction_id: payload.merchant_transaction_id,
            data,
        })
    }

    /// Status of a transaction created through a signed call, scoped by merchant.
    pub async fn transaction_status(&self, transaction_id: &str) -> Result<Value, Error> {
        self.get_signed_path(CallKind::LegacyTransactionStatus {
            merchant_id: self.merchant_id(),
            transaction_id,
        })
        .await
    }

    /// Status of a recurring init or debit transaction.
    pub async fn recurring_transaction_status(
        &self,
        transaction_id: &str,
    ) -> Result<Value, Error> {
        self.get_signed_path(CallKind::TransactionStatus { transaction_id })
            .await
    }

    /// GET a bodiless call whose `X-VERIFY` is computed over the path.
    async fn get_signed_path(&self, kind: CallKind<'_>) -> Result<Value, Error> {
        let path = kind.path();
        let mut request = self
            .http_client
            .request(kind.method(), self.url(&path))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(X_MERCHANT_ID, self.merchant_id());

        request = match kind.authentication() {
            Authentication::SignedPathWithKeyIndex => {
                let token = self.tokens.get_token().await?;
                let x_verify = self
                    .signer
                    .sign(SignatureInput::PathWithKeyIndex { path: &path });
                self.auth_scheme
                    .authenticate(request.header(X_VERIFY, x_verify), &token)
            }
            _ => {
                let x_verify = self.signer.sign(SignatureInput::PathOnly { path: &path });
                request
                    .header(X_VERIFY, x_verify)
                    .header(X_CLIENT_ID, self.credentials.client_id())
            }
        };

        let body = self.send(&kind, request).await?;
        envelope::attach_decoded(body)
    }

    async fn get_authenticated(&self, kind: CallKind<'_>) -> Result<Value, Error> {
        let request = self.authenticated(&kind).await?;
        self.send(&kind, request).await
    }

    async fn post_authenticated<T: Serialize>(
        &self,
        kind: CallKind<'_>,
        payload: &T,
    ) -> Result<Value, Error> {
        let request = self.authenticated(&kind).await?.json(payload);
        self.send(&kind, request).await
    }

    /// POST `{request: base64(payload)}` with an `X-VERIFY` over the encoded body and path.
    async fn post_signed<T: Serialize>(
        &self,
        kind: CallKind<'_>,
        payload: &T,
    ) -> Result<Value, Error> {
        let path = kind.path();
        let encoded = envelope::encode(payload)?;
        let x_verify = self
            .signer
            .sign(SignatureInput::body_and_path(&encoded, &path));

        let mut request = self
            .http_client
            .request(kind.method(), self.url(&path))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(X_VERIFY, x_verify)
            .header(X_MERCHANT_ID, self.merchant_id())
            .header(X_CLIENT_ID, self.credentials.client_id());

        if kind.authentication() == (Authentication::SignedBody { with_bearer: true }) {
            let token = self.tokens.get_token().await?;
            request = self.auth_scheme.authenticate(request, &token);
        }

        let body = self
            .send(&kind, request.json(&SignedEnvelope { request: encoded }))
            .await?;
        envelope::attach_decoded(body)
    }

    async fn authenticated(&self, kind: &CallKind<'_>) -> Result<RequestBuilder, Error> {
        let token = self.tokens.get_token().await?;
        let request = self
            .http_client
            .request(kind.method(), self.url(&kind.path()))
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(self.auth_scheme.authenticate(request, &token))
    }

    async fn send(&self, kind: &CallKind<'_>, request: RequestBuilder) -> Result<Value, Error> {
        debug!("Sending {} request: {} {}", kind, kind.method(), kind.path());

        let response = request.send().await.map_err(|err| {
            warn!("Gateway {} request failed: {err:?}", kind);
            Error::from(err)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Gateway rejected {} request: {} - {}", kind, status, body);
            return Err(upstream_error(status.as_u16(), body).into());
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|err| {
            warn!("Gateway {} response is not JSON: {err:?}", kind);
            Error {
                source: Some(Box::new(err)),
                error_kind: DomainErrorKind::External(ExternalErrorKind::InvalidResponse),
            }
        })
    }

    fn payload_context(&self) -> PayloadContext<'_> {
        PayloadContext {
            merchant_id: self.merchant_id(),
            redirect_url: &self.redirect_url,
            webhook_url: &self.webhook_url,
            now: Utc::now(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl SetupOutcome {
    fn new(
        variant: SetupVariant,
        merchant_subscription_id: String,
        merchant_order_id: Option<String>,
        merchant_transaction_id: Option<String>,
        data: Value,
    ) -> Self {
        let field = |name: &str| data.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            setup_variant: variant.to_string(),
            merchant_subscription_id,
            merchant_order_id,
            merchant_transaction_id,
            order_id: field("orderId"),
            state: field("state"),
            intent_url: field("intentUrl"),
            data,
        }
    }
}

fn required_url(value: Option<String>, setting: &str) -> Result<String, Error> {
    value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        warn!("Required setting `{}` is not configured", setting);
        config_error(setting)
    })
}
