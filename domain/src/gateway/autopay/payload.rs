//! Request bodies in the shapes the gateway expects.
//!
//! Builders are pure: they take the current time explicitly so generated ids and
//! expiry instants are reproducible.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Error;
use crate::money::{to_minor_units, CURRENCY};
use crate::schedule::{end_date, format_date, generate_id, mandate_expire_at, order_expire_at};
use crate::subscription::{PaymentRequest, RedemptionRequest, SetupRequest};

const FREQUENCY_MONTHLY: &str = "MONTHLY";
const AMOUNT_TYPE_FIXED: &str = "FIXED";
const AUTH_WORKFLOW_TRANSACTION: &str = "TRANSACTION";
const REDIRECT_MODE: &str = "REDIRECT";
const UPI_COLLECT: &str = "UPI_COLLECT";
const UPI_MANDATE: &str = "UPI_MANDATE";
const MANDATE_TARGET_APP: &str = "com.phonepe.app";

/// Merchant settings and the instant every builder needs.
#[derive(Debug, Clone, Copy)]
pub struct PayloadContext<'a> {
    pub merchant_id: &'a str,
    pub redirect_url: &'a str,
    pub webhook_url: &'a str,
    pub now: DateTime<Utc>,
}

impl PayloadContext<'_> {
    fn id(&self, prefix: &str) -> String {
        generate_id(prefix, self.now)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceContext {
    #[serde(rename = "deviceOS")]
    pub device_os: &'static str,
}

impl DeviceContext {
    fn web() -> Self {
        Self { device_os: "WEB" }
    }

    fn android() -> Self {
        Self {
            device_os: "ANDROID",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInstrument {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_app: Option<&'static str>,
    pub vpa: String,
}

/// Setup through `/subscriptions/v2/setup` with an `autoDebit` block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoDebitSetup {
    pub merchant_id: String,
    pub merchant_subscription_id: String,
    pub merchant_order_id: String,
    pub merchant_user_id: String,
    pub amount: i64,
    pub currency: &'static str,
    pub mobile_number: String,
    pub device_context: DeviceContext,
    pub payment_instrument: PaymentInstrument,
    pub auto_debit: AutoDebit,
    pub callback_url: String,
    pub redirect_url: String,
    pub redirect_mode: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoDebit {
    pub subscription_start_date: String,
    pub subscription_end_date: String,
    pub frequency: &'static str,
    pub subscription_amount_type: &'static str,
    pub subscription_amount: i64,
    pub max_amount: i64,
}

pub fn auto_debit_setup(ctx: &PayloadContext, request: &SetupRequest) -> Result<AutoDebitSetup, Error> {
    let amount = to_minor_units(request.installment_amount)?;
    let start = request.start_date.unwrap_or_else(|| ctx.now.date_naive());
    let end = end_date(start, request.installments)?;

    Ok(AutoDebitSetup {
        merchant_id: ctx.merchant_id.to_string(),
        merchant_subscription_id: subscription_id(ctx, request),
        merchant_order_id: ctx.id("MO"),
        merchant_user_id: user_id(ctx, request.customer_id.as_deref()),
        amount,
        currency: CURRENCY,
        mobile_number: request.phone.clone(),
        device_context: DeviceContext::web(),
        payment_instrument: PaymentInstrument {
            kind: UPI_COLLECT,
            target_app: None,
            vpa: request.vpa().to_string(),
        },
        auto_debit: AutoDebit {
            subscription_start_date: format_date(start),
            subscription_end_date: format_date(end),
            frequency: FREQUENCY_MONTHLY,
            subscription_amount_type: AMOUNT_TYPE_FIXED,
            subscription_amount: amount,
            max_amount: amount,
        },
        callback_url: ctx.webhook_url.to_string(),
        redirect_url: ctx.redirect_url.to_string(),
        redirect_mode: REDIRECT_MODE,
    })
}

/// Setup through `/subscriptions/v2/setup` with a `paymentFlow` block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFlowSetup {
    pub merchant_order_id: String,
    pub amount: i64,
    /// Epoch milliseconds.
    pub expire_at: i64,
    pub payment_flow: PaymentFlow,
    pub device_context: DeviceContext,
    pub meta_info: MetaInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFlow {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub merchant_subscription_id: String,
    pub auth_workflow_type: &'static str,
    pub amount_type: &'static str,
    pub max_amount: i64,
    pub frequency: &'static str,
    /// Epoch milliseconds.
    pub expire_at: i64,
    pub payment_mode: PaymentMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentMode {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub details: PaymentModeDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentModeDetails {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub vpa: String,
}

/// Free-form merchant fields echoed back in notifications.
#[derive(Debug, Clone, Serialize)]
pub struct MetaInfo {
    pub udf1: String,
    pub udf2: String,
    pub udf3: String,
    pub udf4: String,
    pub udf5: String,
}

pub fn payment_flow_setup(
    ctx: &PayloadContext,
    request: &SetupRequest,
) -> Result<PaymentFlowSetup, Error> {
    let amount = to_minor_units(request.installment_amount)?;

    Ok(PaymentFlowSetup {
        merchant_order_id: ctx.id("MO"),
        amount,
        expire_at: order_expire_at(ctx.now),
        payment_flow: PaymentFlow {
            kind: "SUBSCRIPTION_SETUP",
            merchant_subscription_id: subscription_id(ctx, request),
            auth_workflow_type: AUTH_WORKFLOW_TRANSACTION,
            amount_type: AMOUNT_TYPE_FIXED,
            max_amount: amount,
            frequency: FREQUENCY_MONTHLY,
            expire_at: mandate_expire_at(ctx.now, request.installments)?,
            payment_mode: PaymentMode {
                kind: UPI_COLLECT,
                details: PaymentModeDetails {
                    kind: "VPA",
                    vpa: request.vpa().to_string(),
                },
            },
        },
        device_context: DeviceContext::android(),
        meta_info: MetaInfo {
            udf1: request.customer_name.clone(),
            udf2: request.phone.clone(),
            udf3: request.package_name.clone(),
            udf4: format!("Installments: {}", request.installments),
            udf5: format!("Total: {}", request.total_amount),
        },
    })
}

/// Mandate creation through the signed `/v3/recurring/auth/init` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringAuthInit {
    pub merchant_id: String,
    pub merchant_transaction_id: String,
    pub merchant_user_id: String,
    pub amount: i64,
    pub mobile_number: String,
    pub device_context: DeviceContext,
    pub payment_instrument: PaymentInstrument,
    pub subscription_details: SubscriptionDetails,
    pub merchant_order_id: String,
    pub message: String,
    pub callback_url: String,
    pub redirect_url: String,
    pub redirect_mode: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDetails {
    pub subscription_id: String,
    pub auth_workflow_type: &'static str,
    pub amount_type: &'static str,
    pub amount: i64,
    pub frequency: &'static str,
    pub recurring_count: u32,
    pub start_date: String,
    pub end_date: String,
}

pub fn recurring_auth_init(
    ctx: &PayloadContext,
    request: &SetupRequest,
) -> Result<RecurringAuthInit, Error> {
    let amount = to_minor_units(request.installment_amount)?;
    let start = request.start_date.unwrap_or_else(|| ctx.now.date_naive());
    let end = end_date(start, request.installments)?;
    let transaction_id = ctx.id("TXN");

    Ok(RecurringAuthInit {
        merchant_id: ctx.merchant_id.to_string(),
        merchant_transaction_id: transaction_id.clone(),
        merchant_user_id: user_id(ctx, request.customer_id.as_deref()),
        amount,
        mobile_number: request.phone.clone(),
        device_context: DeviceContext::web(),
        payment_instrument: PaymentInstrument {
            kind: UPI_MANDATE,
            target_app: Some(MANDATE_TARGET_APP),
            vpa: request.vpa().to_string(),
        },
        subscription_details: SubscriptionDetails {
            subscription_id: subscription_id(ctx, request),
            auth_workflow_type: AUTH_WORKFLOW_TRANSACTION,
            amount_type: AMOUNT_TYPE_FIXED,
            amount,
            frequency: FREQUENCY_MONTHLY,
            recurring_count: request.installments,
            start_date: format_date(start),
            end_date: format_date(end),
        },
        merchant_order_id: transaction_id,
        message: request.package_name.clone(),
        callback_url: ctx.webhook_url.to_string(),
        redirect_url: ctx.redirect_url.to_string(),
        redirect_mode: REDIRECT_MODE,
    })
}

/// Debit against an existing mandate through the signed `/v3/recurring/debit/init` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringDebitInit {
    pub merchant_id: String,
    pub merchant_transaction_id: String,
    pub merchant_user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    pub amount: i64,
    pub mobile_number: String,
    pub device_context: DeviceContext,
    pub payment_instrument: PaymentInstrument,
    pub callback_url: String,
    pub redirect_url: String,
    pub redirect_mode: &'static str,
}

pub fn recurring_debit_init(
    ctx: &PayloadContext,
    request: &SetupRequest,
) -> Result<RecurringDebitInit, Error> {
    Ok(RecurringDebitInit {
        merchant_id: ctx.merchant_id.to_string(),
        merchant_transaction_id: ctx.id("REC"),
        merchant_user_id: user_id(ctx, request.customer_id.as_deref()),
        subscription_id: request.subscription_id.clone(),
        amount: to_minor_units(request.installment_amount)?,
        mobile_number: request.phone.clone(),
        device_context: DeviceContext::web(),
        payment_instrument: PaymentInstrument {
            kind: UPI_MANDATE,
            target_app: None,
            vpa: request.vpa().to_string(),
        },
        callback_url: ctx.webhook_url.to_string(),
        redirect_url: ctx.redirect_url.to_string(),
        redirect_mode: REDIRECT_MODE,
    })
}

/// Body shared by redemption notify and redemption execute.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub merchant_id: String,
    pub merchant_subscription_id: String,
    pub merchant_order_id: String,
    pub amount: i64,
    pub currency: &'static str,
}

pub fn redemption(merchant_id: &str, request: &RedemptionRequest) -> Result<Redemption, Error> {
    Ok(Redemption {
        merchant_id: merchant_id.to_string(),
        merchant_subscription_id: request.merchant_subscription_id.clone(),
        merchant_order_id: request.merchant_order_id.clone(),
        amount: to_minor_units(request.amount)?,
        currency: CURRENCY,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub merchant_id: String,
}

pub fn cancellation(merchant_id: &str) -> Cancellation {
    Cancellation {
        merchant_id: merchant_id.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VpaValidation {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub vpa: String,
}

pub fn vpa_validation(vpa: &str) -> VpaValidation {
    VpaValidation {
        kind: "VPA",
        vpa: vpa.to_string(),
    }
}

/// One-off collect payment through the signed `/pg/v1/pay` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPay {
    pub merchant_id: String,
    pub merchant_transaction_id: String,
    pub merchant_user_id: String,
    pub amount: i64,
    pub redirect_url: String,
    pub redirect_mode: &'static str,
    pub callback_url: String,
    pub mobile_number: String,
    pub payment_instrument: PaymentInstrument,
}

pub fn legacy_pay(ctx: &PayloadContext, request: &PaymentRequest) -> Result<LegacyPay, Error> {
    Ok(LegacyPay {
        merchant_id: ctx.merchant_id.to_string(),
        merchant_transaction_id: ctx.id("TXN"),
        merchant_user_id: user_id(ctx, request.customer_id.as_deref()),
        amount: to_minor_units(request.amount)?,
        redirect_url: ctx.redirect_url.to_string(),
        redirect_mode: REDIRECT_MODE,
        callback_url: ctx.webhook_url.to_string(),
        mobile_number: request.phone.clone(),
        payment_instrument: PaymentInstrument {
            kind: UPI_COLLECT,
            target_app: None,
            vpa: request.vpa().to_string(),
        },
    })
}

fn subscription_id(ctx: &PayloadContext, request: &SetupRequest) -> String {
    request
        .subscription_id
        .clone()
        .unwrap_or_else(|| ctx.id("MS"))
}

fn user_id(ctx: &PayloadContext, customer_id: Option<&str>) -> String {
    customer_id
        .map(str::to_string)
        .unwrap_or_else(|| ctx.id("CUST"))
}
