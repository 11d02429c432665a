//! Subscription requests accepted from callers and events produced by notifications.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{validation_error, Error};
use crate::validation::{
    is_blank, is_missing_amount, require_fields, require_positive, validate_phone,
};

/// VPA used when the customer does not supply one. Approved by the sandbox simulator.
pub const DEFAULT_VPA: &str = "success@ybl";

pub const DEFAULT_PACKAGE_NAME: &str = "Service Package";

/// Longest mandate accepted: fifty years of monthly debits.
pub const MAX_INSTALLMENTS: u32 = 600;

/// Raw subscription initiation request as submitted by a caller.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    pub customer_name: Option<String>,
    /// Ten-digit mobile number.
    #[schema(example = "9876543210")]
    pub phone: Option<String>,
    /// Customer VPA. Validated with the gateway before setup when present.
    pub upi_id: Option<String>,
    pub package_name: Option<String>,
    #[schema(example = 1200)]
    pub total_amount: Option<Decimal>,
    #[schema(example = 100)]
    pub installment_amount: Option<Decimal>,
    #[schema(example = 12)]
    pub total_installments: Option<u32>,
    /// First debit date, `YYYY-MM-DD`. Defaults to today.
    #[schema(example = "2025-01-01")]
    pub start_date: Option<NaiveDate>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
}

/// A subscription request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SetupRequest {
    pub customer_name: String,
    pub phone: String,
    pub upi_id: Option<String>,
    pub package_name: String,
    pub total_amount: Decimal,
    pub installment_amount: Decimal,
    pub installments: u32,
    pub start_date: Option<NaiveDate>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
}

impl InitiateRequest {
    /// Check required fields and formats, producing a [`SetupRequest`].
    pub fn validate(self) -> Result<SetupRequest, Error> {
        require_fields(&[
            ("customerName", is_blank(self.customer_name.as_deref())),
            ("phone", is_blank(self.phone.as_deref())),
            ("totalAmount", is_missing_amount(self.total_amount)),
            ("installmentAmount", is_missing_amount(self.installment_amount)),
            (
                "totalInstallments",
                self.total_installments.map_or(true, |n| n == 0),
            ),
        ])?;

        // Presence was checked above
        let phone = self.phone.unwrap_or_default().trim().to_string();
        validate_phone(&phone)?;

        let total_amount = self.total_amount.unwrap_or_default();
        let installment_amount = self.installment_amount.unwrap_or_default();
        require_positive(total_amount, "totalAmount")?;
        require_positive(installment_amount, "installmentAmount")?;

        let installments = self.total_installments.unwrap_or_default();
        if installments > MAX_INSTALLMENTS {
            return Err(validation_error(format!(
                "totalInstallments must not exceed {MAX_INSTALLMENTS}"
            )));
        }

        Ok(SetupRequest {
            customer_name: self.customer_name.unwrap_or_default().trim().to_string(),
            phone,
            upi_id: self.upi_id.filter(|v| !v.trim().is_empty()),
            package_name: self
                .package_name
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PACKAGE_NAME.to_string()),
            total_amount,
            installment_amount,
            installments,
            start_date: self.start_date,
            customer_id: self.customer_id.filter(|v| !v.trim().is_empty()),
            subscription_id: self.subscription_id.filter(|v| !v.trim().is_empty()),
        })
    }
}

impl SetupRequest {
    pub fn vpa(&self) -> &str {
        self.upi_id.as_deref().unwrap_or(DEFAULT_VPA)
    }
}

/// Raw redemption request body. The subscription id comes from the path.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionParams {
    pub merchant_order_id: Option<String>,
    #[schema(example = 100)]
    pub amount: Option<Decimal>,
}

/// A validated redemption notify or execute request.
#[derive(Debug, Clone, PartialEq)]
pub struct RedemptionRequest {
    pub merchant_subscription_id: String,
    pub merchant_order_id: String,
    pub amount: Decimal,
}

impl RedemptionParams {
    pub fn validate(self, merchant_subscription_id: &str) -> Result<RedemptionRequest, Error> {
        require_fields(&[
            ("subscriptionId", merchant_subscription_id.trim().is_empty()),
            ("merchantOrderId", is_blank(self.merchant_order_id.as_deref())),
            ("amount", is_missing_amount(self.amount)),
        ])?;

        let amount = self.amount.unwrap_or_default();
        require_positive(amount, "amount")?;

        Ok(RedemptionRequest {
            merchant_subscription_id: merchant_subscription_id.trim().to_string(),
            merchant_order_id: self.merchant_order_id.unwrap_or_default(),
            amount,
        })
    }
}

/// A one-off collect payment through the legacy signed pay endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub phone: String,
    pub amount: Decimal,
    pub upi_id: Option<String>,
    pub customer_id: Option<String>,
}

impl PaymentRequest {
    pub fn new(phone: &str, amount: Decimal) -> Result<Self, Error> {
        validate_phone(phone)?;
        require_positive(amount, "amount")?;
        Ok(Self {
            phone: phone.to_string(),
            amount,
            upi_id: None,
            customer_id: None,
        })
    }

    pub fn vpa(&self) -> &str {
        self.upi_id.as_deref().unwrap_or(DEFAULT_VPA)
    }
}

/// State a subscription or payment moved to, as reported by a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    PaymentSucceeded,
    PaymentFailed,
    SubscriptionActive,
    SubscriptionCancelled,
    SubscriptionPaused,
    Unrecognized,
}

impl EventStatus {
    /// Map a gateway notification code onto the state it signals.
    pub fn from_code(code: &str) -> Self {
        match code {
            "PAYMENT_SUCCESS" | "SUCCESS" => EventStatus::PaymentSucceeded,
            "PAYMENT_ERROR" | "PAYMENT_DECLINED" => EventStatus::PaymentFailed,
            "SUBSCRIPTION_ACTIVATED" => EventStatus::SubscriptionActive,
            "SUBSCRIPTION_CANCELLED" => EventStatus::SubscriptionCancelled,
            "SUBSCRIPTION_PAUSED" => EventStatus::SubscriptionPaused,
            _ => EventStatus::Unrecognized,
        }
    }
}

/// Normalized record of one gateway notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionEvent {
    /// Subscription the event concerns, when the notification names one.
    pub entity_id: Option<String>,
    pub transaction_id: Option<String>,
    pub merchant_transaction_id: Option<String>,
    pub status: EventStatus,
    /// Code exactly as the gateway sent it.
    pub code: String,
    pub amount_minor: Option<i64>,
    pub reason: Option<String>,
    pub received_at: DateTime<Utc>,
}
