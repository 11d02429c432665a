//! Outbound gateway calls and how each one is addressed and authenticated.

use std::fmt;

use reqwest::Method;
use urlencoding::encode;

/// How a call proves who is making it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authentication {
    /// `Authorization: <scheme> <token>` only.
    Bearer,
    /// Base64 `{request}` envelope signed over body and path, plus `X-MERCHANT-ID`.
    /// Carries the bearer token as well when `with_bearer` is set.
    SignedBody { with_bearer: bool },
    /// Bodiless call signed over the path alone, plus merchant and client ids.
    SignedPath,
    /// Bodiless call signed over the path and key index, plus the bearer token
    /// and merchant id.
    SignedPathWithKeyIndex,
}

/// Where the subscription status endpoint lives for a given setup contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPath {
    /// `/subscriptions/v2/{id}/status`
    Flat,
    /// `/subscriptions/v2/subscription/{id}/status`
    Nested,
}

/// Every call this crate makes to the gateway, with its path parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind<'a> {
    SubscriptionSetup,
    RecurringAuthInit,
    RecurringDebitInit,
    OrderStatus { order_id: &'a str },
    SubscriptionStatus {
        subscription_id: &'a str,
        layout: StatusPath,
    },
    RedemptionNotify,
    RedemptionExecute,
    Cancel { subscription_id: &'a str },
    VpaValidation,
    LegacyPay,
    LegacyTransactionStatus {
        merchant_id: &'a str,
        transaction_id: &'a str,
    },
    TransactionStatus { transaction_id: &'a str },
}

impl CallKind<'_> {
    pub fn method(&self) -> Method {
        match self {
            CallKind::OrderStatus { .. }
            | CallKind::SubscriptionStatus { .. }
            | CallKind::LegacyTransactionStatus { .. }
            | CallKind::TransactionStatus { .. } => Method::GET,
            _ => Method::POST,
        }
    }

    /// Path relative to the API base URL. Identifiers are percent-encoded.
    pub fn path(&self) -> String {
        match self {
            CallKind::SubscriptionSetup => "/subscriptions/v2/setup".to_string(),
            CallKind::RecurringAuthInit => "/v3/recurring/auth/init".to_string(),
            CallKind::RecurringDebitInit => "/v3/recurring/debit/init".to_string(),
            CallKind::OrderStatus { order_id } => {
                format!("/subscriptions/v2/order/{}/status", encode(order_id))
            }
            CallKind::SubscriptionStatus {
                subscription_id,
                layout: StatusPath::Flat,
            } => format!("/subscriptions/v2/{}/status", encode(subscription_id)),
            CallKind::SubscriptionStatus {
                subscription_id,
                layout: StatusPath::Nested,
            } => format!(
                "/subscriptions/v2/subscription/{}/status",
                encode(subscription_id)
            ),
            CallKind::RedemptionNotify => "/subscriptions/v2/notify".to_string(),
            CallKind::RedemptionExecute => "/subscriptions/v2/redeem".to_string(),
            CallKind::Cancel { subscription_id } => {
                format!("/subscriptions/v2/{}/cancel", encode(subscription_id))
            }
            CallKind::VpaValidation => "/v2/validate/upi".to_string(),
            CallKind::LegacyPay => "/pg/v1/pay".to_string(),
            CallKind::LegacyTransactionStatus {
                merchant_id,
                transaction_id,
            } => format!(
                "/v3/transaction/{}/{}/status",
                encode(merchant_id),
                encode(transaction_id)
            ),
            CallKind::TransactionStatus { transaction_id } => {
                format!("/v3/transaction/{}/status", encode(transaction_id))
            }
        }
    }

    pub fn authentication(&self) -> Authentication {
        match self {
            CallKind::RecurringAuthInit | CallKind::RecurringDebitInit => {
                Authentication::SignedBody { with_bearer: true }
            }
            CallKind::LegacyPay => Authentication::SignedBody { with_bearer: false },
            CallKind::LegacyTransactionStatus { .. } => Authentication::SignedPath,
            CallKind::TransactionStatus { .. } => Authentication::SignedPathWithKeyIndex,
            _ => Authentication::Bearer,
        }
    }
}

impl fmt::Display for CallKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CallKind::SubscriptionSetup => "subscription setup",
            CallKind::RecurringAuthInit => "recurring auth init",
            CallKind::RecurringDebitInit => "recurring debit init",
            CallKind::OrderStatus { .. } => "order status",
            CallKind::SubscriptionStatus { .. } => "subscription status",
            CallKind::RedemptionNotify => "redemption notify",
            CallKind::RedemptionExecute => "redemption execute",
            CallKind::Cancel { .. } => "subscription cancel",
            CallKind::VpaValidation => "VPA validation",
            CallKind::LegacyPay => "legacy pay",
            CallKind::LegacyTransactionStatus { .. } => "legacy transaction status",
            CallKind::TransactionStatus { .. } => "transaction status",
        };
        write!(f, "{name}")
    }
}
