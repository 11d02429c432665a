use domain::subscription::PaymentRequest;
use domain::validation::{is_blank, is_missing_amount, require_fields};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

/// Body the gateway posts when it returns the customer's browser, as a form or JSON.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub(crate) struct CallbackParams {
    /// Base64-encoded JSON outcome.
    pub(crate) response: Option<String>,
}

/// One-off collect payment through the signed pay endpoint.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentParams {
    #[schema(example = "9876543210")]
    pub(crate) phone: Option<String>,
    #[schema(example = 499)]
    pub(crate) amount: Option<Decimal>,
    pub(crate) upi_id: Option<String>,
    pub(crate) customer_id: Option<String>,
}

impl TryFrom<PaymentParams> for PaymentRequest {
    type Error = domain::error::Error;

    fn try_from(params: PaymentParams) -> Result<Self, Self::Error> {
        require_fields(&[
            ("phone", is_blank(params.phone.as_deref())),
            ("amount", is_missing_amount(params.amount)),
        ])?;

        let mut request = PaymentRequest::new(
            params.phone.unwrap_or_default().trim(),
            params.amount.unwrap_or_default(),
        )?;
        request.upi_id = params.upi_id.filter(|v| !v.trim().is_empty());
        request.customer_id = params.customer_id.filter(|v| !v.trim().is_empty());
        Ok(request)
    }
}
