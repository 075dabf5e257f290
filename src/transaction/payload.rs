//! The request input for the transaction endpoints: the JSON body accepted
//! when creating or updating a transaction, and the ID in the request path.

use axum::{
    Json,
    extract::{
        Path,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{Transaction, TransactionBuilder, TransactionDate, TransactionType},
};

/// The request body for `POST /transactions` and `PUT /transactions/{id}`.
///
/// Every field is optional at the deserialization level so that a missing
/// field produces a validation message rather than a generic JSON error.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// Either "credit" or "debit".
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// A non-negative number.
    pub amount: Option<Value>,
    /// Optional free text.
    pub description: Option<String>,
    /// A `YYYY-MM-DD` date or an RFC 3339 date-time.
    pub date: Option<String>,
}

impl TransactionPayload {
    /// Check the payload and convert it into a [TransactionBuilder].
    ///
    /// # Errors
    /// Returns [Error::Validation] if `type`, `amount` or `date` is missing,
    /// if `type` is not "credit" or "debit", if `amount` is not a
    /// non-negative number, or if `date` is not a date or date-time.
    pub fn validate(self) -> Result<TransactionBuilder, Error> {
        let (Some(transaction_type), Some(amount), Some(date)) =
            (self.transaction_type, self.amount, self.date)
        else {
            return Err(Error::Validation(
                "type, amount, and date are required".to_owned(),
            ));
        };

        let transaction_type = transaction_type
            .parse::<TransactionType>()
            .map_err(|error| Error::Validation(error.to_string()))?;

        let amount = match amount.as_f64() {
            Some(amount) if amount >= 0.0 => amount,
            Some(amount) => {
                return Err(Error::Validation(format!(
                    "amount must not be negative, got {amount}"
                )));
            }
            None => {
                return Err(Error::Validation(format!(
                    "amount must be a number, got {amount}"
                )));
            }
        };

        let date = parse_date(&date)?;

        Ok(Transaction::build(transaction_type, amount, date).description(self.description))
    }
}

/// Unwrap the JSON body of a request, turning a malformed body into a
/// validation error.
pub(crate) fn extract_payload(
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<TransactionBuilder, Error> {
    let Json(payload) = payload.map_err(|rejection| Error::Validation(rejection.body_text()))?;

    payload.validate()
}

/// Unwrap the transaction ID in a request path, turning a malformed ID into
/// a validation error.
pub(crate) fn extract_transaction_id(
    path: Result<Path<TransactionId>, PathRejection>,
) -> Result<TransactionId, Error> {
    let Path(transaction_id) =
        path.map_err(|rejection| Error::Validation(rejection.body_text()))?;

    Ok(transaction_id)
}

fn parse_date(text: &str) -> Result<TransactionDate, Error> {
    text.parse::<TransactionDate>()
        .map_err(|error| Error::Validation(error.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::{date, datetime};

    use crate::{
        Error,
        transaction::{Transaction, TransactionDate, TransactionType},
    };

    use super::TransactionPayload;

    fn payload(value: serde_json::Value) -> TransactionPayload {
        serde_json::from_value(value).expect("Could not deserialize payload")
    }

    #[test]
    fn valid_payload_becomes_builder() {
        let builder = payload(json!({
            "type": "credit",
            "amount": 100,
            "description": "Salary",
            "date": "2024-01-01"
        }))
        .validate();

        assert_eq!(
            builder,
            Ok(
                Transaction::build(TransactionType::Credit, 100.0, date!(2024 - 01 - 01))
                    .description(Some("Salary".to_owned()))
            )
        );
    }

    #[test]
    fn description_is_optional() {
        let builder = payload(json!({"type": "debit", "amount": 2.5, "date": "2024-01-02"}))
            .validate()
            .unwrap();

        assert_eq!(builder.description, None);
    }

    #[test]
    fn zero_amount_is_allowed() {
        let builder = payload(json!({"type": "debit", "amount": 0, "date": "2024-01-02"}))
            .validate()
            .unwrap();

        assert_eq!(builder.amount, 0.0);
    }

    #[test]
    fn missing_fields_are_rejected() {
        for body in [
            json!({"amount": 1, "date": "2024-01-01"}),
            json!({"type": "credit", "date": "2024-01-01"}),
            json!({"type": "credit", "amount": 1}),
        ] {
            let result = payload(body.clone()).validate();

            assert!(
                matches!(result, Err(Error::Validation(_))),
                "want validation error for {body}, got {result:?}"
            );
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result =
            payload(json!({"type": "refund", "amount": 1, "date": "2024-01-01"})).validate();

        assert!(matches!(result, Err(Error::Validation(message)) if message.contains("refund")));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let result =
            payload(json!({"type": "credit", "amount": -5, "date": "2024-01-01"})).validate();

        assert!(matches!(result, Err(Error::Validation(message)) if message.contains("negative")));
    }

    #[test]
    fn non_numeric_amount_is_rejected() {
        let result =
            payload(json!({"type": "credit", "amount": "ten", "date": "2024-01-01"})).validate();

        assert!(matches!(result, Err(Error::Validation(message)) if message.contains("number")));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let result =
            payload(json!({"type": "credit", "amount": 1, "date": "01/02/2024"})).validate();

        assert!(matches!(result, Err(Error::Validation(message)) if message.contains("date")));
    }

    #[test]
    fn date_time_is_accepted() {
        let builder = payload(json!({
            "type": "credit",
            "amount": 1,
            "date": "2024-01-02T09:30:00Z"
        }))
        .validate()
        .unwrap();

        assert_eq!(
            builder.date,
            TransactionDate::DateTime(datetime!(2024-01-02 09:30 UTC))
        );
    }
}
