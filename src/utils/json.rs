use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;

pub const INVALID_BODY_MESSAGE: &str = "invalid request body";

/// JSON body extractor that reports every rejection as a 400 in the
/// service's own `{"message": ...}` shape.
pub struct JsonPayload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonPayload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonPayload(value)),
            Err(rejection) => Err(classify_rejection(rejection)),
        }
    }
}

fn classify_rejection(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::invalid_parameter("expected a JSON request body")
        }
        JsonRejection::JsonSyntaxError(_) => AppError::invalid_parameter("malformed JSON body"),
        other => {
            tracing::debug!(detail = %other.body_text(), "rejected request body");
            AppError::invalid_parameter(INVALID_BODY_MESSAGE)
        }
    }
}

pub enum NumericValue {
    Omitted,
    Number(f64),
    Invalid,
}

/// Accepts a JSON number or a string holding one, the way form-ish clients
/// send amounts.
pub fn classify_numeric(optional_value: Option<&Value>) -> NumericValue {
    match optional_value {
        None | Some(Value::Null) => NumericValue::Omitted,
        Some(Value::Number(number)) => number
            .as_f64()
            .map(NumericValue::Number)
            .unwrap_or(NumericValue::Invalid),
        Some(Value::String(raw)) => raw
            .trim()
            .parse::<f64>()
            .map(NumericValue::Number)
            .unwrap_or(NumericValue::Invalid),
        Some(_) => NumericValue::Invalid,
    }
}
