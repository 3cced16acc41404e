//! Response contracts of the device-info and mark-point endpoints.
//!
//! Both bodies are loose JSON. The device-info record may sit under a
//! `deviceInfo` key or at the top level; its `dtTimeEvent` is a raw
//! `new Date(...)` call.

use chrono::NaiveDateTime;
use ponto_core::{DeviceCapabilities, Severity};
use ponto_loose_json::{LooseValue, deserialize_date_marker, parse_loose};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::ApiError;

/// Decoded device-info response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Capability flags of the device.
    pub capabilities: DeviceCapabilities,
    /// Device-reported wall-clock time.
    pub clock_time: NaiveDateTime,
}

/// Decoded mark-point envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkPointResponse {
    /// `{success: true, msg: {msg, type}}`.
    Accepted {
        /// Message text to show.
        message: String,
        /// Severity reported with the message.
        severity: Severity,
    },
    /// `{success: false, error}`.
    Rejected {
        /// Server error text.
        error: String,
    },
}

#[derive(Deserialize)]
struct DeviceInfoRecord {
    #[serde(rename = "useCracha", default, deserialize_with = "deserialize_flag")]
    use_cracha: bool,
    #[serde(rename = "useUserPwd", default, deserialize_with = "deserialize_flag")]
    use_user_pwd: bool,
    #[serde(rename = "oplLiberarFolhaRVirtual", default, deserialize_with = "deserialize_flag")]
    leave: bool,
    #[serde(rename = "oplLiberarCCustoRVirtual", default, deserialize_with = "deserialize_flag")]
    cost_center: bool,
    #[serde(rename = "oplLiberarFuncoesRVirtual", default, deserialize_with = "deserialize_flag")]
    function: bool,
    #[serde(rename = "dtTimeEvent", deserialize_with = "deserialize_date_marker")]
    time_event: NaiveDateTime,
}

#[derive(Deserialize)]
struct MarkPointEnvelope {
    #[serde(deserialize_with = "deserialize_flag")]
    success: bool,
    #[serde(default)]
    msg: Option<MessageRecord>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct MessageRecord {
    msg: String,
    #[serde(rename = "type", default, deserialize_with = "deserialize_code")]
    kind: i64,
}

/// Decodes a raw device-info body.
///
/// # Errors
/// Returns [`ApiError::Decode`] for malformed bodies, missing `dtTimeEvent`
/// or impossible dates.
pub fn decode_device_info(raw: &str) -> Result<DeviceInfo, ApiError> {
    let parsed = parse_loose(raw)?;
    let record = match parsed.get("deviceInfo") {
        Some(inner @ LooseValue::Object(_)) => inner.clone(),
        _ => parsed,
    };

    let record: DeviceInfoRecord = serde_json::from_value(record.into_json())
        .map_err(|error| ApiError::Decode(error.into()))?;

    Ok(DeviceInfo {
        capabilities: DeviceCapabilities {
            cracha: record.use_cracha,
            user_pwd: record.use_user_pwd,
            leave: record.leave,
            cost_center: record.cost_center,
            function: record.function,
        },
        clock_time: record.time_event,
    })
}

/// Decodes a raw mark-point body.
///
/// # Errors
/// Returns [`ApiError::Decode`] for malformed bodies and
/// [`ApiError::InvalidResponse`] when the envelope lacks the field its
/// `success` flag promises.
pub fn decode_mark_point(raw: &str) -> Result<MarkPointResponse, ApiError> {
    let envelope: MarkPointEnvelope = ponto_loose_json::decode_loose(raw)?;

    if envelope.success {
        let message = envelope.msg.ok_or_else(|| {
            ApiError::InvalidResponse("success envelope without msg".to_string())
        })?;
        return Ok(MarkPointResponse::Accepted {
            message: message.msg,
            severity: Severity::from_code(message.kind),
        });
    }

    let error = envelope.error.ok_or_else(|| {
        ApiError::InvalidResponse("failure envelope without error".to_string())
    })?;
    Ok(MarkPointResponse::Rejected { error })
}

/// Accepts `true`/`false`, numbers (non-zero is true) and `"S"`/`"N"` style
/// strings.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(flag) => Ok(flag),
        Value::Number(number) => Ok(number.as_f64().is_some_and(|value| value != 0.0)),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "s" | "sim" | "1" => Ok(true),
            "false" | "n" | "nao" | "não" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid flag {other:?}"))),
        },
        other => Err(serde::de::Error::custom(format!("invalid flag {other}"))),
    }
}

/// Accepts integer codes given as numbers or numeric strings.
fn deserialize_code<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid message type {number}"))),
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid message type {text:?}"))),
        other => Err(serde::de::Error::custom(format!("invalid message type {other}"))),
    }
}
