// HT Home Service wire models
//
// Request and response bodies for the login, household, authorization and
// device endpoints. The vendor uses camelCase JSON throughout. Response
// types only model the fields this crate reads; unknown fields are ignored.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::EnumString;

// ── Login ───────────────────────────────────────────────────────────

/// `POST login` body. `id` and `password` are cipher-text.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub id: &'a str,
    pub password: &'a str,
    pub remember_me: bool,
}

/// Error payload returned by `POST login` on failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginErrorBody {
    pub error_code: i64,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub result_data: Option<LoginFailData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginFailData {
    pub login_fail_count: u32,
}

// ── Household ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HouseholdResponse {
    pub result_data: HouseholdResultData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HouseholdResultData {
    pub danji_list: Vec<Danji>,
}

/// One residence ("danji") registered on the account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Danji {
    pub site_id: String,
    #[serde(default)]
    pub site_name: Option<String>,
    pub dong: String,
    pub ho: String,
    #[serde(default)]
    pub is_approved: bool,
}

/// The (site, building-unit, sub-unit) triple a session is authorized for.
///
/// Recomputed on every refresh; the vendor ties it to the current token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdContext {
    pub site_id: String,
    pub dong: String,
    pub ho: String,
}

impl From<Danji> for HouseholdContext {
    fn from(d: Danji) -> Self {
        Self {
            site_id: d.site_id,
            dong: d.dong,
            ho: d.ho,
        }
    }
}

/// `POST getctoctoken` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthorizeRequest<'a> {
    #[serde(flatten)]
    pub household: &'a HouseholdContext,
    pub client_id: &'static str,
}

// ── Devices ─────────────────────────────────────────────────────────

/// Vendor device type tag.
///
/// Unknown tags are preserved in [`Other`](Self::Other) so display names
/// still render the vendor's wording.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(from = "String", into = "String")]
pub enum DeviceCategory {
    Fan,
    Induction,
    MultiSwitch,
    Wallsocket,
    Light,
    Gas,
    Aircon,
    Heating,
    Cooktop,
    Curtain,
    Switch,
    #[strum(default)]
    Other(String),
}

impl DeviceCategory {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fan => "fan",
            Self::Induction => "induction",
            Self::MultiSwitch => "multi_switch",
            Self::Wallsocket => "wallsocket",
            Self::Light => "light",
            Self::Gas => "gas",
            Self::Aircon => "aircon",
            Self::Heating => "heating",
            Self::Cooktop => "cooktop",
            Self::Curtain => "curtain",
            Self::Switch => "switch",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for DeviceCategory {
    fn from(raw: String) -> Self {
        raw.parse().unwrap_or(Self::Other(raw))
    }
}

impl From<DeviceCategory> for String {
    fn from(c: DeviceCategory) -> Self {
        c.as_str().to_owned()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DevicesResponse {
    pub data: DevicesData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DevicesData {
    pub device_list: Vec<RawDevice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDevice {
    pub id: String,
    pub device_type: DeviceCategory,
    pub device_location: String,
}

/// A device as reported by one discovery cycle.
///
/// Identity is `id`, assigned by the vendor. Name and location may change
/// between cycles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: String,
    pub display_name: String,
    pub category: DeviceCategory,
    pub location: String,
}

impl From<RawDevice> for DeviceRecord {
    fn from(raw: RawDevice) -> Self {
        Self {
            display_name: format!("{} {}", raw.device_location, raw.device_type),
            id: raw.id,
            category: raw.device_type,
            location: raw.device_location,
        }
    }
}

// ── Device detail / control ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct DeviceDetailResponse {
    pub data: DeviceDetail,
}

/// `GET proxy/ctoc/{resource}/{id}` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDetail {
    pub id: String,
    pub device_type: DeviceCategory,
    pub status_list: Vec<StatusEntry>,
}

/// One `{command, value}` pair, used both for reported status and for
/// issued commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub command: String,
    pub value: String,
}

impl StatusEntry {
    pub fn new(command: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            value: value.into(),
        }
    }
}

/// `PUT proxy/ctoc/{resource}/{id}` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommandRequest<'a> {
    pub command_list: &'a [StatusEntry],
}
