//! Vehicle action definitions and the interpretation result both interpreters return

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Takeoff altitude used when an action carries none
pub const DEFAULT_TAKEOFF_ALTITUDE_M: f64 = 10.0;

/// Flight mode used when a `setMode` action carries none
pub const DEFAULT_MODE: &str = "GUIDED";

/// Kinds of vehicle actions, named as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionType {
    Arm,
    Disarm,
    Takeoff,
    Land,
    Rtl,
    FlyTo,
    SetMode,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Arm => "arm",
            ActionType::Disarm => "disarm",
            ActionType::Takeoff => "takeoff",
            ActionType::Land => "land",
            ActionType::Rtl => "rtl",
            ActionType::FlyTo => "flyTo",
            ActionType::SetMode => "setMode",
        }
    }
}

/// A vehicle action.
///
/// Parameters are optional; missing values are resolved against defaults or
/// the live telemetry when the action is dispatched, not when it is parsed.
/// JSON form: `{"type": "takeoff", "params": {"altitude": 10}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub enum Action {
    Arm,
    Disarm,
    Takeoff {
        altitude: Option<f64>,
    },
    Land,
    Rtl,
    FlyTo {
        lat: Option<f64>,
        lon: Option<f64>,
        alt: Option<f64>,
    },
    SetMode {
        mode: Option<String>,
    },
}

impl Action {
    /// Create a takeoff action
    pub fn takeoff(altitude: f64) -> Self {
        Action::Takeoff {
            altitude: Some(altitude),
        }
    }

    /// Create a mode change action
    pub fn set_mode(mode: impl Into<String>) -> Self {
        Action::SetMode {
            mode: Some(mode.into()),
        }
    }

    /// Create a fully specified position target
    pub fn fly_to(lat: f64, lon: f64, alt: f64) -> Self {
        Action::FlyTo {
            lat: Some(lat),
            lon: Some(lon),
            alt: Some(alt),
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Action::Arm => ActionType::Arm,
            Action::Disarm => ActionType::Disarm,
            Action::Takeoff { .. } => ActionType::Takeoff,
            Action::Land => ActionType::Land,
            Action::Rtl => ActionType::Rtl,
            Action::FlyTo { .. } => ActionType::FlyTo,
            Action::SetMode { .. } => ActionType::SetMode,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(v: &Option<T>) -> String {
            v.as_ref().map_or_else(|| "_".to_string(), |v| v.to_string())
        }
        match self {
            Action::Takeoff { altitude } => write!(f, "takeoff({})", opt(altitude)),
            Action::FlyTo { lat, lon, alt } => {
                write!(f, "flyTo({}, {}, {})", opt(lat), opt(lon), opt(alt))
            }
            Action::SetMode { mode } => write!(f, "setMode({})", opt(mode)),
            other => f.write_str(other.action_type().as_str()),
        }
    }
}

/// Wire shape of an action before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    kind: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<Map<String, Value>>,
}

fn number_param(params: &Map<String, Value>, key: &str) -> Result<Option<f64>, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| format!("`{key}` is out of range")),
        Some(other) => Err(format!("`{key}` must be a number, got {other}")),
    }
}

fn string_param(params: &Map<String, Value>, key: &str) -> Result<Option<String>, String> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(format!("`{key}` must be a string, got {other}")),
    }
}

impl TryFrom<RawAction> for Action {
    type Error = String;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        let params = raw.params.unwrap_or_default();
        Ok(match raw.kind {
            ActionType::Arm => Action::Arm,
            ActionType::Disarm => Action::Disarm,
            ActionType::Land => Action::Land,
            ActionType::Rtl => Action::Rtl,
            ActionType::Takeoff => Action::Takeoff {
                altitude: number_param(&params, "altitude")?,
            },
            ActionType::FlyTo => Action::FlyTo {
                lat: number_param(&params, "lat")?,
                lon: number_param(&params, "lon")?,
                alt: number_param(&params, "alt")?,
            },
            ActionType::SetMode => Action::SetMode {
                mode: string_param(&params, "mode")?,
            },
        })
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        let kind = action.action_type();
        let mut params = Map::new();
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                params.insert(key.to_string(), value);
            }
        };
        match action {
            Action::Takeoff { altitude } => put("altitude", altitude.map(Value::from)),
            Action::FlyTo { lat, lon, alt } => {
                put("lat", lat.map(Value::from));
                put("lon", lon.map(Value::from));
                put("alt", alt.map(Value::from));
            }
            Action::SetMode { mode } => put("mode", mode.map(Value::from)),
            Action::Arm | Action::Disarm | Action::Land | Action::Rtl => {}
        }
        RawAction {
            kind,
            params: (!params.is_empty()).then_some(params),
        }
    }
}

/// Reply text plus the ordered actions to execute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResult")]
pub struct InterpretationResult {
    pub text: String,
    pub actions: Vec<Action>,
}

impl InterpretationResult {
    /// An informational reply with no actions
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_actions(text: impl Into<String>, actions: Vec<Action>) -> Self {
        Self {
            text: text.into(),
            actions,
        }
    }
}

#[derive(Deserialize)]
struct RawResult {
    text: String,
    #[serde(default)]
    actions: Option<Vec<Action>>,
}

impl TryFrom<RawResult> for InterpretationResult {
    type Error = String;

    fn try_from(raw: RawResult) -> Result<Self, Self::Error> {
        if raw.text.trim().is_empty() {
            return Err("`text` must not be empty".to_string());
        }
        Ok(Self {
            text: raw.text,
            actions: raw.actions.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_takeoff_sequence() {
        let result: InterpretationResult = serde_json::from_value(json!({
            "text": "Taking off to 10 meters altitude.",
            "actions": [
                { "type": "setMode", "params": { "mode": "GUIDED" } },
                { "type": "arm" },
                { "type": "takeoff", "params": { "altitude": 10 } }
            ]
        }))
        .unwrap();

        assert_eq!(
            result.actions,
            vec![Action::set_mode("GUIDED"), Action::Arm, Action::takeoff(10.0)]
        );
    }

    #[test]
    fn test_missing_params_stay_unresolved() {
        let actions: Vec<Action> = serde_json::from_value(json!([
            { "type": "takeoff" },
            { "type": "flyTo", "params": { "lat": 1.5 } },
            { "type": "setMode", "params": null },
            { "type": "rtl", "params": {} }
        ]))
        .unwrap();

        assert_eq!(actions[0], Action::Takeoff { altitude: None });
        assert_eq!(
            actions[1],
            Action::FlyTo {
                lat: Some(1.5),
                lon: None,
                alt: None
            }
        );
        assert_eq!(actions[2], Action::SetMode { mode: None });
        assert_eq!(actions[3], Action::Rtl);
    }

    #[test]
    fn test_unknown_action_type_rejected() {
        let err = serde_json::from_value::<Action>(json!({ "type": "loop" }));
        assert!(err.is_err());
    }

    #[test]
    fn test_wrong_param_type_rejected() {
        let err = serde_json::from_value::<Action>(json!({
            "type": "takeoff",
            "params": { "altitude": "high" }
        }));
        assert!(err.is_err());

        let err = serde_json::from_value::<Action>(json!({
            "type": "setMode",
            "params": { "mode": 4 }
        }));
        assert!(err.is_err());
    }

    #[test]
    fn test_result_requires_text() {
        assert!(serde_json::from_value::<InterpretationResult>(json!({ "actions": [] })).is_err());
        assert!(serde_json::from_value::<InterpretationResult>(json!({ "text": "  " })).is_err());
        assert!(serde_json::from_value::<InterpretationResult>(json!({
            "text": "ok",
            "actions": "arm"
        }))
        .is_err());
    }

    #[test]
    fn test_result_actions_optional() {
        let result: InterpretationResult =
            serde_json::from_value(json!({ "text": "Altitude is 5 m." })).unwrap();
        assert!(result.actions.is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(vec![Action::Arm, Action::takeoff(25.0)]).unwrap();
        assert_eq!(
            value,
            json!([
                { "type": "arm" },
                { "type": "takeoff", "params": { "altitude": 25.0 } }
            ])
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Action::takeoff(25.0).to_string(), "takeoff(25)");
        assert_eq!(Action::Rtl.to_string(), "rtl");
        assert_eq!(
            Action::FlyTo {
                lat: Some(1.0),
                lon: None,
                alt: Some(5.0)
            }
            .to_string(),
            "flyTo(1, _, 5)"
        );
    }
}
