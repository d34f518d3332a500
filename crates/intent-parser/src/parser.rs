//! Deterministic keyword interpreter for operator commands

use crate::entities::{Direction, QuantityExtractor};
use crate::{Action, IntentConfig, InterpretationResult, Result};
use vehicle_control::VehicleTelemetrySnapshot as Telemetry;

/// Mode names accepted by "mode ..." commands, in match order
const MODE_NAMES: [&str; 6] = ["stabilize", "althold", "loiter", "rtl", "auto", "guided"];

const HELP_TEXT: &str = "I can help you control your drone with commands like:
- \"Take off to 50 meters\"
- \"Fly north 100 meters\"
- \"Return to home\"
- \"Land now\"
- \"What's my battery level?\"
- \"Change mode to loiter\"
- \"What's my current status?\"

Just tell me what you'd like to do!";

const CLARIFY_TEXT: &str = "I understand you want to interact with the drone, but I'm not sure what specific action you're requesting. You can ask me to take off, land, fly in a direction, return to home, or provide status information. How can I help you?";

type Predicate = fn(&str) -> bool;
type Builder = fn(&RuleBasedInterpreter, &str, &Telemetry) -> Option<InterpretationResult>;

/// One row of the priority table. A builder returning `None` lets the
/// next rule try.
struct Rule {
    name: &'static str,
    matches: Predicate,
    build: Builder,
}

/// Keyword interpreter with a fixed rule priority.
///
/// Several keywords can co-occur in one utterance ("return home and land");
/// the first rule in table order that produces a result wins.
pub struct RuleBasedInterpreter {
    config: IntentConfig,
    quantities: QuantityExtractor,
    rules: Vec<Rule>,
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

impl RuleBasedInterpreter {
    /// Create a new interpreter
    pub fn new(config: IntentConfig) -> Result<Self> {
        let rules = vec![
            Rule {
                name: "takeoff",
                matches: |t| contains_any(t, &["takeoff", "take off"]),
                build: Self::takeoff,
            },
            Rule {
                name: "land",
                matches: |t| t.contains("land"),
                build: Self::land,
            },
            Rule {
                name: "rtl",
                matches: |t| contains_any(t, &["rtl", "return", "home"]),
                build: Self::rtl,
            },
            Rule {
                name: "arm",
                matches: |t| t.contains("arm") && !t.contains("disarm"),
                build: Self::arm,
            },
            Rule {
                name: "disarm",
                matches: |t| t.contains("disarm"),
                build: Self::disarm,
            },
            Rule {
                name: "fly",
                matches: |t| t.contains("fly"),
                build: Self::fly,
            },
            Rule {
                name: "mode",
                matches: |t| t.contains("mode"),
                build: Self::mode,
            },
            Rule {
                name: "status",
                matches: |t| contains_any(t, &["status", "how", "what"]),
                build: Self::status,
            },
            Rule {
                name: "help",
                matches: |t| contains_any(t, &["help", "commands", "what can you do"]),
                build: Self::help,
            },
        ];

        Ok(Self {
            config,
            quantities: QuantityExtractor::new()?,
            rules,
        })
    }

    /// Interpret one utterance against a telemetry snapshot. Never fails:
    /// unmatched input gets a clarification reply with no actions.
    pub fn interpret(&self, utterance: &str, telemetry: &Telemetry) -> InterpretationResult {
        let text = utterance.trim().to_lowercase();

        for rule in &self.rules {
            if !(rule.matches)(&text) {
                continue;
            }
            if let Some(result) = (rule.build)(self, &text, telemetry) {
                tracing::debug!("rule '{}' matched: {:?}", rule.name, result.actions);
                return result;
            }
        }

        InterpretationResult::reply(CLARIFY_TEXT)
    }

    /// Names of the rules in evaluation order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    fn takeoff(&self, text: &str, _telemetry: &Telemetry) -> Option<InterpretationResult> {
        let altitude = self
            .quantities
            .meters(text)
            .unwrap_or(self.config.default_altitude_m);

        Some(InterpretationResult::with_actions(
            format!("Taking off to {} meters altitude.", altitude),
            vec![Action::set_mode("GUIDED"), Action::Arm, Action::takeoff(altitude)],
        ))
    }

    fn land(&self, _text: &str, _telemetry: &Telemetry) -> Option<InterpretationResult> {
        Some(InterpretationResult::with_actions(
            "Landing the vehicle at the current location.",
            vec![Action::set_mode("LAND")],
        ))
    }

    fn rtl(&self, _text: &str, _telemetry: &Telemetry) -> Option<InterpretationResult> {
        Some(InterpretationResult::with_actions(
            "Returning to the launch location.",
            vec![Action::Rtl],
        ))
    }

    fn arm(&self, _text: &str, _telemetry: &Telemetry) -> Option<InterpretationResult> {
        Some(InterpretationResult::with_actions(
            "Arming the vehicle.",
            vec![Action::Arm],
        ))
    }

    fn disarm(&self, _text: &str, _telemetry: &Telemetry) -> Option<InterpretationResult> {
        Some(InterpretationResult::with_actions(
            "Disarming the vehicle.",
            vec![Action::Disarm],
        ))
    }

    fn fly(&self, text: &str, telemetry: &Telemetry) -> Option<InterpretationResult> {
        let direction = Direction::find_in(text)?;
        let distance = self
            .quantities
            .meters(text)
            .unwrap_or(self.config.default_distance_m);
        let (lat, lon) = direction.offset(telemetry.latitude, telemetry.longitude, distance);

        Some(InterpretationResult::with_actions(
            format!("Flying {} for {} meters.", direction.as_str(), distance),
            vec![
                Action::set_mode("GUIDED"),
                Action::fly_to(lat, lon, telemetry.altitude),
            ],
        ))
    }

    fn mode(&self, text: &str, _telemetry: &Telemetry) -> Option<InterpretationResult> {
        let mode = MODE_NAMES
            .iter()
            .find(|m| text.contains(*m))?
            .to_uppercase();

        Some(InterpretationResult::with_actions(
            format!("Changing flight mode to {}.", mode),
            vec![Action::set_mode(mode)],
        ))
    }

    fn status(&self, text: &str, t: &Telemetry) -> Option<InterpretationResult> {
        let reply = if contains_any(text, &["altitude", "height"]) {
            format!(
                "The current altitude is {:.1} meters above the home position.",
                t.altitude
            )
        } else if text.contains("battery") {
            format!(
                "The battery is currently at {:.1}V which is approximately {}% of capacity.",
                t.battery_voltage, t.battery_percent
            )
        } else if contains_any(text, &["position", "location", "where"]) {
            format!(
                "The vehicle is currently at {:.6}° latitude, {:.6}° longitude, and {:.1} meters altitude.",
                t.latitude, t.longitude, t.altitude
            )
        } else if text.contains("mode") {
            format!("The vehicle is currently in {} mode.", t.mode)
        } else {
            status_summary(t)
        };

        Some(InterpretationResult::reply(reply))
    }

    fn help(&self, _text: &str, _telemetry: &Telemetry) -> Option<InterpretationResult> {
        Some(InterpretationResult::reply(HELP_TEXT))
    }
}

/// Multi-line telemetry summary
fn status_summary(t: &Telemetry) -> String {
    format!(
        "Current Status:
- Mode: {}
- Armed: {}
- Altitude: {:.1} meters
- Battery: {:.1}V ({}%)
- Position: {:.6}°, {:.6}°
- Heading: {:.0}°
- Ground Speed: {:.1} m/s",
        t.mode,
        if t.armed { "Yes" } else { "No" },
        t.altitude,
        t.battery_voltage,
        t.battery_percent,
        t.latitude,
        t.longitude,
        t.heading,
        t.groundspeed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ActionType;

    fn telemetry() -> Telemetry {
        Telemetry {
            mode: "LOITER".to_string(),
            armed: true,
            latitude: 10.0,
            longitude: 20.0,
            altitude: 5.0,
            heading: 271.6,
            groundspeed: 3.3,
            battery_voltage: 11.1,
            battery_percent: 80.0,
        }
    }

    fn interpret(text: &str) -> InterpretationResult {
        RuleBasedInterpreter::new(IntentConfig::default())
            .unwrap()
            .interpret(text, &telemetry())
    }

    fn kinds(result: &InterpretationResult) -> Vec<ActionType> {
        result.actions.iter().map(Action::action_type).collect()
    }

    #[test]
    fn test_takeoff_with_altitude() {
        let result = interpret("Take off to 25 meters");
        assert_eq!(
            result.actions,
            vec![Action::set_mode("GUIDED"), Action::Arm, Action::takeoff(25.0)]
        );
        assert_eq!(result.text, "Taking off to 25 meters altitude.");
    }

    #[test]
    fn test_takeoff_default_altitude() {
        let result = interpret("takeoff please");
        assert_eq!(result.actions[2], Action::takeoff(10.0));
    }

    #[test]
    fn test_overflowing_altitude_uses_default() {
        let result = interpret(&format!("take off to {} meters", "9".repeat(400)));
        assert_eq!(result.actions[2], Action::takeoff(10.0));
        assert_eq!(result.text, "Taking off to 10 meters altitude.");

        let json = serde_json::to_value(&result.actions[2]).unwrap();
        assert_eq!(json["params"]["altitude"], 10.0);
    }

    #[test]
    fn test_takeoff_outranks_arm() {
        // "arm" co-occurs but takeoff is higher priority
        let result = interpret("arm and take off");
        assert_eq!(
            kinds(&result),
            vec![ActionType::SetMode, ActionType::Arm, ActionType::Takeoff]
        );
    }

    #[test]
    fn test_land() {
        let result = interpret("Land now");
        assert_eq!(result.actions, vec![Action::set_mode("LAND")]);
    }

    #[test]
    fn test_return_variants() {
        for text in ["RTL", "return to launch", "go home"] {
            assert_eq!(interpret(text).actions, vec![Action::Rtl], "{text}");
        }
    }

    #[test]
    fn test_arm_and_disarm() {
        assert_eq!(interpret("arm the drone").actions, vec![Action::Arm]);
        assert_eq!(interpret("disarm the drone").actions, vec![Action::Disarm]);
    }

    #[test]
    fn test_fly_north() {
        let result = interpret("fly north 50 meters");
        assert_eq!(result.actions.len(), 2);
        assert_eq!(result.actions[0], Action::set_mode("GUIDED"));
        match &result.actions[1] {
            Action::FlyTo {
                lat: Some(lat),
                lon: Some(lon),
                alt: Some(alt),
            } => {
                assert!((lat - 10.00045).abs() < 1e-12);
                assert_eq!(*lon, 20.0);
                assert_eq!(*alt, 5.0);
            }
            other => panic!("unexpected action {other:?}"),
        }
        assert_eq!(result.text, "Flying north for 50 meters.");
    }

    #[test]
    fn test_fly_east_default_distance() {
        let result = interpret("fly east");
        match &result.actions[1] {
            Action::FlyTo {
                lat: Some(lat),
                lon: Some(lon),
                ..
            } => {
                assert_eq!(*lat, 10.0);
                assert!((lon - 20.00011).abs() < 1e-12);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_fly_without_direction_falls_through() {
        let result = interpret("fly up 10 meters");
        assert!(result.actions.is_empty());
        assert_eq!(result.text, CLARIFY_TEXT);

        // falls through to the status rule
        let result = interpret("how high can you fly");
        assert!(result.actions.is_empty());
        assert!(result.text.starts_with("Current Status:"));
    }

    #[test]
    fn test_mode_change() {
        let result = interpret("change mode to loiter");
        assert_eq!(result.actions, vec![Action::set_mode("LOITER")]);
        assert_eq!(result.text, "Changing flight mode to LOITER.");
    }

    #[test]
    fn test_unknown_mode_falls_through_to_status() {
        let result = interpret("what mode are we in");
        assert!(result.actions.is_empty());
        assert_eq!(result.text, "The vehicle is currently in LOITER mode.");
    }

    #[test]
    fn test_battery_query() {
        let result = interpret("what's my battery");
        assert!(result.actions.is_empty());
        assert!(result.text.contains("11.1V"));
        assert!(result.text.contains("80%"));
    }

    #[test]
    fn test_altitude_and_position_queries() {
        let result = interpret("what is my altitude");
        assert_eq!(
            result.text,
            "The current altitude is 5.0 meters above the home position."
        );

        let result = interpret("status: where are we");
        assert!(result.text.contains("10.000000° latitude"));
        assert!(result.text.contains("20.000000° longitude"));
    }

    #[test]
    fn test_full_status_summary() {
        let result = interpret("status");
        assert!(result.actions.is_empty());
        assert!(result.text.contains("- Mode: LOITER"));
        assert!(result.text.contains("- Armed: Yes"));
        assert!(result.text.contains("- Heading: 272°"));
        assert!(result.text.contains("- Ground Speed: 3.3 m/s"));
    }

    #[test]
    fn test_help() {
        let result = interpret("help");
        assert_eq!(result.text, HELP_TEXT);
        assert!(result.actions.is_empty());
    }

    #[test]
    fn test_unmatched_input_asks_for_clarification() {
        let result = interpret("sing me a song");
        assert_eq!(result.text, CLARIFY_TEXT);
        assert!(result.actions.is_empty());

        let result = interpret("");
        assert_eq!(result.text, CLARIFY_TEXT);
    }

    #[test]
    fn test_interpretation_is_idempotent() {
        let parser = RuleBasedInterpreter::new(IntentConfig::default()).unwrap();
        let t = telemetry();
        for text in ["fly west 30 m", "take off", "status", "nonsense"] {
            assert_eq!(parser.interpret(text, &t), parser.interpret(text, &t));
        }
    }

    #[test]
    fn test_configured_defaults() {
        let config = IntentConfig {
            default_altitude_m: 30.0,
            default_distance_m: 100.0,
            ..Default::default()
        };
        let parser = RuleBasedInterpreter::new(config).unwrap();
        let result = parser.interpret("take off", &telemetry());
        assert_eq!(result.actions[2], Action::takeoff(30.0));
        let result = parser.interpret("fly south", &telemetry());
        assert_eq!(result.text, "Flying south for 100 meters.");
    }

    #[test]
    fn test_rule_order() {
        let parser = RuleBasedInterpreter::new(IntentConfig::default()).unwrap();
        assert_eq!(
            parser.rule_names(),
            vec!["takeoff", "land", "rtl", "arm", "disarm", "fly", "mode", "status", "help"]
        );
    }
}
