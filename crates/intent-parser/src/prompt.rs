//! Prompt assembly for the remote interpreter

use crate::{IntentError, Message, Result};
use vehicle_control::VehicleTelemetrySnapshot;

/// Fixed instructions describing the assistant's capabilities
pub const SYSTEM_PROMPT: &str = "
You are an AI assistant for ArduPilot, designed to help control and monitor drones through natural language commands.
You can perform the following actions:
1. Arm and disarm the vehicle
2. Take off to a specified altitude
3. Change flight modes (GUIDED, LOITER, RTL, AUTO, etc.)
4. Fly in specific directions (north, south, east, west) for specified distances
5. Return to launch (RTL)
6. Land at the current location
7. Provide information about the vehicle's current status

When responding to user requests:
- Be concise and clear
- Confirm the actions you're taking
- Prioritize safety at all times
- Ask for clarification if a command is ambiguous
- Never perform unsafe operations

Your responses should include both a text reply and any actions that should be executed.

You will be given the chat history as a JSON array of messages. Each message has the fields
id (string), content (string), role (\"user\" or \"assistant\") and timestamp (RFC 3339).

Respond by analyzing the chat history and the current vehicle state.
";

const RESPONSE_INSTRUCTIONS: &str = r#"Respond with a JSON object containing the following:
1. text: Your response to the user
2. actions: Array of actions to perform (optional). Each action is
   { "type": one of "arm", "disarm", "takeoff", "land", "rtl", "flyTo", "setMode", "params": { ... } }
   takeoff params: { "altitude": meters }; setMode params: { "mode": name };
   flyTo params: { "lat": degrees, "lon": degrees, "alt": meters }

DO NOT GIVE ANYTHING ELSE EXCEPT THE JSON OBJECT.

Example:
{
  "text": "Taking off to 10 meters altitude.",
  "actions": [
    { "type": "setMode", "params": { "mode": "GUIDED" } },
    { "type": "arm" },
    { "type": "takeoff", "params": { "altitude": 10 } }
  ]
}"#;

/// A prompt in two parts: fixed instructions and per-request context
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub context: String,
}

/// Build the prompt from the full history and the current telemetry.
pub fn build_prompt(history: &[Message], telemetry: &VehicleTelemetrySnapshot) -> Result<Prompt> {
    let history_json = serde_json::to_string(history)
        .map_err(|e| IntentError::Prompt(format!("serializing history: {e}")))?;

    let t = telemetry;
    let context = format!(
        "Current vehicle state:
Mode: {}
Armed: {}
Altitude: {:.1} meters
Position: {:.6}, {:.6}
Battery: {:.1}V ({}%)
Heading: {:.0} degrees
Ground Speed: {:.1} m/s

Message history: {}

{}",
        t.mode,
        t.armed,
        t.altitude,
        t.latitude,
        t.longitude,
        t.battery_voltage,
        t.battery_percent,
        t.heading,
        t.groundspeed,
        history_json,
        RESPONSE_INSTRUCTIONS
    );

    Ok(Prompt {
        system: SYSTEM_PROMPT.to_string(),
        context,
    })
}
