//! Prompt text and response schema sent to the model.

use guardian_core::telemetry::RouterSnapshot;
use serde_json::{json, Value};

const INSTRUCTIONS: &str = "\
You are an expert Mikrotik network administrator and security analyst.
Analyze the following JSON object containing the current status of a RouterBoard.
Identify potential issues, performance bottlenecks, security risks, or anomalies.
Provide a concise summary, actionable recommendations, and preventive actions.
Prioritize critical issues like high CPU/memory usage, critical log entries, and unusual traffic patterns.";

/// Build the full prompt for one snapshot.
pub fn build_prompt(snapshot: &RouterSnapshot) -> Result<String, serde_json::Error> {
    let data = serde_json::to_string_pretty(snapshot)?;
    Ok(format!("{INSTRUCTIONS}\n\nCurrent Router Data:\n{data}\n"))
}

/// JSON schema the model must answer with.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "A concise, one-sentence summary of the overall network health."
            },
            "recommendations": {
                "type": "ARRAY",
                "description": "An array of 2-4 actionable recommendations for the network administrator.",
                "items": { "type": "STRING" }
            },
            "preventiveActions": {
                "type": "ARRAY",
                "description": "An array of 2-3 suggested preventive actions with an associated risk level.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "action": {
                            "type": "STRING",
                            "description": "The suggested preventive action."
                        },
                        "risk": {
                            "type": "STRING",
                            "description": "The risk level of the action: Low, Medium, or High."
                        }
                    },
                    "required": ["action", "risk"]
                }
            }
        },
        "required": ["summary", "recommendations", "preventiveActions"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use guardian_driver_mock::MockRouter;
    use guardian_core::TelemetryProvider;

    #[tokio::test]
    async fn test_prompt_embeds_snapshot() {
        let snapshot = MockRouter::builder().seed(1).build().fetch_snapshot().await.unwrap();
        let prompt = build_prompt(&snapshot).unwrap();

        assert!(prompt.starts_with("You are an expert Mikrotik network administrator"));
        assert!(prompt.contains("Current Router Data:\n{"));
        assert!(prompt.contains("\"cpuLoad\""));
        assert!(prompt.contains("MikroTik-HQ-Router"));
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = response_schema();
        assert_eq!(
            schema["required"],
            json!(["summary", "recommendations", "preventiveActions"])
        );
        assert_eq!(
            schema["properties"]["preventiveActions"]["items"]["required"],
            json!(["action", "risk"])
        );
    }
}
