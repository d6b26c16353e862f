use serde::{Deserialize, Serialize};

/// Descriptive registration of a tool an agent can use.
///
/// Tool *execution* is the job handler's concern; the orchestrator side
/// only reads this metadata, and the suitability heuristic matches a job
/// payload's `"type"` against registered tool names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tool name, e.g. `data_analyzer`.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON schema or parameter map, opaque to the orchestrator.
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl ToolSpec {
    /// Creates a tool spec without parameters.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: serde_json::Value::Null,
        }
    }

    /// Attaches a parameter schema.
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_spec_builder() {
        let tool = ToolSpec::new("data_analyzer", "Analyze research data")
            .with_parameters(json!({"data_source": "str", "analysis_type": "str"}));
        assert_eq!(tool.name, "data_analyzer");
        assert_eq!(tool.parameters["data_source"], json!("str"));
    }
}
