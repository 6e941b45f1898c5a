//! Tool registry and schema conversion.
//!
//! The registry is static data: four declarations describing what the model
//! may call, with a typed parameter schema. `analysis_tools()` converts them
//! to the wire-level `ToolDefinition` form the client sends; dispatch in
//! `session` looks tools up by name, never by position.

use serde_json::{json, Map, Value};

use crate::ToolDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Array,
    Object,
    Number,
    Integer,
    Boolean,
}

impl ParamType {
    /// Schema type string for the model-facing schema. Total by
    /// construction: every variant maps to exactly one type name.
    pub fn schema_type(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Array => "array",
            ParamType::Object => "object",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub description: Option<&'static str>,
    pub allowed_values: &'static [&'static str],
    /// Item type for arrays; one level of nesting only.
    pub items: Option<ParamType>,
}

impl ParamSpec {
    const fn new(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self {
            name,
            ty,
            description: Some(description),
            allowed_values: &[],
            items: None,
        }
    }

    const fn with_values(mut self, values: &'static [&'static str]) -> Self {
        self.allowed_values = values;
        self
    }

    const fn with_items(mut self, items: ParamType) -> Self {
        self.items = Some(items);
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ToolDeclaration {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub required: &'static [&'static str],
}

/// The canonical tool catalogue, in declaration order.
pub const DECLARATIONS: &[ToolDeclaration] = &[
    ToolDeclaration {
        name: "dataframe_info",
        description: "Get metadata about the uploaded CSV file including columns, shape, data \
                      types, and missing values. Use this when the user asks about the \
                      structure or basic information about their data.",
        params: &[],
        required: &[],
    },
    ToolDeclaration {
        name: "statistical_summary",
        description: "Generate descriptive statistics (mean, median, std, min, max, etc.) for \
                      numeric columns. Includes correlations, skewness, and kurtosis. Use this \
                      when user asks for summary stats or wants to understand distributions.",
        params: &[ParamSpec::new(
            "columns",
            ParamType::Array,
            "Optional list of specific columns to summarize. If not provided, all numeric \
             columns are summarized.",
        )
        .with_items(ParamType::String)],
        required: &[],
    },
    ToolDeclaration {
        name: "python_analysis",
        description: "Execute pandas code on the DataFrame. The DataFrame is available as \
                      'df'. Use this for custom queries, filtering, grouping, calculations, \
                      etc. Code must be safe (no imports, file operations, or dangerous \
                      operations).",
        params: &[ParamSpec::new(
            "code",
            ParamType::String,
            "Python code to execute. Must reference 'df' for the DataFrame. Return results in \
             a 'result' variable. Example: result = df[df['revenue'] > \
             10000].groupby('region')['revenue'].sum()",
        )],
        required: &["code"],
    },
    ToolDeclaration {
        name: "create_visualization",
        description: "Create charts and visualizations (bar, line, scatter, histogram, box, \
                      pie, heatmap). Use this when user asks for a chart, graph, plot, or \
                      visualization.",
        params: &[
            ParamSpec::new(
                "viz_type",
                ParamType::String,
                "Type of visualization to create",
            )
            .with_values(&["bar", "line", "scatter", "histogram", "box", "pie", "heatmap"]),
            ParamSpec::new(
                "x_column",
                ParamType::String,
                "Column name for x-axis or grouping variable",
            ),
            ParamSpec::new(
                "y_column",
                ParamType::String,
                "Column name for y-axis or value to plot (optional for some chart types)",
            ),
            ParamSpec::new("title", ParamType::String, "Title for the chart (optional)"),
            ParamSpec::new(
                "aggregation",
                ParamType::String,
                "Aggregation function for grouped data (default: sum)",
            )
            .with_values(&["sum", "mean", "count", "min", "max", "median"]),
        ],
        required: &["viz_type", "x_column"],
    },
];

pub fn declarations() -> &'static [ToolDeclaration] {
    DECLARATIONS
}

/// Parameter schema as a JSON object schema.
fn schema_for(declaration: &ToolDeclaration) -> Value {
    let mut properties = Map::new();
    for param in declaration.params {
        let mut prop = Map::new();
        prop.insert("type".to_string(), json!(param.ty.schema_type()));
        if let Some(description) = param.description {
            prop.insert("description".to_string(), json!(description));
        }
        if !param.allowed_values.is_empty() {
            prop.insert("enum".to_string(), json!(param.allowed_values));
        }
        if param.ty == ParamType::Array {
            // Arrays always carry an item type; unspecified means string.
            let items = param.items.unwrap_or(ParamType::String);
            prop.insert("items".to_string(), json!({ "type": items.schema_type() }));
        }
        properties.insert(param.name.to_string(), Value::Object(prop));
    }

    json!({
        "type": "object",
        "properties": Value::Object(properties),
        "required": declaration.required,
    })
}

pub fn to_definition(declaration: &ToolDeclaration) -> ToolDefinition {
    ToolDefinition {
        name: declaration.name.to_string(),
        description: declaration.description.to_string(),
        parameters: schema_for(declaration),
    }
}

/// The analysis tools every session exposes to the model.
pub fn analysis_tools() -> Vec<ToolDefinition> {
    declarations().iter().map(to_definition).collect()
}

/// Convert a tool definition to the Gemini API format.
pub fn to_gemini_tool(tool: &ToolDefinition) -> Value {
    json!({
        "name": tool.name,
        "description": tool.description,
        "parameters": tool.parameters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn declares_all_four_tools() {
        let names: Vec<&str> = declarations().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            [
                "dataframe_info",
                "statistical_summary",
                "python_analysis",
                "create_visualization"
            ]
        );
    }

    #[test]
    fn schema_carries_types_and_requirements() {
        let tools = analysis_tools();
        let python = tools.iter().find(|t| t.name == "python_analysis").unwrap();
        assert_eq!(python.parameters["required"], json!(["code"]));
        assert_eq!(
            python.parameters["properties"]["code"]["type"],
            json!("string")
        );

        let viz = tools
            .iter()
            .find(|t| t.name == "create_visualization")
            .unwrap();
        assert_eq!(viz.parameters["required"], json!(["viz_type", "x_column"]));
        assert_eq!(
            viz.parameters["properties"]["viz_type"]["enum"],
            json!(["bar", "line", "scatter", "histogram", "box", "pie", "heatmap"])
        );
    }

    #[test]
    fn array_parameters_nest_one_item_level() {
        let tools = analysis_tools();
        let summary = tools
            .iter()
            .find(|t| t.name == "statistical_summary")
            .unwrap();
        let columns = &summary.parameters["properties"]["columns"];
        assert_eq!(columns["type"], json!("array"));
        assert_eq!(columns["items"]["type"], json!("string"));
    }

    #[test]
    fn parameterless_tools_have_empty_object_schemas() {
        let tools = analysis_tools();
        let info = tools.iter().find(|t| t.name == "dataframe_info").unwrap();
        assert_eq!(
            info.parameters,
            json!({"type": "object", "properties": {}, "required": []})
        );
    }

    #[test]
    fn gemini_format_keeps_schema() {
        let tools = analysis_tools();
        let converted = to_gemini_tool(&tools[1]);
        assert_eq!(converted["name"], json!("statistical_summary"));
        assert_eq!(
            converted["parameters"]["properties"]["columns"]["type"],
            json!("array")
        );
    }
}
