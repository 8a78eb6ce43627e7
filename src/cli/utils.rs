use serde_json::Value;

use crate::cli::OutputFormat;

/// Print raw JSON, or fall back to the given text rendering.
pub fn output(output_format: &OutputFormat, data: &Value, text: impl FnOnce(&Value) -> String) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => println!("{}", text(data)),
    }
    Ok(())
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: &Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFormat::Text => println!("✓ {}", message),
    }
    Ok(())
}

fn text_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or("")
}

/// Indented outline of a category forest, one node per line.
pub fn render_tree(nodes: &[Value]) -> String {
    fn walk(node: &Value, indent: usize, lines: &mut Vec<String>) {
        lines.push(format!(
            "{}- {} ({})",
            "  ".repeat(indent),
            text_field(node, "name"),
            text_field(node, "id")
        ));
        for child in node["children"].as_array().into_iter().flatten() {
            walk(child, indent + 1, lines);
        }
    }

    let mut lines = Vec::new();
    for node in nodes {
        walk(node, 0, &mut lines);
    }
    if lines.is_empty() {
        return "No categories".to_string();
    }
    lines.join("\n")
}

/// One summary line per platform.
pub fn render_platform(platform: &Value) -> String {
    let state = if platform["active"].as_bool() == Some(true) {
        "active"
    } else {
        "inactive"
    };
    let mut line = format!(
        "{}  {:<8}  {}",
        text_field(platform, "id"),
        state,
        text_field(platform, "name")
    );
    if let Some(category) = platform["category"]["name"].as_str() {
        line.push_str(&format!("  [category: {}]", category));
    }
    line
}
