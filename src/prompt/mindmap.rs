//! Strict JSON-only prompt for mind-map generation.

/// Instruction block sent ahead of the user's scenario.
const MINDMAP_INSTRUCTIONS: &str = r##"Respond with ONE complete JSON object and nothing else.
No prose, no explanations, no markdown fences.

Format rules:
- Exactly two top-level keys: "nodes" (array) and "edges" (array).
- Every key and every string value uses double quotes.
- No trailing commas; every bracket and brace is closed.

Each node has:
- "id": unique string such as "Node1"
- "x": number, horizontal position
- "y": number, vertical position
- "size": [width, height] as two numbers
- "shape": string such as "circle"
- "label": string
- "color": hex color string

Each edge has:
- "id": unique string
- "source": id of the start node
- "target": id of the end node
- "label": string
- "color": hex color string
- "length": number

Layout:
- Main ideas sit at the center (level 1), direct details around them (level 2),
  examples and facts on the outside (level 3).
- No duplicate branches and no overlapping nodes.
- 20 to 30 nodes and edges in total.
- Vary node colors, edge colors and edge lengths.

Template:
{
  "nodes": [
    {"id": "Node1", "x": 50, "y": 50, "size": [60, 60], "shape": "circle", "label": "Apple", "color": "#FF0000"},
    {"id": "Node2", "x": 200, "y": 50, "size": [60, 60], "shape": "circle", "label": "iOS", "color": "#00FF00"}
  ],
  "edges": [
    {"id": "Edge1", "source": "Node1", "target": "Node2", "label": "runs on", "color": "#0000FF", "length": 100}
  ]
}"##;

/// Build the mind-map prompt for a user scenario.
#[must_use]
pub fn build_mindmap_prompt(scenario: &str) -> String {
    format!("{MINDMAP_INSTRUCTIONS}\n\nSCENARIO: {scenario}\nTRANSCRIPT CONTEXT: {scenario}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_is_appended() {
        let prompt = build_mindmap_prompt("photosynthesis");
        assert!(prompt.contains("SCENARIO: photosynthesis"));
        assert!(prompt.contains("TRANSCRIPT CONTEXT: photosynthesis"));
    }

    #[test]
    fn test_template_is_valid_json() {
        let start = MINDMAP_INSTRUCTIONS.find("{\n").unwrap();
        let template = &MINDMAP_INSTRUCTIONS[start..];
        let value: serde_json::Value = serde_json::from_str(template).unwrap();
        assert_eq!(value["nodes"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["edges"][0]["source"], "Node1");
    }
}
