use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use mindmap_core::Graph;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

/// What a command hands back for printing.
#[derive(Debug)]
pub enum CommandOutput {
    Graph(Graph),
    Value(Value),
    Message(String),
}

pub fn print_output(format: OutputFormat, output: &CommandOutput) -> Result<()> {
    match (format, output) {
        (OutputFormat::Json, CommandOutput::Graph(graph)) => {
            println!("{}", serde_json::to_string_pretty(graph)?);
        }
        (OutputFormat::Json, CommandOutput::Value(value)) => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        (OutputFormat::Json, CommandOutput::Message(message)) => {
            println!("{}", serde_json::json!({ "message": message }));
        }
        (OutputFormat::Pretty, CommandOutput::Graph(graph)) => {
            for line in outline(graph) {
                println!("{line}");
            }
        }
        (OutputFormat::Pretty, CommandOutput::Value(value)) => print_pretty(value)?,
        (OutputFormat::Pretty, CommandOutput::Message(message)) => {
            println!("{}", message.green());
        }
    }
    Ok(())
}

fn print_pretty(value: &Value) -> Result<()> {
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                let key_colored = key.cyan().bold();
                match val {
                    Value::String(s) => println!("{}: {}", key_colored, s.green()),
                    Value::Number(n) => println!("{}: {}", key_colored, n.to_string().yellow()),
                    Value::Bool(b) => {
                        let val_colored = if *b { "true".green() } else { "false".red() };
                        println!("{}: {}", key_colored, val_colored);
                    }
                    Value::Null => println!("{}: {}", key_colored, "-".dimmed()),
                    _ => println!("{}: {}", key_colored, val),
                }
            }
        }
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Indented tree of labels, following edges and parent hints from the roots.
/// A node reached twice is printed once; later mentions are marked.
pub fn outline(graph: &Graph) -> Vec<String> {
    let mut lines = Vec::new();
    let mut printed = vec![false; graph.nodes().len()];
    let index = graph.node_index();

    let children = |id: &str| -> Vec<usize> {
        graph
            .children(id)
            .iter()
            .filter_map(|n| index.get(n.id.as_str()).copied())
            .collect()
    };

    fn walk(
        graph: &Graph,
        node: usize,
        depth: usize,
        printed: &mut [bool],
        lines: &mut Vec<String>,
        children: &dyn Fn(&str) -> Vec<usize>,
    ) {
        let label = &graph.nodes()[node].label;
        let indent = "  ".repeat(depth);
        if printed[node] {
            lines.push(format!("{indent}- {label} {}", "(see above)".dimmed()));
            return;
        }
        printed[node] = true;
        let label = if depth == 0 {
            label.bold().to_string()
        } else {
            label.to_string()
        };
        lines.push(format!("{indent}- {label}"));
        for child in children(&graph.nodes()[node].id) {
            walk(graph, child, depth + 1, printed, lines, children);
        }
    }

    let roots: Vec<usize> = graph
        .roots()
        .iter()
        .filter_map(|n| index.get(n.id.as_str()).copied())
        .collect();
    for root in roots {
        walk(graph, root, 0, &mut printed, &mut lines, &children);
    }
    // Cycles nobody points into.
    while let Some(seed) = printed.iter().position(|p| !p) {
        walk(graph, seed, 0, &mut printed, &mut lines, &children);
    }
    lines
}
