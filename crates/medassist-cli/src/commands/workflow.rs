//! `medassist workflow` — Show or validate workflow definitions.

use medassist_core::config::{load_dotenv, ENV_WORKFLOW};
use medassist_core::workflow::{UtteranceSource, WorkflowDefinition};

use super::truncate;

/// Print a workflow: `file` if given, else `MEDASSIST_WORKFLOW`, else the
/// built-in chain.
pub fn show(file: Option<&str>) -> Result<(), String> {
    load_dotenv();
    let path = file
        .map(str::to_string)
        .or_else(|| std::env::var(ENV_WORKFLOW).ok());

    let definition = match path {
        Some(ref p) => WorkflowDefinition::from_file(p).map_err(|e| e.to_string())?,
        None => WorkflowDefinition::medassist(),
    };

    print!("{}", describe(&definition));
    println!();
    let yaml = definition.to_yaml().map_err(|e| e.to_string())?;
    print!("{}", yaml);
    Ok(())
}

/// Parse and validate a workflow file without running it.
pub fn validate(file: &str) -> Result<(), String> {
    let definition = WorkflowDefinition::from_file(file).map_err(|e| e.to_string())?;
    println!(
        "✅ {} is valid: '{}' with {} steps",
        file,
        definition.name,
        definition.nodes.len()
    );
    Ok(())
}

/// Tabular summary of a workflow's steps.
pub fn describe(definition: &WorkflowDefinition) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "📋 Workflow: {} (v{})\n",
        definition.name, definition.version
    ));
    if let Some(ref desc) = definition.description {
        out.push_str(&format!("   {}\n", desc));
    }
    out.push('\n');

    out.push_str("┌────┬──────────────────────────┬──────────┬──────────┬──────────────────────────────┐\n");
    out.push_str("│ #  │ Agent                    │ Emotion  │ Context  │ Utterance                    │\n");
    out.push_str("├────┼──────────────────────────┼──────────┼──────────┼──────────────────────────────┤\n");
    for (i, node) in definition.nodes.iter().enumerate() {
        let utterance = match node.utterance {
            UtteranceSource::Static => "script".to_string(),
            UtteranceSource::Retrieved { ref domain, ref question } => {
                format!("{}: {}", domain, question)
            }
        };
        out.push_str(&format!(
            "│ {:<2} │ {:<24} │ {:<8} │ {:<8} │ {:<28} │\n",
            i + 1,
            truncate(&node.id, 24),
            node.emotion.as_str(),
            node.context.as_str(),
            truncate(&utterance, 28),
        ));
    }
    out.push_str("└────┴──────────────────────────┴──────────┴──────────┴──────────────────────────────┘\n");
    out
}
