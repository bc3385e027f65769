//! `medassist run` — Run one patient case end to end.

use std::path::PathBuf;

use medassist_core::{AppConfig, CaseOutcome, CaseRunner};

pub async fn run(
    patient: &str,
    output_dir: Option<&str>,
    workflow: Option<&str>,
    json: bool,
) -> Result<(), String> {
    let mut config = AppConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(dir) = output_dir {
        config.output_dir = PathBuf::from(dir);
    }
    if let Some(path) = workflow {
        config.workflow_path = Some(PathBuf::from(path));
    }

    let runner = CaseRunner::from_config(&config).map_err(|e| e.to_string())?;
    tracing::info!(
        "[CLI] Running workflow '{}' for patient '{}'",
        runner.workflow().name,
        patient
    );

    let outcome = runner.run_case(patient).await.map_err(|e| e.to_string())?;

    if json {
        let out = serde_json::to_string_pretty(&outcome)
            .map_err(|e| format!("Failed to serialize outcome: {}", e))?;
        println!("{}", out);
    } else {
        print!("{}", render_outcome(&outcome));
    }
    Ok(())
}

/// Human-readable run summary: transcript first, then artifact paths.
pub fn render_outcome(outcome: &CaseOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "📋 Case {} ({})\n\n",
        outcome.patient_id, outcome.run_id
    ));
    for line in &outcome.transcript {
        out.push_str(&format!("  {}\n", line));
    }
    out.push('\n');
    out.push_str(&format!(
        "📄 Document:  {} ({} page{})\n",
        outcome.document_path.display(),
        outcome.page_count,
        if outcome.page_count == 1 { "" } else { "s" }
    ));
    out.push_str(&format!("🔊 Audio:     {}\n", outcome.combined_audio_path.display()));
    out.push_str(&format!("📦 Bundle:    {}\n", outcome.bundle_path.display()));
    out
}
