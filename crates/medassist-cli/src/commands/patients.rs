//! `medassist patients` — List the patient directory.

use medassist_core::models::PatientDirectory;

use super::truncate;

pub fn list() -> Result<(), String> {
    print!("{}", render_table(&PatientDirectory::builtin()));
    Ok(())
}

/// Box-drawn table of every patient in `directory`.
pub fn render_table(directory: &PatientDirectory) -> String {
    let mut out = String::new();
    out.push_str("┌──────────┬──────────┬──────────────────────┬──────────────────────┬────────────┬──────┐\n");
    out.push_str("│ ID       │ Name     │ Location             │ Symptoms             │ Urgency    │ Lang │\n");
    out.push_str("├──────────┼──────────┼──────────────────────┼──────────────────────┼────────────┼──────┤\n");
    for (id, case) in directory.entries() {
        out.push_str(&format!(
            "│ {:<8} │ {:<8} │ {:<20} │ {:<20} │ {:<10} │ {:<4} │\n",
            truncate(id, 8),
            truncate(&case.name, 8),
            truncate(&case.location, 20),
            truncate(&case.symptoms, 20),
            case.urgency.as_str(),
            truncate(&case.language, 4),
        ));
    }
    out.push_str("└──────────┴──────────┴──────────────────────┴──────────────────────┴────────────┴──────┘\n");
    out
}
