use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::CaseError;

/// Write `members` into a zip archive at `path`, each stored under its file
/// name. Two members with the same file name are rejected.
pub fn write_bundle(path: &Path, members: &[PathBuf]) -> Result<usize, CaseError> {
    let mut names = HashSet::new();
    for member in members {
        let name = member_name(member)?;
        if !names.insert(name.clone()) {
            return Err(CaseError::Artifact(format!(
                "duplicate bundle member '{}'",
                name
            )));
        }
    }

    let file = File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for member in members {
        let name = member_name(member)?;
        let bytes = std::fs::read(member)?;
        zip.start_file(name.as_str(), options)
            .map_err(|e| CaseError::Artifact(format!("failed to add '{}' to bundle: {}", name, e)))?;
        zip.write_all(&bytes)?;
    }

    zip.finish()
        .map_err(|e| CaseError::Artifact(format!("failed to finish bundle: {}", e)))?;
    Ok(members.len())
}

fn member_name(path: &Path) -> Result<String, CaseError> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| CaseError::Artifact(format!("bundle member {} has no file name", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_contains_every_member() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("ClientAgent_1.wav");
        let b = dir.path().join("case_log.txt");
        std::fs::write(&a, b"RIFF").unwrap();
        std::fs::write(&b, b"ClientAgent: Hello?").unwrap();

        let bundle = dir.path().join("case_export.zip");
        assert_eq!(write_bundle(&bundle, &[a, b]).unwrap(), 2);

        let mut archive = zip::ZipArchive::new(File::open(&bundle).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(names, vec!["ClientAgent_1.wav", "case_log.txt"]);

        let mut log = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("case_log.txt").unwrap(), &mut log).unwrap();
        assert_eq!(log, "ClientAgent: Hello?");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let a = dir.path().join("case_log.txt");
        let b = sub.join("case_log.txt");
        std::fs::write(&a, b"1").unwrap();
        std::fs::write(&b, b"2").unwrap();

        let bundle = dir.path().join("case_export.zip");
        let result = write_bundle(&bundle, &[a, b]);
        assert!(matches!(result, Err(CaseError::Artifact(_))));
        assert!(!bundle.exists());
    }
}
