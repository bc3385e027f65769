//! End-to-end case runs with in-process speech and retrieval services.

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use medassist_core::audio::PcmAudio;
use medassist_core::models::{AmbientContext, PatientCase, PatientDirectory, Urgency};
use medassist_core::retrieval::{KnowledgeDomain, KnowledgeRetriever};
use medassist_core::speech::{AmbientLibrary, AudioEncoding, SpeechService, SpeechSynthesizer, VoiceConfig};
use medassist_core::workflow::{NodeDescriptor, WorkflowDefinition};
use medassist_core::{CaseError, CaseRunner};

const VOICE_RATE: u32 = 16_000;
const VOICE_FRAMES: u32 = 1_600;

/// Returns a short silent WAV per call; optionally fails on the n-th call.
struct FakeSpeech {
    calls: AtomicUsize,
    voices: Mutex<Vec<String>>,
    fail_on_call: Option<usize>,
}

impl FakeSpeech {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            voices: Mutex::new(Vec::new()),
            fail_on_call: None,
        }
    }

    fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::new()
        }
    }
}

fn silent_wav() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: VOICE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..VOICE_FRAMES {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

#[async_trait]
impl SpeechService for FakeSpeech {
    async fn synthesize(
        &self,
        _ssml: &str,
        voice: &VoiceConfig,
        _encoding: AudioEncoding,
    ) -> Result<Vec<u8>, CaseError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(CaseError::SynthesisFailure("quota exceeded".to_string()));
        }
        self.voices.lock().unwrap().push(voice.name.clone());
        Ok(silent_wav())
    }
}

struct FakeRetriever;

#[async_trait]
impl KnowledgeRetriever for FakeRetriever {
    async fn ask(&self, domain: KnowledgeDomain, _question: &str) -> Result<String, CaseError> {
        Ok(match domain {
            KnowledgeDomain::Hospital => "Hospital Pasteur provides Level 1 trauma care.".to_string(),
            KnowledgeDomain::Policy => "Yes, repatriation with escort is covered.".to_string(),
        })
    }
}

fn runner(speech: Arc<FakeSpeech>, ambient: AmbientLibrary, workflow: WorkflowDefinition, root: &Path) -> CaseRunner {
    CaseRunner::new(
        SpeechSynthesizer::new(speech, ambient),
        Arc::new(FakeRetriever),
        workflow,
        root,
    )
    .unwrap()
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_french_patient_full_run() {
    let root = tempfile::tempdir().unwrap();
    let speech = Arc::new(FakeSpeech::new());
    let runner = runner(
        speech.clone(),
        AmbientLibrary::new(),
        WorkflowDefinition::medassist(),
        root.path(),
    );

    let outcome = runner.run_case("Anne").await.unwrap();

    assert_eq!(outcome.patient_id, "anne");
    assert_eq!(outcome.transcript.len(), 10);
    assert_eq!(outcome.transcript_text.lines().count(), 10);
    let agents: Vec<&str> = outcome
        .transcript
        .iter()
        .map(|l| l.split(": ").next().unwrap())
        .collect();
    assert_eq!(agents, WorkflowDefinition::medassist().node_ids());
    assert_eq!(
        outcome.transcript[3],
        "ProviderNetworkAgent: Hospital Pasteur provides Level 1 trauma care."
    );
    assert_eq!(outcome.transcript[7], "MedicalDecisionAgent: ✅ Case cleared.");

    let voices = speech.voices.lock().unwrap();
    assert_eq!(voices.len(), 10);
    assert!(voices.iter().all(|v| v == "fr-FR-Wavenet-A"));

    assert!(outcome.run_dir.starts_with(root.path()));
    assert_eq!(outcome.document_path.file_name().unwrap(), "anne_conversation.pdf");
    assert_eq!(outcome.combined_audio_path.file_name().unwrap(), "anne_full_convo.wav");
    assert_eq!(outcome.page_count, 1);

    let doc = lopdf::Document::load(&outcome.document_path).unwrap();
    assert_eq!(doc.get_pages().len(), 1);

    let combined = PcmAudio::read_wav(&outcome.combined_audio_path).unwrap();
    assert_eq!(combined.frames(), 10 * VOICE_FRAMES as usize);

    let archive = zip::ZipArchive::new(File::open(&outcome.bundle_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 13);
    let names: std::collections::HashSet<&str> = archive.file_names().collect();
    assert_eq!(names.len(), 13);
    assert!(names.contains("case_log.txt"));
    assert!(names.contains("anne_conversation.pdf"));
    assert!(names.contains("anne_full_convo.wav"));
    assert_eq!(names.iter().filter(|n| n.ends_with(".wav")).count(), 11);
}

#[tokio::test]
async fn test_english_patient_uses_english_voice() {
    let root = tempfile::tempdir().unwrap();
    let speech = Arc::new(FakeSpeech::new());
    let runner = runner(
        speech.clone(),
        AmbientLibrary::new(),
        WorkflowDefinition::medassist(),
        root.path(),
    );

    let outcome = runner.run_case("liam").await.unwrap();
    assert!(outcome.transcript[1].contains("This is outpatient."));
    assert!(speech.voices.lock().unwrap().iter().all(|v| v == "en-GB-Wavenet-A"));
}

#[tokio::test]
async fn test_unknown_patient_writes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let output = root.path().join("runs");
    let speech = Arc::new(FakeSpeech::new());
    let runner = runner(
        speech.clone(),
        AmbientLibrary::new(),
        WorkflowDefinition::medassist(),
        &output,
    );

    let result = runner.run_case("bob").await;
    assert!(matches!(result, Err(CaseError::PatientNotFound(ref id)) if id == "bob"));
    assert!(!output.exists());
    assert_eq!(speech.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_custom_directory_replaces_builtin_patients() {
    let root = tempfile::tempdir().unwrap();
    let speech = Arc::new(FakeSpeech::new());
    let directory = PatientDirectory::from_entries(vec![(
        "Marco".to_string(),
        PatientCase::new("Marco", "Rome, Italy", "chest pain", Urgency::Emergency, "it"),
    )]);
    let runner = runner(
        speech.clone(),
        AmbientLibrary::new(),
        WorkflowDefinition::medassist(),
        root.path(),
    )
    .with_directory(directory);

    assert!(matches!(
        runner.run_case("anne").await,
        Err(CaseError::PatientNotFound(_))
    ));

    let outcome = runner.run_case("MARCO").await.unwrap();
    assert_eq!(outcome.patient_id, "marco");
    assert!(outcome.transcript[0].contains("Rome, Italy"));
    // unsupported languages fall back to the English voice
    assert!(speech.voices.lock().unwrap().iter().all(|v| v == "en-GB-Wavenet-A"));
}

#[tokio::test]
async fn test_synthesis_failure_leaves_no_artifacts() {
    let root = tempfile::tempdir().unwrap();
    let speech = Arc::new(FakeSpeech::failing_on(5));
    let runner = runner(
        speech.clone(),
        AmbientLibrary::new(),
        WorkflowDefinition::medassist(),
        root.path(),
    );

    let result = runner.run_case("priya").await;
    assert!(matches!(result, Err(CaseError::SynthesisFailure(_))));
    assert_eq!(speech.calls.load(Ordering::SeqCst), 5);
    assert_eq!(entries(root.path()), 0);
}

/// Answers the first call, then never returns.
struct StallingSpeech {
    calls: AtomicUsize,
}

#[async_trait]
impl SpeechService for StallingSpeech {
    async fn synthesize(
        &self,
        _ssml: &str,
        _voice: &VoiceConfig,
        _encoding: AudioEncoding,
    ) -> Result<Vec<u8>, CaseError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            std::future::pending::<()>().await;
        }
        Ok(silent_wav())
    }
}

#[tokio::test]
async fn test_cancelled_run_removes_its_workspace() {
    let root = tempfile::tempdir().unwrap();
    let speech = Arc::new(StallingSpeech {
        calls: AtomicUsize::new(0),
    });
    let runner = CaseRunner::new(
        SpeechSynthesizer::new(speech.clone(), AmbientLibrary::new()),
        Arc::new(FakeRetriever),
        WorkflowDefinition::medassist(),
        root.path(),
    )
    .unwrap();

    let result = tokio::time::timeout(Duration::from_millis(200), runner.run_case("anne")).await;
    assert!(result.is_err(), "run should still be stalled on its second step");
    assert_eq!(speech.calls.load(Ordering::SeqCst), 2);

    let dirs: Vec<_> = std::fs::read_dir(root.path())
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert!(dirs.is_empty(), "leftover run directories: {:?}", dirs);
}

#[tokio::test]
async fn test_missing_ambient_bed_keeps_voice_only() {
    let root = tempfile::tempdir().unwrap();
    let beds = tempfile::tempdir().unwrap();
    let runner = runner(
        Arc::new(FakeSpeech::new()),
        AmbientLibrary::from_dir(beds.path()),
        WorkflowDefinition::medassist(),
        root.path(),
    );

    let outcome = runner.run_case("anne").await.unwrap();
    assert_eq!(outcome.transcript.len(), 10);

    let combined = PcmAudio::read_wav(&outcome.combined_audio_path).unwrap();
    assert!(!combined.is_empty());
    assert!(combined.samples.iter().all(|s| *s == 0.0));
}

#[tokio::test]
async fn test_undecodable_ambient_bed_keeps_voice_only() {
    let root = tempfile::tempdir().unwrap();
    let beds = tempfile::tempdir().unwrap();
    std::fs::write(beds.path().join("ambient_hospital.mp3"), b"not really an mp3 file").unwrap();
    std::fs::write(beds.path().join("ambient_airport.mp3"), [0u8; 64]).unwrap();

    let runner = runner(
        Arc::new(FakeSpeech::new()),
        AmbientLibrary::from_dir(beds.path()),
        WorkflowDefinition::medassist(),
        root.path(),
    );

    let outcome = runner.run_case("anne").await.unwrap();
    assert_eq!(outcome.transcript.len(), 10);

    let combined = PcmAudio::read_wav(&outcome.combined_audio_path).unwrap();
    assert_eq!(combined.frames(), 10 * VOICE_FRAMES as usize);
    assert!(combined.samples.iter().all(|s| *s == 0.0));
}

#[tokio::test]
async fn test_ambient_bed_is_mixed_under_voice() {
    let root = tempfile::tempdir().unwrap();
    let beds = tempfile::tempdir().unwrap();
    let bed = beds.path().join("hospital.wav");
    PcmAudio::new(VOICE_RATE, 1, vec![0.5; 400]).write_wav(&bed).unwrap();

    let workflow = WorkflowDefinition {
        name: "provider only".to_string(),
        description: None,
        version: "1.0".to_string(),
        nodes: vec![NodeDescriptor::new("ProviderNetworkAgent").with_context(AmbientContext::Hospital)],
    };
    let runner = runner(
        Arc::new(FakeSpeech::new()),
        AmbientLibrary::new().with_bed(AmbientContext::Hospital, &bed),
        workflow,
        root.path(),
    );

    let outcome = runner.run_case("anne").await.unwrap();
    let mixed = PcmAudio::read_wav(&outcome.combined_audio_path).unwrap();

    // voice length is kept; the short bed loops under it at -12 dB
    assert_eq!(mixed.frames(), VOICE_FRAMES as usize);
    assert!(mixed.samples.iter().all(|s| (*s - 0.5 * 0.2512).abs() < 2e-3));
}

#[tokio::test]
async fn test_unknown_agent_uses_defaults() {
    let root = tempfile::tempdir().unwrap();
    let workflow = WorkflowDefinition::from_yaml(
        r#"
name: "Audit"
nodes:
  - id: ClientAgent
    emotion: stress
  - id: AuditAgent
"#,
    )
    .unwrap();
    let runner = runner(Arc::new(FakeSpeech::new()), AmbientLibrary::new(), workflow, root.path());

    let outcome = runner.run_case("priya").await.unwrap();
    assert_eq!(
        outcome.transcript,
        vec![
            "ClientAgent: 📞 Hello? I had a fall in Doha Airport, Qatar. It hurts badly!".to_string(),
            "AuditAgent: AuditAgent is processing...".to_string(),
        ]
    );

    let archive = zip::ZipArchive::new(File::open(&outcome.bundle_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 5);
}

#[tokio::test]
async fn test_repeated_runs_are_isolated_and_deterministic() {
    let root = tempfile::tempdir().unwrap();
    let runner = Arc::new(runner(
        Arc::new(FakeSpeech::new()),
        AmbientLibrary::new(),
        WorkflowDefinition::medassist(),
        root.path(),
    ));

    let (a, b) = tokio::join!(runner.run_case("anne"), runner.run_case("anne"));
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.transcript, b.transcript);
    assert_ne!(a.run_id, b.run_id);
    assert_ne!(a.run_dir, b.run_dir);
    assert_eq!(entries(root.path()), 2);
    assert!(a.bundle_path.exists());
    assert!(b.bundle_path.exists());
}

#[test]
fn test_invalid_workflow_is_rejected_up_front() {
    let root = tempfile::tempdir().unwrap();
    let workflow = WorkflowDefinition {
        name: "dup".to_string(),
        description: None,
        version: "1.0".to_string(),
        nodes: vec![NodeDescriptor::new("ClientAgent"), NodeDescriptor::new("ClientAgent")],
    };
    let result = CaseRunner::new(
        SpeechSynthesizer::new(Arc::new(FakeSpeech::new()), AmbientLibrary::new()),
        Arc::new(FakeRetriever),
        workflow,
        root.path(),
    );
    assert!(matches!(result, Err(CaseError::InvalidWorkflow(_))));
}
