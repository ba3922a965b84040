//! End-to-end pipeline scenarios with injected codec and archiver fakes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

use packsmith::assembler::{ArchiveAssembler, Archiver};
use packsmith::manifest::{Manifest, Outcome};
use packsmith::pipeline::{Codec, Orchestrator};
use packsmith::reprocess;
use packsmith_common::{Container, FailureKind, TargetProfile};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const MOV_HEADER: &[u8] = &[
    0x00, 0x00, 0x00, 0x14, b'f', b't', b'y', b'p', b'q', b't', b' ', b' ',
];

/// Codec fake that "encodes" by writing a marker, failing for any input whose
/// file name contains `fail_needle`.
struct ScriptedCodec {
    fail_needle: Option<&'static str>,
    invocations: AtomicUsize,
}

impl ScriptedCodec {
    fn ok() -> Self {
        Self {
            fail_needle: None,
            invocations: AtomicUsize::new(0),
        }
    }

    fn failing_on(needle: &'static str) -> Self {
        Self {
            fail_needle: Some(needle),
            invocations: AtomicUsize::new(0),
        }
    }

    fn run(&self, input: &Path, staged: &Path) -> packsmith_codecs::Result<()> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let name = input.file_name().unwrap().to_string_lossy();
        if let Some(needle) = self.fail_needle {
            if name.contains(needle) {
                return Err(packsmith_codecs::Error::tool_failed(
                    "ffmpeg",
                    format!("cannot decode {name}"),
                ));
            }
        }
        std::fs::write(staged, b"encoded")?;
        Ok(())
    }
}

#[async_trait]
impl Codec for ScriptedCodec {
    async fn encode_lossless_image(
        &self,
        input: &Path,
        staged: &Path,
    ) -> packsmith_codecs::Result<()> {
        self.run(input, staged)
    }

    async fn encode_upscaled_lossy_image(
        &self,
        input: &Path,
        staged: &Path,
        _scratch: &Path,
    ) -> packsmith_codecs::Result<()> {
        self.run(input, staged)
    }

    async fn transcode_video(
        &self,
        input: &Path,
        staged: &Path,
    ) -> packsmith_codecs::Result<()> {
        self.run(input, staged)
    }

    fn dist_image_extension(&self) -> &'static str {
        "avif"
    }
}

struct RecordingArchiver {
    packs: AtomicUsize,
}

impl RecordingArchiver {
    fn new() -> Self {
        Self {
            packs: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Archiver for RecordingArchiver {
    async fn pack(
        &self,
        _tree: &Path,
        destination: &Path,
        _container: Container,
    ) -> packsmith_codecs::Result<PathBuf> {
        self.packs.fetch_add(1, Ordering::SeqCst);
        std::fs::write(destination, b"packed")?;
        Ok(destination.to_path_buf())
    }
}

fn seed_source(root: &Path) -> PathBuf {
    let source = root.join("pack");
    std::fs::create_dir(&source).unwrap();
    std::fs::write(source.join("a.png"), PNG_MAGIC).unwrap();
    std::fs::write(source.join("a.mov"), MOV_HEADER).unwrap();
    std::fs::write(source.join("notes.txt"), b"liner notes").unwrap();
    source
}

#[tokio::test]
async fn mixed_source_yields_three_entries_per_profile() {
    let root = tempdir().unwrap();
    let source = seed_source(root.path());

    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedCodec::ok()),
        Arc::new(RecordingArchiver::new()),
        2,
        CancellationToken::new(),
    );
    let summary = orchestrator.run(&source).await.unwrap();

    assert_eq!(summary.files_scanned, 3);
    assert!(!summary.is_degraded());

    let archive = Manifest::load_from_tree(&root.path().join("pack_archive")).unwrap();
    assert_eq!(archive.profile, TargetProfile::Archive);
    assert_eq!(archive.entries.len(), 3);
    // png converted; mov and txt copied verbatim under the archive profile
    assert!(root.path().join("pack_archive/a.jxl").exists());
    assert!(root.path().join("pack_archive/a.mov").exists());
    assert!(root.path().join("pack_archive/notes.txt").exists());

    let dist = Manifest::load_from_tree(&root.path().join("pack_dist")).unwrap();
    assert_eq!(dist.entries.len(), 3);
    // png upscaled, mov transcoded, txt copied
    assert!(root.path().join("pack_dist/a.avif").exists());
    assert!(root.path().join("pack_dist/a.mp4").exists());
    assert!(root.path().join("pack_dist/notes.txt").exists());

    assert!(root.path().join("pack.7z").exists());
    assert!(root.path().join("pack.zip").exists());

    // Manifests are sorted by source path.
    let sources: Vec<_> = dist.entries.iter().map(|e| e.source_path.clone()).collect();
    let mut sorted = sources.clone();
    sorted.sort();
    assert_eq!(sources, sorted);
}

#[tokio::test]
async fn corrupt_file_degrades_run_without_aborting() {
    let root = tempdir().unwrap();
    let source = seed_source(root.path());
    std::fs::write(source.join("b.png"), b"truncated garbage").unwrap();

    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedCodec::failing_on("b.png")),
        Arc::new(RecordingArchiver::new()),
        2,
        CancellationToken::new(),
    );
    let summary = orchestrator.run(&source).await.unwrap();

    // b.png fails under both profiles, the other three files still convert.
    assert!(summary.is_degraded());
    assert_eq!(summary.total_failed(), 2);

    for tree in ["pack_archive", "pack_dist"] {
        let manifest = Manifest::load_from_tree(&root.path().join(tree)).unwrap();
        assert_eq!(manifest.entries.len(), 4);
        assert_eq!(manifest.failed_count(), 1);

        let failed = manifest
            .entries
            .iter()
            .find(|e| e.outcome.is_failed())
            .unwrap();
        assert_eq!(failed.source_path, PathBuf::from("b.png"));
        assert_matches!(
            failed.outcome,
            Outcome::Failed {
                kind: FailureKind::CodecFailure,
                ..
            }
        );
        assert!(failed.output_path.is_none());
    }

    // The failed conversion left nothing behind in either tree.
    assert!(!root.path().join("pack_archive/b.jxl").exists());
    assert!(!root.path().join("pack_dist/b.avif").exists());

    // Both containers were still assembled.
    assert!(root.path().join("pack.7z").exists());
    assert!(root.path().join("pack.zip").exists());
}

#[tokio::test]
async fn colliding_normalized_outputs_fail_the_later_source() {
    let root = tempdir().unwrap();
    let source = root.path().join("pack");
    std::fs::create_dir(&source).unwrap();
    // Same stem, different extension: both normalize to a.jxl (archive) and
    // a.avif (dist).
    std::fs::write(source.join("a.jpg"), &[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
    std::fs::write(source.join("a.png"), PNG_MAGIC).unwrap();

    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedCodec::ok()),
        Arc::new(RecordingArchiver::new()),
        2,
        CancellationToken::new(),
    );
    let summary = orchestrator.run(&source).await.unwrap();

    // One source per profile loses the output path and is recorded as failed.
    assert!(summary.is_degraded());
    assert_eq!(summary.total_failed(), 2);

    for tree in ["pack_archive", "pack_dist"] {
        let manifest = Manifest::load_from_tree(&root.path().join(tree)).unwrap();
        assert_eq!(manifest.entries.len(), 2);
        assert_eq!(manifest.failed_count(), 1);

        let failed = manifest
            .entries
            .iter()
            .find(|e| e.outcome.is_failed())
            .unwrap();
        // Scan order is lexicographic, so a.jpg claims the output first.
        assert_eq!(failed.source_path, PathBuf::from("a.png"));
        assert_matches!(
            failed.outcome,
            Outcome::Failed {
                kind: FailureKind::IoFailure,
                ..
            }
        );
        assert!(failed.output_path.is_none());
    }

    // Exactly one converted file per tree, and assembly still succeeded.
    assert!(root.path().join("pack_archive/a.jxl").exists());
    assert!(root.path().join("pack_dist/a.avif").exists());
    assert!(root.path().join("pack.7z").exists());
    assert!(root.path().join("pack.zip").exists());
}

#[tokio::test]
async fn reprocess_untouched_tree_runs_no_codecs() {
    let root = tempdir().unwrap();
    let source = seed_source(root.path());

    let codec = Arc::new(ScriptedCodec::ok());
    let orchestrator = Orchestrator::new(
        codec.clone(),
        Arc::new(RecordingArchiver::new()),
        2,
        CancellationToken::new(),
    );
    orchestrator.run(&source).await.unwrap();
    let invocations_after_process = codec.invocations.load(Ordering::SeqCst);

    std::fs::remove_file(root.path().join("pack.zip")).unwrap();

    let archiver = Arc::new(RecordingArchiver::new());
    let assembler = ArchiveAssembler::new(archiver.clone());
    let summary = reprocess::reprocess(&root.path().join("pack_dist"), &assembler)
        .await
        .unwrap();

    assert_eq!(summary.validated, 3);
    assert_eq!(summary.inconsistent, 0);
    assert!(!summary.is_degraded());
    assert_eq!(summary.artifact, root.path().join("pack.zip"));
    assert!(summary.artifact.exists());
    assert_eq!(archiver.packs.load(Ordering::SeqCst), 1);
    // The reprocessor reused staged outputs; no further codec work happened.
    assert_eq!(codec.invocations.load(Ordering::SeqCst), invocations_after_process);
}

#[tokio::test]
async fn reprocess_excludes_deleted_output_and_degrades() {
    let root = tempdir().unwrap();
    let source = seed_source(root.path());

    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedCodec::ok()),
        Arc::new(RecordingArchiver::new()),
        2,
        CancellationToken::new(),
    );
    orchestrator.run(&source).await.unwrap();

    let dist_tree = root.path().join("pack_dist");
    std::fs::remove_file(dist_tree.join("a.avif")).unwrap();

    let assembler = ArchiveAssembler::new(Arc::new(RecordingArchiver::new()));
    let summary = reprocess::reprocess(&dist_tree, &assembler).await.unwrap();

    assert_eq!(summary.validated, 2);
    assert_eq!(summary.inconsistent, 1);
    assert!(summary.is_degraded());

    let manifest = Manifest::load_from_tree(&dist_tree).unwrap();
    assert_eq!(manifest.entries.len(), 3);
    let inconsistent = manifest
        .entries
        .iter()
        .find(|e| e.outcome.is_failed())
        .unwrap();
    assert_eq!(inconsistent.source_path, PathBuf::from("a.png"));
    assert_matches!(
        inconsistent.outcome,
        Outcome::Failed {
            kind: FailureKind::ManifestInconsistent,
            ..
        }
    );

    // The archive profile tree was never touched.
    let archive = Manifest::load_from_tree(&root.path().join("pack_archive")).unwrap();
    assert_eq!(archive.failed_count(), 0);
}

#[tokio::test]
async fn stray_file_in_tree_fails_assembly() {
    let root = tempdir().unwrap();
    let source = seed_source(root.path());

    let orchestrator = Orchestrator::new(
        Arc::new(ScriptedCodec::ok()),
        Arc::new(RecordingArchiver::new()),
        2,
        CancellationToken::new(),
    );
    orchestrator.run(&source).await.unwrap();

    let dist_tree = root.path().join("pack_dist");
    std::fs::write(dist_tree.join("dropped-in.bin"), b"stray").unwrap();

    let assembler = ArchiveAssembler::new(Arc::new(RecordingArchiver::new()));
    let result = reprocess::reprocess(&dist_tree, &assembler).await;

    let err = result.unwrap_err().to_string();
    assert!(err.contains("stray"), "unexpected error: {err}");
}
