//! Job lifecycle against real adapters
//!
//! JSON file store, process launcher and directory catalog wired the same way
//! the daemon wires them, with a shell script standing in for the worker.

#![cfg(unix)]

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use centroid_core::application::SubmitRequest;
use centroid_core::domain::JobStatus;
use centroid_core::error::AppError;
use centroid_core::port::VideoCatalog;
use common::{read_jobs_file, TestEngine};

fn request(video: &str) -> SubmitRequest {
    SubmitRequest {
        video_file_name: video.to_string(),
        target_color: Some("2D0508".to_string()),
        threshold: Some("180".to_string()),
    }
}

#[tokio::test]
async fn test_submit_runs_worker_to_done() {
    let engine = TestEngine::new();
    engine.add_video("clip.mp4");

    let job_id = engine.orchestrator.submit(request("clip.mp4")).await.unwrap();

    let record = engine.ledger.get(&job_id).await.unwrap().unwrap();
    assert_eq!(record.output_file_name, format!("{}/result.csv", job_id));

    let view = engine.wait_terminal(&job_id).await;
    assert_eq!(view.status, JobStatus::Done);
    assert_eq!(
        view.result.as_deref(),
        Some(format!("/results/{}/result.csv", job_id).as_str())
    );
    assert!(view.error.is_none());

    let job_dir = engine.layout.results_root.join(&job_id);
    let csv = std::fs::read_to_string(job_dir.join("result.csv")).unwrap();
    assert!(csv.starts_with("frame,x,y"));

    let log = std::fs::read_to_string(job_dir.join("worker.log")).unwrap();
    assert!(log.contains("color=2D0508 threshold=180"));
    assert!(log.contains(&engine.layout.video_root.join("clip.mp4").display().to_string()));
}

#[tokio::test]
async fn test_killed_worker_marks_job_error() {
    let engine = TestEngine::new();
    engine.add_video("crash.mp4");

    let job_id = engine.orchestrator.submit(request("crash.mp4")).await.unwrap();
    let view = engine.wait_terminal(&job_id).await;

    assert_eq!(view.status, JobStatus::Error);
    assert_eq!(view.error.as_deref(), Some("process exited with code 137"));
    assert!(view.result.is_none());
}

#[tokio::test]
async fn test_nonzero_exit_marks_job_error_and_keeps_log() {
    let engine = TestEngine::new();
    engine.add_video("broken.mp4");

    let job_id = engine.orchestrator.submit(request("broken.mp4")).await.unwrap();
    let view = engine.wait_terminal(&job_id).await;

    assert_eq!(view.error.as_deref(), Some("process exited with code 2"));
    let log = std::fs::read_to_string(engine.layout.worker_log_path(&job_id)).unwrap();
    assert!(log.contains("cannot decode"));
}

#[tokio::test]
async fn test_concurrent_jobs_all_reach_terminal_state() {
    let engine = Arc::new(TestEngine::new());
    let mut expected_errors = BTreeSet::new();

    let mut handles = Vec::new();
    for i in 0..20 {
        let video = if i % 4 == 0 {
            format!("crash-{}.mp4", i)
        } else {
            format!("clip-{}.mp4", i)
        };
        engine.add_video(&video);
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let job_id = engine.orchestrator.submit(request(&video)).await.unwrap();
            (video, job_id)
        }));
    }

    let mut submitted = BTreeSet::new();
    for handle in handles {
        let (video, job_id) = handle.await.unwrap();
        if video.starts_with("crash") {
            expected_errors.insert(job_id.clone());
        }
        submitted.insert(job_id);
    }
    assert_eq!(submitted.len(), 20);

    engine.wait_idle().await;

    let records = engine.ledger.snapshot().await.unwrap();
    assert_eq!(records.len(), 20);
    for record in records.values() {
        assert!(record.status.is_terminal(), "{} left {}", record.id, record.status);
        let expected = if expected_errors.contains(&record.id) {
            JobStatus::Error
        } else {
            JobStatus::Done
        };
        assert_eq!(record.status, expected, "job {}", record.id);
        assert!(record.finished_at.is_some());
    }

    // No update was lost on disk either
    let on_disk = read_jobs_file(&engine.jobs_file());
    assert_eq!(on_disk.len(), 20);
    let on_disk_ids: BTreeSet<String> = on_disk.keys().cloned().collect();
    assert_eq!(on_disk_ids, submitted);
    for (id, job) in &on_disk {
        assert_eq!(job["jobId"], id.as_str());
        assert_ne!(job["status"], "processing");
    }

    let listed: BTreeSet<String> = engine
        .status
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|summary| summary.job_id)
        .collect();
    assert_eq!(listed, submitted);
}

#[tokio::test]
async fn test_invalid_requests_create_no_job() {
    let engine = TestEngine::new();
    engine.add_video("clip.mp4");

    let mut missing_threshold = request("clip.mp4");
    missing_threshold.threshold = None;
    let mut bad_threshold = request("clip.mp4");
    bad_threshold.threshold = Some("bright".to_string());
    let escaping = request("../etc/passwd");

    for req in [missing_threshold, bad_threshold, escaping] {
        let result = engine.orchestrator.submit(req).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    assert!(engine.status.list_all().await.unwrap().is_empty());
    assert!(!engine.jobs_file().exists());
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let engine = TestEngine::new();

    let result = engine.status.get_status("nonexistentjobid").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_missing_worker_program_marks_job_error() {
    let engine = TestEngine::with_script("exec /nonexistent/videoprocessor \"$@\"");
    engine.add_video("clip.mp4");

    let job_id = engine.orchestrator.submit(request("clip.mp4")).await.unwrap();
    let view = engine.wait_terminal(&job_id).await;

    assert_eq!(view.status, JobStatus::Error);
    assert_eq!(view.error.as_deref(), Some("process exited with code 127"));
}

#[tokio::test]
async fn test_jobs_survive_restart() {
    let engine = TestEngine::new();
    engine.add_video("clip.mp4");

    let job_id = engine.orchestrator.submit(request("clip.mp4")).await.unwrap();
    engine.wait_idle().await;

    let engine = engine.reopen();
    let view = engine.status.get_status(&job_id).await.unwrap();
    assert_eq!(view.status, JobStatus::Done);
}

#[tokio::test]
async fn test_video_catalog_lists_uploaded_videos() {
    let engine = TestEngine::new();
    engine.add_video("b.mp4");
    engine.add_video("a.MP4");
    engine.add_video("readme.txt");

    let videos = engine.videos.list_videos().await.unwrap();
    assert_eq!(videos, vec!["a.MP4".to_string(), "b.mp4".to_string()]);
}
