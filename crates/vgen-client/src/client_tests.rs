//! Tests for the REST client against a mock backend.

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vgen_models::{
    BatchAction, IdeaId, IdeaStatus, JobStatus, Stage, UploadVideoRequest, ValidateIdeaRequest, Video, VideoType,
};

use crate::client::{ClientConfig, StudioClient};
use crate::error::ClientError;

// =============================================================================
// Test Helpers
// =============================================================================

fn client_for(server: &MockServer) -> StudioClient {
    StudioClient::new(ClientConfig::new(&server.uri()).unwrap()).unwrap()
}

fn idea_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Idée {}", id),
        "keywords": ["stoïcisme"],
        "video_type": "short",
        "duration_seconds": 30,
        "status": status,
        "script_id": null,
        "error_message": null,
        "created_at": "2025-03-01T09:00:00Z"
    })
}

// =============================================================================
// Ideas
// =============================================================================

#[tokio::test]
async fn test_list_ideas() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ideas/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([idea_json("a", "pending"), idea_json("b", "queued")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ideas = client_for(&server).list_ideas().await.unwrap();
    assert_eq!(ideas.len(), 2);
    assert_eq!(ideas[1].status, IdeaStatus::Queued);
}

#[tokio::test]
async fn test_validate_idea_sends_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/ideas/a/validate"))
        .and(body_json(json!({
            "video_type": "normal",
            "duration_seconds": 120,
            "keywords": ["sénèque"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(idea_json("a", "validated")))
        .expect(1)
        .mount(&server)
        .await;

    let request = ValidateIdeaRequest::new(VideoType::Normal, 120).with_keywords(vec!["sénèque".into()]);
    let idea = client_for(&server)
        .validate_idea(&IdeaId::from("a"), &request)
        .await
        .unwrap();
    assert_eq!(idea.status, IdeaStatus::Validated);
}

#[tokio::test]
async fn test_invalid_request_never_leaves_the_client() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = ValidateIdeaRequest::new(VideoType::Short, 5);
    let result = client_for(&server).validate_idea(&IdeaId::from("a"), &request).await;
    assert!(matches!(result, Err(ClientError::Validation(_))));
}

#[tokio::test]
async fn test_delete_missing_idea_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/ideas/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Idea gone not found"})))
        .mount(&server)
        .await;

    let err = client_for(&server).delete_idea(&IdeaId::from("gone")).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.user_message(), "Idea gone not found");
}

#[tokio::test]
async fn test_batch_action_reports_partial_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ideas/batch-action"))
        .and(query_param("action", "delete"))
        .and(query_param("idea_ids", "a"))
        .and(query_param("idea_ids", "e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {
                "success": ["a", "b", "c"],
                "failed": [{"id": "d", "reason": "locked"}, "e"]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ids: Vec<IdeaId> = ["a", "b", "c", "d", "e"].into_iter().map(IdeaId::from).collect();
    let outcome = client_for(&server)
        .batch_action(&ids, BatchAction::Delete)
        .await
        .unwrap();

    let summary = outcome.summary();
    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 2);
}

// =============================================================================
// Pipeline and queue
// =============================================================================

#[tokio::test]
async fn test_start_pipeline_sends_stage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pipeline/generate/a"))
        .and(query_param("start_from", "video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Job added to queue",
            "job_id": "j-1",
            "idea_id": "a",
            "queue_position": 2,
            "start_from": "video"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server)
        .start_pipeline(&IdeaId::from("a"), Stage::Video)
        .await
        .unwrap();
    assert_eq!(response.queue_position, Some(2));
    assert_eq!(response.start_from, Stage::Video);
}

#[tokio::test]
async fn test_start_pipeline_surfaces_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/pipeline/generate/a"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Idea must be validated first"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .start_pipeline(&IdeaId::from("a"), Stage::Script)
        .await
        .unwrap_err();
    assert_eq!(err.http_status(), Some(400));
    assert_eq!(err.user_message(), "Idea must be validated first");
}

#[tokio::test]
async fn test_job_status_and_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/queue/status/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "has_job": true,
            "job_id": "j-1",
            "idea_id": "a",
            "status": "queued",
            "queue_position": 4,
            "created_at": "2025-03-01T09:00:00",
            "started_at": null,
            "error_message": null,
            "retry_count": 0
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/queue/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "queued": 3,
            "processing": 2,
            "completed_today": 11,
            "max_concurrent": 2,
            "available_slots": 0
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let status = client.job_status(&IdeaId::from("a")).await.unwrap();
    assert_eq!(status.status, Some(JobStatus::Queued));
    assert_eq!(status.queue_position, Some(4));

    let stats = client.queue_stats().await.unwrap();
    assert!(stats.is_saturated());
}

#[tokio::test]
async fn test_cancel_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/queue/cancel/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Job cancelled",
            "job_id": "j-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = client_for(&server).cancel_job(&IdeaId::from("a")).await.unwrap();
    assert!(response.success);
}

#[tokio::test]
async fn test_pipeline_status_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/pipeline/status/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "idea_id": "a",
            "status": "error",
            "progress_percentage": 0,
            "current_step": "Erreur après 'audio_generated'",
            "error_message": "TTS quota exceeded"
        })))
        .mount(&server)
        .await;

    let snapshot = client_for(&server)
        .pipeline_status(&IdeaId::from("a"))
        .await
        .unwrap();
    assert_eq!(snapshot.status, IdeaStatus::Error);
    assert_eq!(snapshot.error_message.as_deref(), Some("TTS quota exceeded"));
}

// =============================================================================
// Videos
// =============================================================================

#[tokio::test]
async fn test_video_and_script_by_idea() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/videos/by-idea/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "vid-a",
            "idea_id": "a",
            "script_id": "s-a",
            "title": "Idée a",
            "video_type": "short",
            "duration_seconds": 31.2,
            "is_scheduled": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/scripts/by-idea/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "s-a",
            "idea_id": "a",
            "title": "Idée a",
            "original_script": "Ce qui dépend de nous..."
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let video = client.video_by_idea(&IdeaId::from("a")).await.unwrap();
    assert_eq!(video.id, "vid-a");
    let script = client.script_by_idea(&IdeaId::from("a")).await.unwrap();
    assert_eq!(script.spoken_text(), "Ce qui dépend de nous...");
}

#[tokio::test]
async fn test_video_not_rendered_yet_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/videos/by-idea/a"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Video for idea a not found"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .video_by_idea(&IdeaId::from("a"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.user_message(), "Video for idea a not found");
}

#[tokio::test]
async fn test_upload_video_posts_to_video_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/youtube/upload/vid-a"))
        .and(body_json(json!({"title": "Idée a", "tags": ["stoicisme"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "youtube_video_id": "yt123",
            "youtube_url": "https://www.youtube.com/watch?v=yt123",
            "description_generated": "Une vidéo sur le stoïcisme"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = UploadVideoRequest {
        title: Some("Idée a".to_string()),
        tags: vec!["stoicisme".to_string()],
        ..Default::default()
    };
    let response = client_for(&server)
        .upload_video(&Video::new("vid-a", "a", "Idée a"), &request)
        .await
        .unwrap();
    assert_eq!(response.youtube_video_id, "yt123");
}

#[tokio::test]
async fn test_upload_with_oversized_title_is_never_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = UploadVideoRequest {
        title: Some("t".repeat(150)),
        ..Default::default()
    };
    let err = client_for(&server)
        .upload_video(&Video::new("vid-a", "a", "Idée a"), &request)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

// =============================================================================
// Transport
// =============================================================================

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Nothing listens on the discard port.
    let client = StudioClient::new(ClientConfig::new("http://127.0.0.1:9").unwrap()).unwrap();
    let result = client.list_ideas().await;
    tokio_test::assert_err!(&result);
    let err = result.unwrap_err();
    assert!(err.is_transport());
    assert!(!err.user_message().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/queue/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).queue_stats().await.unwrap_err();
    assert!(matches!(err, ClientError::Json(_)));
}
