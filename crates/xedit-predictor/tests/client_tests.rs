//! Prediction client tests against a mock prediction service.

use serde_json::json;
use tempfile::TempDir;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use xedit_models::{ExpressionParams, ImageRef, NormalizedOutput, OutputSlot, OutputValue, SubmissionState};
use xedit_predictor::{PredictError, PredictionClient, PredictorConfig};

fn config_for(server: &MockServer) -> PredictorConfig {
    PredictorConfig {
        predictions_url: format!("{}/predictions", server.uri()),
        ..PredictorConfig::default().without_delays()
    }
}

fn client_for(server: &MockServer) -> PredictionClient {
    PredictionClient::new(config_for(server)).unwrap()
}

async fn mount_accepted(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/predictions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "job-1",
            "status": "starting",
            "urls": {"get": format!("{}/predictions/job-1", server.uri())}
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_submit_polls_until_succeeded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predictions"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "input": {"rotate_pitch": 0, "smile": 0, "output_format": "webp", "output_quality": 95}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "job-1",
            "status": "starting",
            "urls": {"get": format!("{}/predictions/job-1", server.uri())}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/predictions/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "processing"})))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/predictions/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "succeeded",
            "output": "https://cdn.example.com/edited.webp"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (state, rx) = watch::channel(SubmissionState::Built);
    let output = client
        .submit_observed(
            &ExpressionParams::default(),
            &[OutputSlot::Image],
            &CancellationToken::new(),
            &state,
        )
        .await
        .unwrap();

    assert_eq!(
        output,
        NormalizedOutput::Single(OutputValue::Image(ImageRef::Url(
            "https://cdn.example.com/edited.webp".into()
        )))
    );
    assert_eq!(*rx.borrow(), SubmissionState::Succeeded);
}

#[tokio::test]
async fn test_conflict_is_service_busy() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predictions"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (state, rx) = watch::channel(SubmissionState::Built);
    let err = client
        .submit_observed(
            &ExpressionParams::default(),
            &[OutputSlot::Image],
            &CancellationToken::new(),
            &state,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PredictError::ServiceBusy));
    assert!(err.user_message().contains("warming up"));
    assert_ne!(err.user_message(), "The submission failed!");
    assert_eq!(*rx.borrow(), SubmissionState::Rejected);
}

#[tokio::test]
async fn test_other_rejection_reports_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predictions"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"detail": "bad input"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .submit(&ExpressionParams::default(), &[OutputSlot::Image], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PredictError::Submission { status: 422 }));
    assert_eq!(err.user_message(), "The submission failed! Error: 422");
}

#[tokio::test]
async fn test_failed_job_is_not_retried() {
    let server = MockServer::start().await;
    mount_accepted(&server).await;

    Mock::given(method("GET"))
        .and(path("/predictions/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "failed",
            "error": "no face detected"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let (state, rx) = watch::channel(SubmissionState::Built);
    let err = client
        .submit_observed(
            &ExpressionParams::default(),
            &[OutputSlot::Image],
            &CancellationToken::new(),
            &state,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PredictError::JobFailed(Some(ref detail)) if detail == "no face detected"));
    assert_eq!(err.user_message(), "The submission failed!");
    assert_eq!(*rx.borrow(), SubmissionState::Failed);
}

#[tokio::test]
async fn test_poll_limit_bounds_the_loop() {
    let server = MockServer::start().await;
    mount_accepted(&server).await;

    Mock::given(method("GET"))
        .and(path("/predictions/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "processing"})))
        .expect(3)
        .mount(&server)
        .await;

    let config = PredictorConfig {
        max_polls: 3,
        ..config_for(&server)
    };
    let err = PredictionClient::new(config)
        .unwrap()
        .submit(&ExpressionParams::default(), &[OutputSlot::Image], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PredictError::PollLimitExceeded(3)));
}

#[tokio::test]
async fn test_cancel_stops_polling() {
    let server = MockServer::start().await;
    mount_accepted(&server).await;

    Mock::given(method("GET"))
        .and(path("/predictions/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "processing"})))
        .mount(&server)
        .await;

    let config = PredictorConfig {
        poll_interval: std::time::Duration::from_millis(20),
        max_polls: 10_000,
        ..config_for(&server)
    };
    let client = PredictionClient::new(config).unwrap();
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let err = client
        .submit(&ExpressionParams::default(), &[OutputSlot::Image], &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, PredictError::Cancelled));
}

#[tokio::test]
async fn test_poll_error_status_is_reported() {
    let server = MockServer::start().await;
    mount_accepted(&server).await;

    Mock::given(method("GET"))
        .and(path("/predictions/job-1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .submit(&ExpressionParams::default(), &[OutputSlot::Image], &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, PredictError::Submission { status: 404 }));
}

#[tokio::test]
async fn test_synchronous_success_skips_polling() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predictions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "succeeded",
            "output": ["caption", 0.87]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = client_for(&server)
        .submit(
            &ExpressionParams::default(),
            &[OutputSlot::Text, OutputSlot::Number],
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(
        output,
        NormalizedOutput::Many(vec![OutputValue::Text("caption".into()), OutputValue::Number(0.87)])
    );
}

#[tokio::test]
async fn test_image_is_sent_as_file_url() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("portrait.png");
    std::fs::write(&image, b"png bytes").unwrap();
    let expected = format!(
        "http://0.0.0.0:7860/file={}",
        std::fs::canonicalize(&image).unwrap().display()
    );

    Mock::given(method("POST"))
        .and(path("/predictions"))
        .and(body_partial_json(json!({"input": {"image": expected}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "succeeded",
            "output": "https://cdn.example.com/edited.webp"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = client_for(&server)
        .submit(
            &ExpressionParams::for_image(&image),
            &[OutputSlot::Image],
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(output.as_single().is_some());
}

#[tokio::test]
async fn test_remote_image_is_downloaded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/predictions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "succeeded",
            "output": [format!("{}/outputs/edited", server.uri())]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/outputs/edited"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/webp")
                .set_body_bytes(b"webp bytes".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = PredictorConfig {
        download_dir: Some(dir.path().to_path_buf()),
        ..config_for(&server)
    };
    let output = PredictionClient::new(config)
        .unwrap()
        .submit(&ExpressionParams::default(), &[OutputSlot::Image], &CancellationToken::new())
        .await
        .unwrap();

    let Some(OutputValue::Image(ImageRef::Local(local))) = output.as_single() else {
        panic!("expected a local image, got {:?}", output);
    };
    assert!(local.starts_with(dir.path()));
    assert_eq!(local.extension().and_then(|e| e.to_str()), Some("webp"));
    assert_eq!(std::fs::read(local).unwrap(), b"webp bytes");
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "READY"})))
        .mount(&server)
        .await;

    assert!(client_for(&server).health_check().await.unwrap());
}

#[tokio::test]
async fn test_health_check_while_starting() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "STARTING"})))
        .mount(&server)
        .await;

    assert!(!client_for(&server).health_check().await.unwrap());
}

#[tokio::test]
async fn test_cancel_cuts_rejection_delay_short() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predictions"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let config = PredictorConfig {
        failure_delay: std::time::Duration::from_secs(30),
        ..config_for(&server)
    };
    let client = PredictionClient::new(config).unwrap();
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let err = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        client.submit(&ExpressionParams::default(), &[OutputSlot::Image], &cancel),
    )
    .await
    .expect("rejection delay ignored cancellation")
    .unwrap_err();

    assert!(matches!(err, PredictError::ServiceBusy));
}

#[tokio::test]
async fn test_all_zero_controls_are_submitted_as_is() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/predictions"))
        .and(body_partial_json(json!({
            "input": {
                "rotate_pitch": 0, "rotate_yaw": 0, "rotate_roll": 0,
                "blink": 0, "eyebrow": 0, "wink": 0, "pupil_x": 0, "pupil_y": 0,
                "aaa": 0, "eee": 0, "woo": 0, "smile": 0,
                "src_ratio": 0, "sample_ratio": 0, "crop_factor": 0,
                "output_format": "webp", "output_quality": 95
            }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "job-0",
            "status": "starting",
            "urls": {"get": format!("{}/predictions/job-0", server.uri())}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/predictions/job-0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "processing"})))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/predictions/job-0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "succeeded",
            "output": "https://cdn.example.com/zero.webp"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let params = ExpressionParams {
        src_ratio: 0.0,
        sample_ratio: 0.0,
        crop_factor: 0.0,
        ..ExpressionParams::default()
    };
    let request = client_for(&server).build_request(&params).unwrap();
    assert_eq!(request.input.len(), 17);

    let output = client_for(&server)
        .submit(&params, &[OutputSlot::Image], &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        output.as_single(),
        Some(&OutputValue::Image(ImageRef::Url("https://cdn.example.com/zero.webp".into())))
    );
}
