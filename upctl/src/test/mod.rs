
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::Application;
use crate::config::Command;
use crate::controller::{DEBUG_ERROR_MESSAGE, DebugOutput};
use crate::errors::{Error, NETWORK_ERROR_MESSAGE};
use crate::presenter::{PresenterEvent, RecordingPresenter};
use crate::transport::ReqwestTransport;
use utils::{create_test_config, create_test_controller, sample_form_args, sample_input};

/// Full primary flow: validated form goes out as multipart, processed bytes come back as a download
#[test_log::test(tokio::test)]
async fn test_e2e_upload_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-file/"))
        .and(body_string_contains("name=\"app_id\"\r\n\r\n31"))
        .and(body_string_contains("name=\"file\"; filename=\"questions.csv\""))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"Question,Extracted Text\n".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let (controller, presenter) = create_test_controller(&server);
    let file = controller.submit(&sample_input("31")).await.unwrap();

    assert_eq!(file.filename(), "questions_processed.csv");
    assert_eq!(file.bytes().await.unwrap(), b"Question,Extracted Text\n");
    assert!(presenter.alerts().is_empty());
    assert!(matches!(&presenter.events()[..], [PresenterEvent::Download { filename, .. }] if filename == "questions_processed.csv"));
}

#[test_log::test(tokio::test)]
async fn test_e2e_upload_error_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-file/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Uploaded file must contain a 'Question' column."})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload-file/"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"detail": [{"loc": ["body", "product"], "msg": "field required"}]})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload-file/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let (controller, presenter) = create_test_controller(&server);
    for _ in 0..3 {
        let result = controller.submit(&sample_input("5")).await;
        assert!(matches!(result, Err(Error::Application { .. })));
    }

    assert_eq!(
        presenter.alerts(),
        vec![
            "Error: Uploaded file must contain a 'Question' column.".to_string(),
            r#"Error: [{"loc":["body","product"],"msg":"field required"}]"#.to_string(),
            "Error: 500".to_string(),
        ]
    );
    assert!(!controller.busy().is_visible());
}

#[tokio::test]
async fn test_e2e_invalid_app_id_never_reaches_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (controller, presenter) = create_test_controller(&server);
    let result = controller.submit(&sample_input("twelve")).await;

    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(presenter.alerts(), vec!["App ID must be a number.".to_string()]);
}

#[test_log::test(tokio::test)]
async fn test_e2e_debug_echo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/debug-form/"))
        .and(body_string_contains("name=\"app_id\"\r\n\r\nnot-numeric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "received": {
                "app_id": {"type": "field", "value": "not-numeric"},
                "file": {"type": "file", "filename": "questions.csv", "content_type": "text/csv"}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (controller, presenter) = create_test_controller(&server);
    let output = controller.debug(&sample_input("not-numeric")).await.unwrap();

    let DebugOutput::Echo { status, body } = output else {
        panic!("expected an echo, got {output:?}");
    };
    assert_eq!(status, 200);
    assert_eq!(body["received"]["file"]["filename"], "questions.csv");
    assert_eq!(presenter.debug_region().unwrap(), serde_json::to_string_pretty(&body).unwrap());
}

#[tokio::test]
async fn test_e2e_debug_unreachable() {
    // Nothing listens on this port
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let presenter = Arc::new(RecordingPresenter::new());
    let config = crate::Config {
        base_url: url::Url::parse(&format!("http://{addr}")).unwrap(),
        ..Default::default()
    };
    let transport = Arc::new(ReqwestTransport::from_config(&config).unwrap());
    let app = Application::with_parts(config, transport, presenter.clone());

    let output = app.controller().debug(&sample_input("1")).await.unwrap();
    assert_eq!(output, DebugOutput::Unreachable);
    assert_eq!(presenter.debug_region().unwrap(), DEBUG_ERROR_MESSAGE);

    let result = app.controller().submit(&sample_input("1")).await;
    assert!(matches!(result, Err(Error::Transport(_))));
    assert_eq!(presenter.alerts(), vec![NETWORK_ERROR_MESSAGE.to_string()]);
}

/// Both actions in flight at once: the indicator stays up until the slower one finishes
#[test_log::test(tokio::test)]
async fn test_e2e_concurrent_actions_share_busy_indicator() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-file/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"done".to_vec()).set_delay(Duration::from_millis(600)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/debug-form/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"received": {}})).set_delay(Duration::from_millis(100)))
        .mount(&server)
        .await;

    let (controller, _presenter) = create_test_controller(&server);
    assert!(!controller.busy().is_visible());

    let upload = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.submit(&sample_input("9")).await })
    };
    let debug = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.debug(&sample_input("9")).await })
    };

    tokio::time::timeout(Duration::from_secs(5), async {
        while controller.busy().in_flight() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("both actions should be in flight");

    // The faster action finishing must not hide the indicator for the slower one
    debug.await.unwrap().unwrap();
    assert!(controller.busy().is_visible());
    assert_eq!(controller.busy().in_flight(), 1);

    upload.await.unwrap().unwrap();
    assert!(!controller.busy().is_visible());
    assert_eq!(controller.busy().in_flight(), 0);
}

#[test_log::test(tokio::test)]
async fn test_application_upload_saves_processed_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-file/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"processed,csv\n".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("output");
    let presenter = Arc::new(RecordingPresenter::new());
    let config = create_test_config(&server);
    let transport = Arc::new(ReqwestTransport::from_config(&config).unwrap());
    let app = Application::with_parts(config, transport, presenter.clone());

    let form = sample_form_args(dir.path(), "77").await;
    app.run(Command::Upload {
        form,
        output_dir: Some(output_dir.clone()),
    })
    .await
    .unwrap();

    let saved_path = output_dir.join("questions_processed.csv");
    let saved = tokio::fs::read(&saved_path).await.unwrap();
    assert_eq!(saved, b"processed,csv\n");
    assert!(presenter.events().contains(&PresenterEvent::Notice(format!("Saved {}", saved_path.display()))));
    // The session ends with the command
    assert!(app.controller().session().current_result().is_none());
}

#[tokio::test]
async fn test_application_missing_file_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let presenter = Arc::new(RecordingPresenter::new());
    let config = create_test_config(&server);
    let transport = Arc::new(ReqwestTransport::from_config(&config).unwrap());
    let app = Application::with_parts(config, transport, presenter.clone());

    let mut form = sample_form_args(dir.path(), "1").await;
    form.file = Some(dir.path().join("does-not-exist.csv"));

    let result = app.run(Command::Debug { form }).await;
    assert!(matches!(result, Err(Error::Io(_))));
    assert_eq!(presenter.alerts().len(), 1);
    assert!(presenter.alerts()[0].starts_with("Could not read"));
}

#[tokio::test]
async fn test_application_both_commands() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload-file/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/debug-form/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"received": {"product": {"type": "field", "value": "Insights"}}})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let presenter = Arc::new(RecordingPresenter::new());
    let config = create_test_config(&server);
    let transport = Arc::new(ReqwestTransport::from_config(&config).unwrap());
    let app = Application::with_parts(config, transport, presenter.clone());

    let form = sample_form_args(dir.path(), "3").await;
    app.run(Command::Both {
        form,
        output_dir: Some(dir.path().join("out")),
    })
    .await
    .unwrap();

    assert!(dir.path().join("out").join("questions_processed.csv").exists());
    assert!(presenter.debug_region().unwrap().contains("\"Insights\""));
    assert!(presenter.alerts().is_empty());
    assert!(!app.controller().busy().is_visible());
}

fn busy_events(presenter: &RecordingPresenter) -> Vec<PresenterEvent> {
    presenter
        .events()
        .into_iter()
        .filter(|event| matches!(event, PresenterEvent::Busy(_)))
        .collect()
}

/// The presenter must always be left with the indicator hidden once a command returns
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_application_hides_busy_indicator_after_command() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/debug-form/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"received": {}})).set_delay(Duration::from_millis(20)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload-file/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad input"})).set_delay(Duration::from_millis(20)))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    for _ in 0..10 {
        let presenter = Arc::new(RecordingPresenter::new());
        let config = create_test_config(&server);
        let transport = Arc::new(ReqwestTransport::from_config(&config).unwrap());
        let app = Application::with_parts(config, transport, presenter.clone());

        let form = sample_form_args(dir.path(), "8").await;
        app.run(Command::Debug { form: form.clone() }).await.unwrap();
        assert_eq!(busy_events(&presenter), vec![PresenterEvent::Busy(true), PresenterEvent::Busy(false)]);

        // Failing command: the alert is shown and the indicator still comes down
        let result = app
            .run(Command::Upload {
                form,
                output_dir: Some(dir.path().join("out")),
            })
            .await;
        assert!(result.is_err());
        assert_eq!(busy_events(&presenter).last(), Some(&PresenterEvent::Busy(false)));
        assert_eq!(presenter.alerts(), vec!["Error: bad input".to_string()]);
    }
}
