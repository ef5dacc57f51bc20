//! Integration tests for Client against an in-process stub orchestrator.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::post;
use gpipe_client::{Client, ClientConfig, ClientError, TransportError, WireFormat};
use gpipe_definition::{Pipeline, Step};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// A request as seen by the stub.
#[derive(Debug, Clone)]
struct Recorded {
  content_type: Option<String>,
  authorization: Option<String>,
  body: String,
}

#[derive(Clone)]
struct Stub {
  status: StatusCode,
  response: &'static str,
  delay: Option<Duration>,
  recorded: Arc<Mutex<Vec<Recorded>>>,
}

impl Stub {
  fn new(status: StatusCode, response: &'static str) -> Self {
    Self {
      status,
      response,
      delay: None,
      recorded: Arc::new(Mutex::new(Vec::new())),
    }
  }

  fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  fn requests(&self) -> Vec<Recorded> {
    self.recorded.lock().unwrap().clone()
  }

  /// Serve on an ephemeral port and return the base url.
  async fn start(&self) -> String {
    let app = Router::new()
      .route("/api/jobs", post(jobs))
      .with_state(self.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
  }
}

async fn jobs(State(stub): State<Stub>, headers: HeaderMap, body: String) -> (StatusCode, String) {
  let get_header = |name: header::HeaderName| {
    headers
      .get(name)
      .and_then(|v| v.to_str().ok())
      .map(str::to_string)
  };
  stub.recorded.lock().unwrap().push(Recorded {
    content_type: get_header(header::CONTENT_TYPE),
    authorization: get_header(header::AUTHORIZATION),
    body,
  });

  if let Some(delay) = stub.delay {
    tokio::time::sleep(delay).await;
  }
  (stub.status, stub.response.to_string())
}

fn sample_pipeline() -> Pipeline {
  let mut pipeline = Pipeline::new().with_input("Dolomiti");
  pipeline
    .add_step(Step::call("wikipedia/it").with_xin("{ title: start.input.page }"))
    .add_step(Step::call("chunker/chunk").with_id("chunking"));
  pipeline
}

#[tokio::test]
async fn test_run_posts_document_with_bearer_key() {
  let stub = Stub::new(StatusCode::OK, r#"{"jobId": "job-1", "status": "queued"}"#);
  let base_url = stub.start().await;

  let client = Client::new(&base_url, Some("secret")).unwrap();
  let response = client.run(&sample_pipeline()).await.unwrap();

  assert_eq!(response["jobId"], "job-1");
  assert_eq!(response["status"], "queued");

  let requests = stub.requests();
  assert_eq!(requests.len(), 1);
  assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
  assert_eq!(requests[0].authorization.as_deref(), Some("Bearer secret"));

  let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
  assert_eq!(
    body,
    serde_json::json!({
      "input": "Dolomiti",
      "_workflow": {
        "steps": [
          { "function": "wikipedia/it", "xin": "{ title: start.input.page }" },
          { "id": "chunking", "function": "chunker/chunk" }
        ]
      }
    })
  );
}

#[tokio::test]
async fn test_run_without_key_sends_no_authorization() {
  let stub = Stub::new(StatusCode::OK, "{}");
  let base_url = stub.start().await;

  Client::new(&base_url, None)
    .unwrap()
    .run(&sample_pipeline())
    .await
    .unwrap();
  Client::new(&base_url, Some(""))
    .unwrap()
    .run(&sample_pipeline())
    .await
    .unwrap();

  let requests = stub.requests();
  assert_eq!(requests.len(), 2);
  assert!(requests.iter().all(|r| r.authorization.is_none()));
}

#[tokio::test]
async fn test_run_as_text_format() {
  let stub = Stub::new(StatusCode::CREATED, r#"{"ok": true}"#);
  let base_url = stub.start().await;

  let client = Client::new(&format!("{}/", base_url), None).unwrap();
  let response = client
    .run_as(&sample_pipeline(), WireFormat::Yaml)
    .await
    .unwrap();
  assert_eq!(response["ok"], true);

  let requests = stub.requests();
  assert_eq!(requests[0].content_type.as_deref(), Some("application/x-yaml"));
  assert_eq!(
    requests[0].body,
    concat!(
      "input: \"Dolomiti\"\n",
      "_workflow:\n",
      "  steps:\n",
      "  - function: \"wikipedia/it\"\n",
      "    xin: \"{ title: start.input.page }\"\n",
      "  - id: \"chunking\"\n",
      "    function: \"chunker/chunk\"\n",
    )
  );
}

#[tokio::test]
async fn test_error_status_carries_status_and_body() {
  let stub = Stub::new(StatusCode::UNPROCESSABLE_ENTITY, "unknown function chunker/chunk");
  let base_url = stub.start().await;

  let err = Client::new(&base_url, None)
    .unwrap()
    .run(&sample_pipeline())
    .await
    .unwrap_err();

  match &err {
    ClientError::Transport(TransportError::Status { status, body }) => {
      assert_eq!(*status, 422);
      assert_eq!(body, "unknown function chunker/chunk");
    }
    other => panic!("expected status error, got {:?}", other),
  }
  assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_retryable() {
  let stub = Stub::new(StatusCode::SERVICE_UNAVAILABLE, "busy");
  let base_url = stub.start().await;

  let err = Client::new(&base_url, None)
    .unwrap()
    .run(&sample_pipeline())
    .await
    .unwrap_err();
  assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unparseable_response_is_distinct() {
  let stub = Stub::new(StatusCode::OK, "<html>ok</html>");
  let base_url = stub.start().await;

  let err = Client::new(&base_url, None)
    .unwrap()
    .run(&sample_pipeline())
    .await
    .unwrap_err();

  match err {
    ClientError::ResponseParse { body, .. } => assert_eq!(body, "<html>ok</html>"),
    other => panic!("expected parse error, got {:?}", other),
  }
}

#[tokio::test]
async fn test_empty_response_is_a_parse_error() {
  let stub = Stub::new(StatusCode::OK, "");
  let base_url = stub.start().await;

  let err = Client::new(&base_url, None)
    .unwrap()
    .run(&sample_pipeline())
    .await
    .unwrap_err();
  assert!(matches!(err, ClientError::ResponseParse { .. }));
}

#[tokio::test]
async fn test_duplicate_and_empty_ids_are_sent_as_given() {
  let stub = Stub::new(StatusCode::OK, "{}");
  let base_url = stub.start().await;

  let mut pipeline = Pipeline::new();
  pipeline
    .add_step(Step::call("a").with_id("tmp"))
    .add_step(Step::call("b").with_id("tmp"))
    .add_step(Step::call("c").with_id(""));

  Client::new(&base_url, None)
    .unwrap()
    .run(&pipeline)
    .await
    .unwrap();

  let requests = stub.requests();
  assert_eq!(requests.len(), 1);
  let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
  assert_eq!(
    body,
    serde_json::json!({
      "_workflow": {
        "steps": [
          { "id": "tmp", "function": "a" },
          { "id": "tmp", "function": "b" },
          { "id": "", "function": "c" }
        ]
      }
    })
  );
}

#[tokio::test]
async fn test_timeout_surfaces_as_transport_error() {
  let stub = Stub::new(StatusCode::OK, "{}").with_delay(Duration::from_secs(5));
  let base_url = stub.start().await;

  let config = ClientConfig::new(base_url).with_timeout_ms(100);
  let err = Client::from_config(&config)
    .unwrap()
    .run(&sample_pipeline())
    .await
    .unwrap_err();

  match err {
    ClientError::Transport(ref e) => assert!(e.is_timeout()),
    ref other => panic!("expected timeout, got {:?}", other),
  }
  assert!(err.is_retryable());
}

#[tokio::test]
async fn test_cancellation_abandons_request() {
  let stub = Stub::new(StatusCode::OK, "{}").with_delay(Duration::from_secs(5));
  let base_url = stub.start().await;
  let client = Client::new(&base_url, None).unwrap();

  let cancel = CancellationToken::new();
  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(100)).await;
    trigger.cancel();
  });

  let err = client
    .run_with_cancel(&sample_pipeline(), WireFormat::Json, cancel)
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    ClientError::Transport(TransportError::Cancelled)
  ));
}

#[tokio::test]
async fn test_connection_refused_is_retryable() {
  // Bind then drop to get a port nothing listens on.
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let err = Client::new(&format!("http://{}", addr), None)
    .unwrap()
    .run(&sample_pipeline())
    .await
    .unwrap_err();
  assert!(matches!(err, ClientError::Transport(TransportError::Request(_))));
  assert!(err.is_retryable());
}
