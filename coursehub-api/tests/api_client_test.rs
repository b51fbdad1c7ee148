//! API client behaviour against a mock backend

use coursehub_api::{endpoints, ApiClient, ApiClientConfig, CourseApi};
use coursehub_core::{CourseHubError, SigninInput, SignupInput, User};
use coursehub_session::SessionStore;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, store: &SessionStore) -> ApiClient {
    let config = ApiClientConfig::new(server.uri()).unwrap();
    ApiClient::new(config, store.clone()).unwrap()
}

fn user_json() -> serde_json::Value {
    json!({
        "first_name": "Ann",
        "email": "a@b.com",
        "courses": [],
        "subscribed": false
    })
}

fn sample_user() -> User {
    User {
        first_name: "Ann".to_string(),
        last_name: None,
        age: None,
        email: "a@b.com".to_string(),
        courses: vec![],
        subscribed: false,
    }
}

fn signin_input() -> SigninInput {
    SigninInput {
        email: "a@b.com".to_string(),
        password: "secret1".to_string(),
    }
}

#[tokio::test]
async fn attaches_bearer_token_from_store() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoints::COURSES))
        .and(header("authorization", "Bearer abc123"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    store.set_auth("abc123", sample_user());
    let api = client_for(&server, &store);

    let courses = api.get_courses().await.unwrap();
    assert!(courses.is_empty());
}

#[tokio::test]
async fn omits_authorization_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoints::USER_COURSES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    let api = client_for(&server, &store);
    api.get_user_courses().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(
        requests[0].headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn token_is_read_at_call_time() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoints::COURSES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    let api = client_for(&server, &store);

    api.get_courses().await.unwrap();
    store.set_auth("late-token", sample_user());
    api.get_courses().await.unwrap();
    store.logout();
    api.get_courses().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let auth: Vec<Option<String>> = requests
        .iter()
        .map(|r| {
            r.headers
                .get("authorization")
                .map(|v| v.to_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(
        auth,
        vec![None, Some("Bearer late-token".to_string()), None]
    );
}

#[tokio::test]
async fn signin_success_populates_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::SIGNIN))
        .and(body_json(json!({"email": "a@b.com", "password": "secret1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "user": user_json()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    let api = client_for(&server, &store);

    let auth = api.signin(&signin_input()).await.unwrap();
    store.set_auth(auth.access_token, auth.user);

    let session = store.snapshot();
    assert_eq!(session.token(), Some("tok"));
    assert_eq!(session.user(), Some(&sample_user()));
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn signin_failure_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::SIGNIN))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    let before = store.snapshot();
    let api = client_for(&server, &store);

    let err = api.signin(&signin_input()).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(err.message(), "Invalid credentials");
    assert_eq!(err.status(), Some(401));
    assert!(!err.is_validation());
    assert_eq!(store.snapshot(), before);
}

#[tokio::test]
async fn server_error_without_message_uses_status_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoints::COURSES))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>boom</html>"))
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    let api = client_for(&server, &store);

    let err = api.get_courses().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error! status: 500");
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn truncated_error_body_uses_status_line() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Announces 100 body bytes, sends a few, then hangs up
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let uri = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(
                b"HTTP/1.1 500 Internal Server Error\r\n\
                  Content-Type: application/json\r\n\
                  Content-Length: 100\r\n\r\n{\"mess",
            )
            .await
            .unwrap();
    });

    let store = SessionStore::in_memory();
    let api = ApiClient::new(ApiClientConfig::new(uri).unwrap(), store).unwrap();

    let err = api.get_courses().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error! status: 500");
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn subscribe_rejects_invalid_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::SUBSCRIBE))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"first_name": "Jo", "email": "jo@x.com"})),
        )
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    store.set_auth("tok", sample_user());
    let api = client_for(&server, &store);

    let err = api.subscribe().await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Subscription failed: Invalid data received");
    match err {
        CourseHubError::Validation { field, .. } => {
            assert_eq!(field.as_deref(), Some("first_name"))
        }
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn subscribe_returns_validated_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::SUBSCRIBE))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "first_name": "Ann",
            "email": "a@b.com",
            "subscribed": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    store.set_auth("tok", sample_user());
    let api = client_for(&server, &store);

    let user = api.subscribe().await.unwrap().unwrap();
    assert!(user.subscribed);
    assert!(user.courses.is_empty());

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

#[tokio::test]
async fn empty_object_is_not_no_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::SUBSCRIBE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    let api = client_for(&server, &store);

    let err = api.subscribe().await.unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn enroll_no_content_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::ENROLL))
        .and(body_json(json!({"courseId": "c1"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    store.set_auth("tok", sample_user());
    let api = client_for(&server, &store);

    let result = api.enroll_course("c1").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn zero_length_success_yields_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::SUBSCRIBE))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(endpoints::COURSES))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    let api = client_for(&server, &store);

    assert!(api.subscribe().await.unwrap().is_none());
    assert!(api.get_courses().await.unwrap().is_empty());
}

#[tokio::test]
async fn enroll_with_malformed_user_is_a_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::ENROLL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "first_name": "Ann",
            "courses": ["c1"],
            "subscribed": true
        })))
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    store.set_auth("tok", sample_user());
    let api = client_for(&server, &store);

    let err = api.enroll_course("c1").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "Enrollment failed: Invalid data received");
    assert_eq!(store.user(), Some(sample_user()));
}

#[tokio::test]
async fn signup_posts_form_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::SIGNUP))
        .and(body_json(json!({
            "first_name": "Ann",
            "last_name": "Lee",
            "email": "a@b.com",
            "password": "Str0ng!pass"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "access_token": "fresh",
            "user": {"first_name": "Ann", "last_name": "Lee", "email": "a@b.com"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    let api = client_for(&server, &store);

    let auth = api
        .signup(&SignupInput {
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: "a@b.com".to_string(),
            password: "Str0ng!pass".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(auth.access_token, "fresh");
    assert_eq!(auth.user.last_name.as_deref(), Some("Lee"));
    assert!(!auth.user.subscribed);
}

#[tokio::test]
async fn signin_without_token_in_response_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoints::SIGNIN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": user_json()})))
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    let api = client_for(&server, &store);

    let err = api.signin(&signin_input()).await.unwrap_err();
    assert_eq!(err.to_string(), "Signin failed: Invalid data received");
}

#[tokio::test]
async fn courses_are_decoded_with_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoints::COURSES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"_id": "c1", "name": "Rust", "description": "Ownership and borrowing"},
            {"_id": "c2", "name": "SQL", "description": "Joins"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(endpoints::USER_COURSES))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"_id": "c1"}])))
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    let api = client_for(&server, &store);

    let courses = api.get_courses().await.unwrap();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0].id, "c1");
    assert_eq!(courses[1].name, "SQL");

    let err = api.get_user_courses().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to load courses: Invalid data received");
}

#[tokio::test]
async fn non_json_success_body_is_a_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoints::COURSES))
        .respond_with(ResponseTemplate::new(200).set_body_string("definitely not json"))
        .mount(&server)
        .await;

    let store = SessionStore::in_memory();
    let api = client_for(&server, &store);

    let err = api.get_courses().await.unwrap_err();
    assert!(matches!(err, CourseHubError::Request { status: Some(200), .. }));
}

#[tokio::test]
async fn transport_failure_is_a_request_error() {
    // Nothing listens on a port whose listener was just dropped
    let uri = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let store = SessionStore::in_memory();
    let api = ApiClient::new(ApiClientConfig::new(uri).unwrap(), store).unwrap();

    let err = api.get_courses().await.unwrap_err();
    assert!(matches!(err, CourseHubError::Request { status: None, .. }));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn logout_makes_no_request() {
    let server = MockServer::start().await;
    let store = SessionStore::in_memory();
    store.set_auth("tok", sample_user());
    let api = client_for(&server, &store);

    api.logout().await.unwrap();

    assert!(server.received_requests().await.unwrap().is_empty());
    assert!(store.is_authenticated());
}

#[test]
fn refuses_to_start_without_base_url() {
    let err = ApiClientConfig::new("").unwrap_err();
    assert!(matches!(err, CourseHubError::Config { .. }));
}
