use http::header::AUTHORIZATION;
use http::{HeaderValue, Method, StatusCode};
use reqwest::Url;
use serde_json::json;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;
use twitter_client::twitter_entity::{resolve, EntityKind};
use twitter_client::twitter_retry::RetryPolicy;
use twitter_client::{cache_key, Error, Parameters, RequestOptions, TwitterClient};
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, Respond, ResponseTemplate,
};

use crate::helpers::MemoryCache;

fn user() -> serde_json::Value {
    json!({
        "id": 6253282,
        "id_str": "6253282",
        "name": "Twitter API",
        "screen_name": "TwitterAPI",
        "description": "The Real Twitter API.",
        "followers_count": 6133636
    })
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy::builder()
        .default_delay(Duration::from_millis(1), Duration::from_millis(5))
        .rate_limit_delay(Duration::from_millis(1), Duration::from_millis(5))
        .build()
}

fn users_show(server: &MockServer) -> Url {
    Url::parse(&format!("{}/1.1/users/show.json", server.uri())).unwrap()
}

struct Sequence {
    calls: Arc<AtomicU32>,
    responses: Vec<ResponseTemplate>,
}

impl Respond for Sequence {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        self.responses
            .get(call)
            .or_else(|| self.responses.last())
            .cloned()
            .expect("at least one response")
    }
}

#[tokio::test]
async fn resolves_the_response_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/users/show.json"))
        .and(query_param("screen_name", "twitterapi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user()))
        .expect(1)
        .mount(&server)
        .await;

    let client = TwitterClient::builder().build().unwrap();
    let response = client
        .request(
            Method::GET,
            users_show(&server),
            Parameters::new().query("screen_name", "twitterapi"),
            RequestOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.has_error());
    let user = response.entity_user().unwrap();
    assert_eq!(user.screen_name(), Some("TwitterAPI"));
    assert_eq!(user.followers_count(), Some(6133636));
    assert!(response.entity_tweets().unwrap_err().is_entity_shape_mismatch());
}

#[tokio::test]
async fn default_bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "bearer DEFAULT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user()))
        .expect(1)
        .mount(&server)
        .await;

    let token = resolve(json!({ "token_type": "bearer", "access_token": "DEFAULT" }));
    let client = TwitterClient::builder()
        .default_bearer_token(&token.as_bearer_token().unwrap())
        .build()
        .unwrap();

    client
        .request(
            Method::GET,
            users_show(&server),
            Parameters::new(),
            RequestOptions::default(),
            None,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn explicit_bearer_token_wins_over_the_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "bearer EXPLICIT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user()))
        .expect(1)
        .mount(&server)
        .await;

    let default = resolve(json!({ "token_type": "bearer", "access_token": "DEFAULT" }));
    let explicit = resolve(json!({ "token_type": "bearer", "access_token": "EXPLICIT" }));
    let mut client = TwitterClient::builder().build().unwrap();
    client.set_default_bearer_token(&default.as_bearer_token().unwrap());

    client
        .request(
            Method::GET,
            users_show(&server),
            Parameters::new(),
            RequestOptions::default(),
            Some(&explicit.as_bearer_token().unwrap()),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn authorization_header_in_parameters_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(header("authorization", "Basic a2V5OnNlY3JldA=="))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token_type": "bearer", "access_token": "AAAA" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = resolve(json!({ "token_type": "bearer", "access_token": "DEFAULT" }));
    let client = TwitterClient::builder()
        .default_bearer_token(&token.as_bearer_token().unwrap())
        .build()
        .unwrap();

    let response = client
        .request(
            Method::POST,
            Url::parse(&format!("{}/oauth2/token", server.uri())).unwrap(),
            Parameters::new()
                .header(AUTHORIZATION, HeaderValue::from_static("Basic a2V5OnNlY3JldA=="))
                .body("grant_type=client_credentials"),
            RequestOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        response.entity_bearer_token().unwrap().to_string(),
        "bearer AAAA"
    );
}

#[tokio::test]
async fn get_responses_are_served_from_the_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = MemoryCache::default();
    let client = TwitterClient::builder()
        .cache_store(cache.clone())
        .build()
        .unwrap();

    let parameters = Parameters::new().query("screen_name", "twitterapi");
    let url = users_show(&server);
    let options = RequestOptions {
        expires_after: Some(Duration::from_secs(60)),
        ..RequestOptions::default()
    };

    let first = client
        .request(Method::GET, url.clone(), parameters.clone(), options.clone(), None)
        .await
        .unwrap();
    let second = client
        .request(Method::GET, url.clone(), parameters.clone(), options, None)
        .await
        .unwrap();

    assert_eq!(cache.len(), 1);
    assert_eq!(
        cache.expiry(&cache_key(&Method::GET, &url, &parameters)),
        Some(Some(Duration::from_secs(60)))
    );
    assert!(Arc::ptr_eq(first.entity().unwrap(), second.entity().unwrap()));
}

#[tokio::test]
async fn post_requests_skip_the_cache_unless_forced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user()))
        .expect(3)
        .mount(&server)
        .await;

    let cache = MemoryCache::default();
    let client = TwitterClient::builder()
        .cache_store(cache.clone())
        .build()
        .unwrap();
    let url = users_show(&server);

    for _ in 0..2 {
        client
            .request(
                Method::POST,
                url.clone(),
                Parameters::new(),
                RequestOptions::default(),
                None,
            )
            .await
            .unwrap();
    }
    assert_eq!(cache.len(), 0);

    let forced = RequestOptions {
        force_cache: true,
        ..RequestOptions::default()
    };
    for _ in 0..2 {
        client
            .request(Method::POST, url.clone(), Parameters::new(), forced.clone(), None)
            .await
            .unwrap();
    }
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn error_reports_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "errors": [{ "code": 50, "message": "User not found." }] })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let cache = MemoryCache::default();
    let client = TwitterClient::builder()
        .cache_store(cache.clone())
        .build()
        .unwrap();

    for _ in 0..2 {
        let response = client
            .request(
                Method::GET,
                users_show(&server),
                Parameters::new(),
                RequestOptions::default(),
                None,
            )
            .await
            .unwrap();
        assert!(response.has_error());
        assert!(response.entity_errors().unwrap().has_error_code(50));
    }
    assert_eq!(cache.len(), 0);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(Sequence {
            calls: Arc::new(AtomicU32::new(0)),
            responses: vec![
                ResponseTemplate::new(503),
                ResponseTemplate::new(200).set_body_json(user()),
            ],
        })
        .expect(2)
        .mount(&server)
        .await;

    let client = TwitterClient::builder()
        .retry_policy(fast_policy())
        .build()
        .unwrap();
    let response = client
        .request(
            Method::GET,
            users_show(&server),
            Parameters::new(),
            RequestOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.entity().unwrap().kind(), EntityKind::User);
}

#[tokio::test]
async fn not_found_is_returned_as_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(
                json!({ "errors": [{ "code": 34, "message": "Sorry, that page does not exist." }] }),
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = TwitterClient::builder()
        .retry_policy(fast_policy())
        .build()
        .unwrap();
    let response = client
        .request(
            Method::GET,
            users_show(&server),
            Parameters::new(),
            RequestOptions::default(),
            None,
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.has_error());
}

#[tokio::test]
async fn html_bodies_fail_unless_validation_is_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Over capacity</html>"))
        .expect(2)
        .mount(&server)
        .await;

    let client = TwitterClient::builder().build().unwrap();

    let err = client
        .request(
            Method::GET,
            users_show(&server),
            Parameters::new(),
            RequestOptions::default(),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::Http(e) if e.is_malformed_response()));

    let response = client
        .request(
            Method::GET,
            users_show(&server),
            Parameters::new(),
            RequestOptions {
                skip_json_validation: true,
                ..RequestOptions::default()
            },
            None,
        )
        .await
        .unwrap();
    assert_eq!(response.text(), "<html>Over capacity</html>");
    assert!(response.entity().unwrap_err().is_invalid_json());
    assert!(response.has_error());
}
