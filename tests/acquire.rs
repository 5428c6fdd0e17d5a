//! Recipe acquisition tests against a mocked HTTP server.

use shellsmith::recipe;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RECIPE_YAML: &str = r#"
os: any
metadata:
  name: Remote recipe
stages:
  - metadata:
      name: Only stage
    steps:
      - metadata:
          name: Only step
        execute:
          run:
            - echo 'remote'
"#;

#[tokio::test(flavor = "multi_thread")]
async fn from_url_downloads_and_parses_a_recipe() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recipe.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RECIPE_YAML))
        .mount(&server)
        .await;

    let url = format!("{}/recipe.yaml", server.uri());
    let recipe = tokio::task::spawn_blocking(move || recipe::from_url(&url))
        .await
        .expect("fetch task should not panic")
        .expect("recipe should download and parse");

    assert_eq!(recipe.metadata.name, "Remote recipe");
    assert_eq!(recipe.stages.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn from_url_reports_http_status_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.yaml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let url = format!("{}/missing.yaml", server.uri());
    let err = tokio::task::spawn_blocking(move || recipe::from_url(&url))
        .await
        .expect("fetch task should not panic")
        .expect_err("404 must be an error");

    assert!(err.to_string().contains("404"));
}

#[tokio::test(flavor = "multi_thread")]
async fn from_url_rejects_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/empty.yaml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&server)
        .await;

    let url = format!("{}/empty.yaml", server.uri());
    let err = tokio::task::spawn_blocking(move || recipe::from_url(&url))
        .await
        .expect("fetch task should not panic")
        .expect_err("empty body must be an error");

    assert!(err.to_string().contains("empty body"));
}

#[test]
fn from_url_rejects_non_url_input() {
    let err = recipe::from_url("./recipe.yaml").expect_err("not a URL");
    assert!(err.to_string().contains("incorrect recipe URL"));
}
