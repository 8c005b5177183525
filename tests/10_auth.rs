mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn request_without_authorization_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/records", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<Value>().await?;
    assert_eq!(body["error"]["code"], "MISSING_TOKEN");
    assert!(body["error"]["message"].is_string());
    Ok(())
}

#[tokio::test]
async fn basic_scheme_is_not_a_bearer_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/records", server.base_url))
        .header("Authorization", "Basic abc123")
        .header("X-Org-ID", "org-123")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<Value>().await?;
    assert_eq!(body["error"]["code"], "MISSING_TOKEN");
    Ok(())
}

#[tokio::test]
async fn bearer_without_org_header_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/records", server.base_url))
        .header("Authorization", "Bearer abc123")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["error"]["code"], "MISSING_ORG_ID");
    Ok(())
}

#[tokio::test]
async fn offline_mode_accepts_any_token_with_org_header() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/records", server.base_url))
        .header("Authorization", "Bearer abc123")
        .header("X-Org-ID", "org-123")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    // successful responses advertise the limit state
    assert!(res.headers().contains_key("x-ratelimit-limit"));
    assert!(res.headers().contains_key("x-ratelimit-remaining"));
    assert!(res.headers().get("retry-after").is_none());
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_catalog_shaped() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/definitely/not/here", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = res.json::<Value>().await?;
    assert_eq!(body["error"]["code"], "RESOURCE_NOT_FOUND");
    Ok(())
}
