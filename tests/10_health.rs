mod common;

use anyhow::Result;
use reqwest::StatusCode;

use common::TestServer;

#[tokio::test]
async fn health_endpoint_reports_database_and_mode() -> Result<()> {
    let server = TestServer::start(common::self_issued_config()).await?;

    for path in ["/health", "/api/health"] {
        let (status, body) = server.get_json(path, None).await?;
        assert_eq!(status, StatusCode::OK, "{}", path);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["database"], "ok");
        assert_eq!(body["data"]["auth_mode"], "self-issued");
    }
    Ok(())
}

#[tokio::test]
async fn root_lists_service() -> Result<()> {
    let server = TestServer::start(common::self_issued_config()).await?;

    let (status, body) = server.get_json("/", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Swaasth API");
    let auth = body["data"]["endpoints"]["auth"].as_str().unwrap_or_default();
    assert!(auth.contains("/api/v1/auth/login"), "{}", auth);
    Ok(())
}
