//! S3 Object Store Integration Tests
//!
//! Exercises `S3ObjectStore` against a mock S3-compatible endpoint using
//! path-style addressing, so every object lives under `/test-bucket/`.
//!
//! ## Test Coverage
//!
//! - PutObject headers (content type, caching, encoding, ACL, signing)
//! - GetObject body retrieval
//! - Status code mapping to `StoreError`
//! - Full deploy against the mock endpoint

#[cfg(test)]
mod tests {
    use asset_sync::deploy::{Deployer, TransferMetadata, UploadOptions};
    use asset_sync::report::RecordingReporter;
    use asset_sync::store::{Credentials, ObjectStore, S3ObjectStore, S3StoreConfig, StoreError};
    use bytes::Bytes;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_bytes, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store_for(server: &MockServer) -> S3ObjectStore {
        S3ObjectStore::new(S3StoreConfig {
            bucket: "test-bucket".to_string(),
            region: "us-east-1".to_string(),
            endpoint: Some(server.uri()),
            path_style: true,
            credentials: Credentials::new("test-access", "test-secret"),
            timeout: None,
        })
        .await
    }

    // ========================================================================
    // TEST: PutObject
    // ========================================================================

    #[tokio::test]
    async fn test_put_sends_metadata_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/test-bucket/js-app/app.css"))
            .and(header("content-type", "text/css; charset=utf-8"))
            .and(header("x-amz-acl", "public-read"))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(header_exists("x-amz-content-sha256"))
            .and(body_bytes(b"body: {}\n".to_vec()))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"css-etag\""))
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = store_for(&mock_server).await;
        let metadata = TransferMetadata::for_path("app.css", false, Some("public-read"));
        let ack = store
            .put("js-app/app.css", Bytes::from("body: {}\n"), &metadata)
            .await
            .unwrap();

        assert_eq!(ack.etag.as_deref(), Some("\"css-etag\""));

        // Comma-bearing values are checked on the raw request
        let requests = mock_server.received_requests().await.unwrap();
        let headers = &requests[0].headers;
        assert_eq!(
            headers.get("cache-control").unwrap().to_str().unwrap(),
            "max-age=63072000, public"
        );
        assert_eq!(
            headers.get("expires").unwrap().to_str().unwrap(),
            "Tue, 01 Jan 2030 00:00:00 GMT"
        );
        assert!(headers.get("content-encoding").is_none());
    }

    #[tokio::test]
    async fn test_put_marks_gzipped_content() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/test-bucket/app.js"))
            .and(header("content-encoding", "gzip"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = store_for(&mock_server).await;
        let metadata = TransferMetadata::for_path("app.js", true, None);
        let ack = store
            .put("app.js", Bytes::from_static(b"\x1f\x8b"), &metadata)
            .await
            .unwrap();

        assert!(ack.etag.is_none());
    }

    #[tokio::test]
    async fn test_requests_are_sigv4_signed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/test-bucket/app.js"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = store_for(&mock_server).await;
        let metadata = TransferMetadata::for_path("app.js", false, None);
        store
            .put("app.js", Bytes::from("x"), &metadata)
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let auth = requests[0]
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=test-access/"));
        assert!(auth.contains("/us-east-1/s3/aws4_request"));
        assert!(auth.contains("SignedHeaders="));
        assert!(auth.contains("Signature="));
    }

    // ========================================================================
    // TEST: Error mapping
    // ========================================================================

    #[tokio::test]
    async fn test_put_forbidden_maps_to_permission_denied() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>",
            ))
            .mount(&mock_server)
            .await;

        let store = store_for(&mock_server).await;
        let metadata = TransferMetadata::for_path("app.js", false, None);
        let err = store
            .put("app.js", Bytes::from("x"), &metadata)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            StoreError::PermissionDenied("app.js: Access Denied".into())
        );
    }

    #[tokio::test]
    async fn test_put_server_error_maps_to_provider_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(503).set_body_string(
                "<Error><Code>SlowDown</Code><Message>Please reduce your request rate.</Message></Error>",
            ))
            .mount(&mock_server)
            .await;

        let store = store_for(&mock_server).await;
        let metadata = TransferMetadata::for_path("app.js", false, None);
        let err = store
            .put("app.js", Bytes::from("x"), &metadata)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            StoreError::Provider {
                status: 503,
                code: "SlowDown".into(),
                message: "Please reduce your request rate.".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_non_xml_error_body_uses_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&mock_server)
            .await;

        let store = store_for(&mock_server).await;
        let metadata = TransferMetadata::for_path("app.js", false, None);
        let err = store
            .put("app.js", Bytes::from("x"), &metadata)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Provider { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let store = S3ObjectStore::new(S3StoreConfig {
            bucket: "test-bucket".to_string(),
            region: "us-east-1".to_string(),
            endpoint: Some("http://127.0.0.1:1".to_string()),
            path_style: true,
            credentials: Credentials::new("a", "b"),
            timeout: Some(Duration::from_secs(5)),
        })
        .await;

        let err = store.get("manifest.txt").await.unwrap_err();
        assert!(matches!(err, StoreError::Network(_)));
    }

    // ========================================================================
    // TEST: GetObject
    // ========================================================================

    #[tokio::test]
    async fn test_get_returns_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/test-bucket/js-app/manifest.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("app.js\napp.css"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = store_for(&mock_server).await;
        let body = store.get("js-app/manifest.txt").await.unwrap();
        assert_eq!(body, Bytes::from("app.js\napp.css"));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                "<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>",
            ))
            .mount(&mock_server)
            .await;

        let store = store_for(&mock_server).await;
        let err = store.get("manifest.txt").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("manifest.txt".into()));
    }

    #[tokio::test]
    async fn test_session_token_is_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/test-bucket/manifest.txt"))
            .and(header("x-amz-security-token", "session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("app.js"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = S3ObjectStore::new(S3StoreConfig {
            bucket: "test-bucket".to_string(),
            region: "us-east-1".to_string(),
            endpoint: Some(mock_server.uri()),
            path_style: true,
            credentials: Credentials::new("a", "b").with_session_token("session-token"),
            timeout: None,
        })
        .await;

        assert_eq!(store.get("manifest.txt").await.unwrap(), Bytes::from("app.js"));
    }

    // ========================================================================
    // TEST: Differential deploy against the mock endpoint
    // ========================================================================

    #[tokio::test]
    async fn test_deploy_skips_published_files() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/test-bucket/js-app/manifest.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string("app.js"))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/test-bucket/js-app/app.css"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/test-bucket/js-app/manifest.txt"))
            .and(header("content-type", "text/plain; charset=utf-8"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/test-bucket/js-app/app.js"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "1").unwrap();
        std::fs::write(dir.path().join("app.css"), "2").unwrap();
        std::fs::write(dir.path().join("manifest.txt"), "app.js\napp.css").unwrap();

        let reporter = Arc::new(RecordingReporter::new());
        let deployer = Deployer::new(
            Arc::new(store_for(&mock_server).await),
            reporter.clone(),
            "test-bucket",
        );
        let options = UploadOptions::new(dir.path())
            .with_prefix("js-app")
            .with_manifest_key("manifest.txt");

        let mut report = deployer
            .run(&["app.js".to_string(), "app.css".to_string()], &options)
            .await
            .unwrap();
        report.files_uploaded.sort();

        assert_eq!(report.files_uploaded, vec!["app.css", "manifest.txt"]);
        assert_eq!(
            reporter.messages().last().map(String::as_str),
            Some("uploaded 2 files ok")
        );
    }
}
