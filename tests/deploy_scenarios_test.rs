//! Deploy scenario tests
//!
//! Drives the manifest resolver and uploader end to end against the
//! in-memory store and checks puts, results and the reported log sequence.

#[cfg(test)]
mod tests {
    use asset_sync::deploy::{
        DeployError, Deployer, ManifestResolver, ObjectUploader, UploadOptions,
    };
    use asset_sync::report::{Color, RecordingReporter};
    use asset_sync::store::{MemoryStore, StoreError};
    use std::collections::HashSet;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Build output with two assets and a local manifest
    fn dist() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log('app');\n").unwrap();
        std::fs::write(dir.path().join("app.css"), "body: {}\n").unwrap();
        std::fs::write(dir.path().join("manifest.txt"), "app.js\napp.css").unwrap();
        dir
    }

    fn candidates() -> Vec<String> {
        vec!["app.js".to_string(), "app.css".to_string()]
    }

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Resolve then upload, the way `Deployer::run` sequences them
    async fn run(
        store: &MemoryStore,
        reporter: &RecordingReporter,
        options: &UploadOptions,
    ) -> Result<Vec<String>, DeployError> {
        let resolved = ManifestResolver::new(store, reporter)
            .resolve(&candidates(), options.manifest_key.as_deref(), &options.prefix)
            .await;
        ObjectUploader::new(store, reporter)
            .upload(&resolved, options)
            .await
    }

    // ========================================================================
    // Scenario A: no manifest key
    // ========================================================================

    #[tokio::test]
    async fn test_full_deploy_without_manifest() {
        let dir = dist();
        let store = MemoryStore::new();
        let reporter = RecordingReporter::new();
        let options = UploadOptions::new(dir.path()).with_prefix("js-app");

        let uploaded = run(&store, &reporter, &options).await.unwrap();

        assert_eq!(uploaded.len(), 2);
        assert_eq!(uploaded.into_iter().collect::<HashSet<_>>(), set(&["app.js", "app.css"]));
        assert_eq!(store.put_count(), 2);

        let messages: HashSet<String> = reporter.messages().into_iter().collect();
        assert_eq!(messages, set(&["✔  js-app/app.js", "✔  js-app/app.css"]));
    }

    // ========================================================================
    // Scenario B: manifest key set, remote manifest missing
    // ========================================================================

    #[tokio::test]
    async fn test_missing_manifest_uploads_everything() {
        let dir = dist();
        let store = MemoryStore::new();
        let reporter = RecordingReporter::new();
        let options = UploadOptions::new(dir.path())
            .with_prefix("js-app")
            .with_manifest_key("manifest.txt");

        let uploaded = run(&store, &reporter, &options).await.unwrap();

        assert_eq!(
            uploaded.into_iter().collect::<HashSet<_>>(),
            set(&["app.js", "app.css", "manifest.txt"])
        );
        assert_eq!(store.put_count(), 3);

        let entries = reporter.entries();
        assert_eq!(entries.len(), 5);
        assert_eq!(
            entries[0].message,
            "Downloading manifest for differential deploy from `js-app/manifest.txt`..."
        );
        assert_eq!(
            entries[1].message,
            "Manifest not found. Disabling differential deploy."
        );
        assert_eq!(entries[1].options.color, Some(Color::Yellow));

        let markers: HashSet<String> = entries[2..].iter().map(|e| e.message.clone()).collect();
        assert_eq!(
            markers,
            set(&[
                "✔  js-app/app.js",
                "✔  js-app/app.css",
                "✔  js-app/manifest.txt"
            ])
        );
        assert!(entries.iter().all(|e| e.options.verbose));
    }

    // ========================================================================
    // Scenario C: remote manifest already lists app.js
    // ========================================================================

    #[tokio::test]
    async fn test_manifest_skips_published_files() {
        let dir = dist();
        let store = MemoryStore::new();
        store.insert("js-app/manifest.txt", "app.js");
        let reporter = RecordingReporter::new();
        let options = UploadOptions::new(dir.path())
            .with_prefix("js-app")
            .with_manifest_key("manifest.txt");

        let uploaded = run(&store, &reporter, &options).await.unwrap();

        assert_eq!(
            uploaded.into_iter().collect::<HashSet<_>>(),
            set(&["app.css", "manifest.txt"])
        );
        assert_eq!(store.put_count(), 2);

        let messages = reporter.messages();
        assert_eq!(messages.len(), 4);
        assert_eq!(
            messages[1],
            "Manifest found. Differential deploy will be applied."
        );
        assert_eq!(
            messages[2..].iter().cloned().collect::<HashSet<_>>(),
            set(&["✔  js-app/app.css", "✔  js-app/manifest.txt"])
        );

        // The local manifest replaces the remote one
        assert_eq!(
            store.object("js-app/manifest.txt").unwrap(),
            bytes::Bytes::from("app.js\napp.css")
        );
    }

    // ========================================================================
    // Scenario D: a put fails
    // ========================================================================

    #[tokio::test]
    async fn test_failed_put_fails_run() {
        let dir = dist();
        let store = MemoryStore::new();
        store.fail_key(
            "js-app/app.css",
            StoreError::PermissionDenied("AccessDenied".into()),
        );
        let reporter = RecordingReporter::new();
        let options = UploadOptions::new(dir.path()).with_prefix("js-app");

        let err = run(&store, &reporter, &options).await.unwrap_err();

        assert!(matches!(
            err,
            DeployError::Upload(StoreError::PermissionDenied(_))
        ));
        assert_eq!(err.to_string(), "Permission denied: AccessDenied");
    }

    #[tokio::test]
    async fn test_deployer_surfaces_failure_and_logs_it() {
        let dir = dist();
        let store = Arc::new(MemoryStore::new());
        store.fail_key("app.js", StoreError::Network("connection refused".into()));
        let reporter = Arc::new(RecordingReporter::new());
        let deployer = Deployer::new(store, reporter.clone(), "assets");

        let err = deployer
            .run(&candidates(), &UploadOptions::new(dir.path()))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Network error: connection refused");

        let entries = reporter.entries();
        let last = entries.last().unwrap();
        assert_eq!(last.message, "Network error: connection refused");
        assert_eq!(last.options.color, Some(Color::Red));
        assert!(!entries.iter().any(|e| e.message.starts_with("uploaded ")));
    }

    // ========================================================================
    // Metadata carried by puts
    // ========================================================================

    #[tokio::test]
    async fn test_put_metadata() {
        let dir = dist();
        let store = MemoryStore::new();
        let reporter = RecordingReporter::new();
        let options = UploadOptions::new(dir.path())
            .with_prefix("js-app")
            .with_acl("public-read")
            .with_gzipped(["app.js"]);

        run(&store, &reporter, &options).await.unwrap();

        let puts = store.puts();
        let css = puts.iter().find(|p| p.key == "js-app/app.css").unwrap();
        assert_eq!(css.body, bytes::Bytes::from("body: {}\n"));
        assert_eq!(css.metadata.content_type, "text/css; charset=utf-8");
        assert_eq!(css.metadata.cache_control, "max-age=63072000, public");
        assert_eq!(css.metadata.expires_header(), "Tue, 01 Jan 2030 00:00:00 GMT");
        assert_eq!(css.metadata.content_encoding, None);

        let js = puts.iter().find(|p| p.key == "js-app/app.js").unwrap();
        assert_eq!(js.metadata.content_encoding.as_deref(), Some("gzip"));
    }

    #[tokio::test]
    async fn test_concurrency_of_one_still_uploads_everything() {
        let dir = dist();
        let store = MemoryStore::new();
        let reporter = RecordingReporter::new();
        let options = UploadOptions::new(dir.path())
            .with_manifest_key("manifest.txt")
            .with_concurrency(1);

        let uploaded = run(&store, &reporter, &options).await.unwrap();
        assert_eq!(uploaded.len(), 3);
    }

    #[tokio::test]
    async fn test_manifest_only_run_when_everything_published() {
        let dir = dist();
        let store = MemoryStore::new();
        store.insert("manifest.txt", "app.js\napp.css");
        let reporter = RecordingReporter::new();
        let options = UploadOptions::new(dir.path()).with_manifest_key("manifest.txt");

        let uploaded = run(&store, &reporter, &options).await.unwrap();
        assert_eq!(uploaded, vec!["manifest.txt"]);
    }
}
