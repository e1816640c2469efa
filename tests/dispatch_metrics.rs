use std::collections::HashSet;
use std::sync::Arc;

use httpmock::MockServer;
use metrics_util::debugging::DebuggingRecorder;
use revalidate::domain::paths::RevalidationPath;
use revalidate::infra::audit_store::MemoryAuditStore;
use revalidate::revalidation::{
    DispatchMode, DispatchReport, EndpointConfig, METRIC_AUDIT_LOG_LEN, METRIC_DISPATCH_MS,
    METRIC_DISPATCH_TOTAL, METRIC_SKIPPED_TOTAL, RevalidationConfig, RevalidationEngine,
};

#[tokio::test]
async fn dispatch_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method("GET").path("/api/revalidate");
            then.status(200);
        })
        .await;

    let engine = RevalidationEngine::new(
        RevalidationConfig::default(),
        EndpointConfig::new(server.url("/api/revalidate"), "s3cret"),
        Arc::new(MemoryAuditStore::new()),
    )
    .expect("engine");

    let path = RevalidationPath::normalize("/blog/first/", "");
    let mut report = DispatchReport::default();
    engine
        .revalidate_paths(
            &[path.clone(), path],
            DispatchMode::Automatic,
            &mut report,
        )
        .await;
    assert_eq!(report.dispatched(), 1);
    assert_eq!(report.skipped.len(), 1);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        METRIC_DISPATCH_TOTAL,
        METRIC_SKIPPED_TOTAL,
        METRIC_DISPATCH_MS,
        METRIC_AUDIT_LOG_LEN,
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
