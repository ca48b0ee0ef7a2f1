//! Scope isolation across concurrent operations.

use traffic_audit::config::AuditConfig;
use traffic_audit::scope::{self, ScopeFrame, ScopeStack};

mod common;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_keep_their_own_scopes() {
    let (pipeline, recording, _) = common::recording_pipeline(&AuditConfig::default());

    let mut tasks = Vec::new();
    for op in 0..16 {
        let logger = pipeline.logger("app::ops");
        tasks.push(tokio::spawn(scope::scoped(ScopeStack::new(), async move {
            let _op = logger.begin_scope(ScopeFrame::properties([("Operation", op)]));
            tokio::task::yield_now().await;
            let _step = logger.begin_scope(ScopeFrame::label(format!("step-{op}")));
            logger.info(format!("op {op}"));
        })));
    }
    for task in tasks {
        task.await.unwrap();
    }
    pipeline.shutdown().await;

    let records = recording.records();
    assert_eq!(records.len(), 16);
    for record in &records {
        let op = record.text().trim_start_matches("op ");
        assert_eq!(record.scope("Operation"), Some(op));
        assert_eq!(record.scope("Scope"), Some(format!("step-{op}").as_str()));
    }
}

#[tokio::test]
async fn test_released_scopes_do_not_leak_into_later_records() {
    let (pipeline, recording, _) = common::recording_pipeline(&AuditConfig::default());
    let logger = pipeline.logger("app");

    scope::scoped(ScopeStack::new(), async {
        {
            let _outer = logger.begin_scope(ScopeFrame::label("outer"));
            let _inner = logger.begin_scope(ScopeFrame::properties([("Inner", true)]));
            logger.info("inside");
        }
        logger.info("after");
    })
    .await;
    pipeline.shutdown().await;

    let records = recording.records();
    assert_eq!(records[0].scope("Scope"), Some("outer"));
    assert_eq!(records[0].scope("Inner"), Some("true"));
    assert_eq!(records[1].scope("Scope"), None);
    assert_eq!(records[1].scope("Inner"), None);
}
