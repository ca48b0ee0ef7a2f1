//! Dispatch behaviour under concurrency and collector failure.

use std::time::Duration;

use traffic_audit::config::{AuditConfig, EventCollectorConfig};
use traffic_audit::dispatch::ProviderState;
use traffic_audit::sinks::Terminal;
use traffic_audit::Pipeline;

mod common;

use common::MockCollector;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failures_reported_once_each() {
    let collector = MockCollector::start().await;
    collector.respond_with(500);

    let mut config = AuditConfig::default();
    config.console.enabled = false;
    config.event_collector = EventCollectorConfig {
        enabled: true,
        uri: Some(collector.base_url()),
        api_key: Some("key".to_string()),
        ..Default::default()
    };
    config.dispatch.drain_timeout_ms = 30_000;

    let terminal = Terminal::captured();
    let pipeline = Pipeline::builder(&config).terminal(terminal.clone()).build();

    let mut tasks = Vec::new();
    for task in 0..8 {
        let logger = pipeline.logger(format!("worker::{task}"));
        tasks.push(tokio::spawn(async move {
            for i in 0..5 {
                logger.info(format!("task {task} record {i}"));
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    pipeline.shutdown().await;

    assert_eq!(collector.received().len(), 40);
    let console = terminal.contents();
    assert_eq!(console.matches("ERR:").count(), 40);
    assert_eq!(console.matches("traffic_audit::sinks::event").count(), 40);
}

#[tokio::test]
async fn test_emission_does_not_wait_for_collector() {
    let collector = MockCollector::start().await;
    let mut config = AuditConfig::default();
    config.console.enabled = false;
    config.event_collector = EventCollectorConfig {
        enabled: true,
        uri: Some(collector.base_url()),
        api_key: Some("key".to_string()),
        ..Default::default()
    };
    config.dispatch.drain_timeout_ms = 30_000;

    let pipeline = Pipeline::builder(&config).terminal(Terminal::captured()).build();
    let logger = pipeline.logger("app");

    let started = std::time::Instant::now();
    for i in 0..200 {
        logger.info(format!("record {i}"));
    }
    assert!(started.elapsed() < Duration::from_secs(1));

    pipeline.shutdown().await;
    assert_eq!(collector.received().len(), 200);
}

#[tokio::test]
async fn test_records_after_shutdown_are_dropped() {
    let (pipeline, recording, _) = common::recording_pipeline(&AuditConfig::default());
    let logger = pipeline.logger("app");

    logger.info("before");
    pipeline.shutdown().await;
    logger.info("after");
    pipeline.shutdown().await;

    let texts: Vec<String> = recording.records().iter().map(|r| r.text().to_string()).collect();
    assert_eq!(texts, vec!["before".to_string()]);
    assert!(pipeline
        .providers()
        .iter()
        .all(|p| p.state() == ProviderState::Stopped));
}
