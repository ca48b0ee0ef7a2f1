//! RPC interceptor tests.

use traffic_audit::config::{ActionRule, AuditConfig};
use traffic_audit::middleware::{RpcCallContext, RpcCode, RpcFault, RpcInterceptor, RpcStatus};
use traffic_audit::policy::REDACTED_BODY;
use traffic_audit::record::{LogLevel, LogRecord};
use traffic_audit::AuditControls;

mod common;

#[derive(Debug)]
struct GetOrder {
    id: u32,
}

#[derive(Debug, PartialEq)]
struct Order {
    id: u32,
    total: u64,
}

#[derive(Debug, thiserror::Error)]
#[error("repository failed")]
struct RepositoryError(#[source] std::io::Error);

async fn get_order(req: GetOrder) -> Result<Order, RpcFault> {
    Ok(Order { id: req.id, total: 1200 })
}

async fn missing_order(_: GetOrder) -> Result<Order, RpcFault> {
    Err(RpcStatus::new(RpcCode::NotFound, "order missing").into())
}

async fn broken_repository(_: GetOrder) -> Result<Order, RpcFault> {
    let cause = std::io::Error::other("connection reset");
    Err(RpcFault::Internal(Box::new(RepositoryError(cause))))
}

async fn exploding(_: GetOrder) -> Result<Order, RpcFault> {
    panic!("kaboom")
}

async fn call<F, Fut>(config: &AuditConfig, method: &str, handler: F) -> (Result<Order, RpcStatus>, Vec<LogRecord>)
where
    F: FnOnce(GetOrder) -> Fut,
    Fut: std::future::Future<Output = Result<Order, RpcFault>>,
{
    let (pipeline, recording, _) = common::recording_pipeline(config);
    let interceptor = RpcInterceptor::new(
        pipeline.logger("traffic_audit::interceptor"),
        AuditControls::new(&config.middleware),
    );

    let mut ctx = RpcCallContext::new(method);
    ctx.trace_id = "rpc-1".to_string();
    let result = interceptor.unary(ctx, GetOrder { id: 7 }, handler).await;
    pipeline.shutdown().await;
    (result, recording.records())
}

#[tokio::test]
async fn test_successful_call_records_request_and_response() {
    let (result, records) = call(&AuditConfig::default(), "/orders.Orders/Get", get_order).await;

    assert_eq!(result.unwrap(), Order { id: 7, total: 1200 });
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].text(), "REQUEST: RPC /orders.Orders/Get");
    assert_eq!(records[0].scope("Body"), Some("GetOrder { id: 7 }"));
    assert_eq!(records[0].scope("RpcMethod"), Some("/orders.Orders/Get"));
    assert_eq!(records[0].scope("TraceId"), Some("rpc-1"));
    assert_eq!(records[1].text(), "RESPONSE: 0:OK");
    assert_eq!(records[1].scope("Body"), Some("Order { id: 7, total: 1200 }"));
    assert_eq!(records[1].level(), LogLevel::Info);
}

#[tokio::test]
async fn test_domain_status_passes_through_unchanged() {
    let (result, records) = call(&AuditConfig::default(), "/orders.Orders/Get", missing_order).await;

    let status = result.unwrap_err();
    assert_eq!(status.code, RpcCode::NotFound);
    assert_eq!(status.detail, "order missing");

    assert_eq!(records[1].text(), "RESPONSE: 5:NotFound - order missing");
    assert_eq!(records[1].level(), LogLevel::Error);
}

#[tokio::test]
async fn test_unexpected_error_becomes_internal_with_root_cause() {
    let (result, records) = call(&AuditConfig::default(), "/orders.Orders/Get", broken_repository).await;

    let status = result.unwrap_err();
    assert_eq!(status.code, RpcCode::Internal);
    assert_eq!(status.detail, "connection reset");
    assert_eq!(
        records[1].exception().map(|e| e.message()),
        Some("connection reset")
    );
}

#[tokio::test]
async fn test_handler_panic_becomes_internal() {
    let (result, records) = call(&AuditConfig::default(), "/orders.Orders/Get", exploding).await;

    let status = result.unwrap_err();
    assert_eq!(status.code, RpcCode::Internal);
    assert_eq!(status.detail, "kaboom");
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].exception().map(|e| e.kind()), Some("panic"));
}

#[tokio::test]
async fn test_secured_method_redacts_messages() {
    let mut config = AuditConfig::default();
    config.middleware.security_actions = vec![ActionRule::new("rpc", "/orders.Orders/Get")];
    let (_, records) = call(&config, "/orders.Orders/Get", get_order).await;

    assert_eq!(records[0].scope("Body"), Some(REDACTED_BODY));
    assert_eq!(records[1].scope("Body"), Some(REDACTED_BODY));
}

#[tokio::test]
async fn test_ignored_method_is_not_recorded() {
    let mut config = AuditConfig::default();
    config.middleware.ignore_actions = vec![ActionRule::new("RPC", "/grpc.health.v1.Health/Check")];
    let (result, records) = call(&config, "/grpc.health.v1.Health/Check", get_order).await;

    assert!(result.is_ok());
    assert!(records.is_empty());
}
