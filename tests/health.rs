use couture_fusion_api::routes::health::health;

#[tokio::test]
async fn health_reports_ok() {
    let response = health().await;
    assert_eq!(response.0.status, "ok");
    assert!(!response.0.version.is_empty());
}
