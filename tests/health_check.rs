//! Integration tests for the chirpy server

mod common;

use common::{spawn_app, spawn_app_with, test_settings};

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app();

    let response = app
        .client
        .get(app.url("/api/healthz"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn static_index_is_served() {
    let app = spawn_app();

    let response = app
        .client
        .get(app.url("/app/"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert!(response.text().await.unwrap().contains("Welcome to Chirpy"));
}

#[tokio::test]
async fn reset_wipes_users_on_dev() {
    let app = spawn_app();
    app.signed_in("alice@example.com", "s3cr3t!").await;

    let response = app
        .client
        .post(app.url("/admin/reset"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(200, response.status().as_u16());

    // Gone: the same email can register again
    assert_eq!(201, app.register("alice@example.com", "s3cr3t!").await.status().as_u16());
}

#[tokio::test]
async fn reset_is_refused_outside_dev() {
    let app = spawn_app_with(test_settings("prod"));
    app.signed_in("alice@example.com", "s3cr3t!").await;

    let response = app
        .client
        .post(app.url("/admin/reset"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(403, response.status().as_u16());

    assert_eq!(409, app.register("alice@example.com", "s3cr3t!").await.status().as_u16());
}
