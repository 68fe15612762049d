#![allow(dead_code)]

use chirpy::auth::MIN_HASH_COST;
use chirpy::configuration::{
    ApplicationSettings, AuthSettings, DatabaseSettings, Settings, WebhookSettings,
};
use chirpy::startup::{run, Stores};
use chirpy::store::MemoryStore;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;

pub const SECRET: &str = "integration-test-secret";
pub const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

pub fn test_settings(platform: &str) -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "unused".to_string(),
            password: "unused".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "unused".to_string(),
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            platform: platform.to_string(),
        },
        auth: AuthSettings {
            secret: SECRET.to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 60 * 24 * 3600,
            hash_cost: MIN_HASH_COST,
        },
        webhooks: WebhookSettings {
            polka_key: POLKA_KEY.to_string(),
        },
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_settings("dev"))
}

pub fn spawn_app_with(settings: Settings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let stores = Stores::from_backend(Arc::new(MemoryStore::new()));
    let server = run(listener, stores, settings).expect("Failed to create server");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Registers and logs in, returning the login body
    pub async fn signed_in(&self, email: &str, password: &str) -> Value {
        assert_eq!(201, self.register(email, password).await.status().as_u16());
        let response = self.login(email, password).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

pub fn str_field<'a>(body: &'a Value, field: &str) -> &'a str {
    body.get(field)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("missing string field {}", field))
}
