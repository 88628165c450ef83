use salvo::prelude::*;
use serde_json::json;

use crate::web::WebState;

fn render_error(res: &mut Response, status: StatusCode, message: &str) {
    res.status_code(status);
    res.render(Json(json!({ "error": message })));
}

#[handler]
pub async fn health_check(res: &mut Response) {
    res.render(Json(json!({ "status": "ok" })));
}

#[handler]
pub async fn get_status(depot: &mut Depot, res: &mut Response) {
    let Ok(state) = depot.obtain::<WebState>() else {
        render_error(res, StatusCode::INTERNAL_SERVER_ERROR, "web state missing");
        return;
    };

    let db = state.bridge.db();
    let credentials = db.credential_store().count_credentials().await;
    let thread_links = db.thread_store().count_links().await;
    let (credentials, thread_links) = match (credentials, thread_links) {
        (Ok(credentials), Ok(thread_links)) => (credentials, thread_links),
        (Err(err), _) | (_, Err(err)) => {
            render_error(
                res,
                StatusCode::INTERNAL_SERVER_ERROR,
                &format!("database error: {}", err),
            );
            return;
        }
    };

    res.render(Json(json!({
        "status": "running",
        "uptime_seconds": state.started_at.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "credentials": credentials,
        "thread_links": thread_links,
        "relay": state.bridge.stats(),
    })));
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use async_trait::async_trait;
    use salvo::prelude::*;
    use salvo::test::{ResponseExt, TestClient};
    use secrecy::SecretString;
    use serde_json::Value;
    use tempfile::NamedTempFile;

    use crate::bridge::BridgeCore;
    use crate::config::DatabaseConfig;
    use crate::db::{DatabaseManager, ThreadLink};
    use crate::notion::{NotionApi, NotionError};
    use crate::web::{WebState, create_router};

    struct UnreachableNotion;

    #[async_trait]
    impl NotionApi for UnreachableNotion {
        async fn create_record(
            &self,
            _secret: &SecretString,
            _collection_id: &str,
            _title: &str,
        ) -> Result<String, NotionError> {
            Err(NotionError::Network("offline".to_string()))
        }

        async fn retrieve_record(
            &self,
            _secret: &SecretString,
            _record_id: &str,
        ) -> Result<bool, NotionError> {
            Err(NotionError::Network("offline".to_string()))
        }

        async fn append_child(
            &self,
            _secret: &SecretString,
            _record_id: &str,
            _text: &str,
        ) -> Result<(), NotionError> {
            Err(NotionError::Network("offline".to_string()))
        }
    }

    async fn service(file: &NamedTempFile) -> (Service, Arc<BridgeCore>) {
        let config = DatabaseConfig {
            url: None,
            filename: file.path().to_string_lossy().to_string(),
            busy_timeout_ms: 5000,
        };
        let manager = DatabaseManager::new(&config).await.expect("db manager");
        manager.migrate().await.expect("migrate");
        let bridge = Arc::new(BridgeCore::new(
            Arc::new(manager),
            Arc::new(UnreachableNotion),
        ));

        let router = create_router(WebState {
            bridge: bridge.clone(),
            started_at: Instant::now(),
        });
        (Service::new(router), bridge)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let (service, _) = service(&file).await;

        let mut res = TestClient::get("http://127.0.0.1:9006/health")
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        let body: Value = res.take_json().await.expect("json body");
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn status_reports_counts_and_relay_stats() {
        let file = NamedTempFile::new().expect("temp sqlite file");
        let (service, bridge) = service(&file).await;
        bridge.set_collection(1, "db1").await.expect("collection");
        bridge.set_secret(1, "s1").await.expect("secret");
        bridge.set_secret(2, "s2").await.expect("secret");
        bridge
            .db()
            .thread_store()
            .put_link(&ThreadLink::new(1, 10, "r1"))
            .await
            .expect("link");

        let request = crate::bridge::RelayRequest {
            entry_text: "note".to_string(),
            chat_id: 1,
            message_id: 11,
            reply_to_message_id: None,
        };
        assert!(!bridge.handle(&request).await.is_success());

        let mut res = TestClient::get("http://127.0.0.1:9006/status")
            .send(&service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        let body: Value = res.take_json().await.expect("json body");
        assert_eq!(body["status"], "running");
        assert_eq!(body["credentials"], 2);
        assert_eq!(body["thread_links"], 1);
        assert_eq!(body["relay"]["received"], 1);
        assert_eq!(body["relay"]["failed"], 1);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
