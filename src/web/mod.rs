use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use salvo::affix_state;
use salvo::prelude::*;
use tracing::info;

use crate::bridge::BridgeCore;
use crate::config::WebConfig;

pub mod handlers;

use self::handlers::health::{get_status, health_check};

#[derive(Clone)]
pub struct WebState {
    pub bridge: Arc<BridgeCore>,
    pub started_at: Instant,
}

pub fn create_router(state: WebState) -> Router {
    Router::new()
        .hoop(affix_state::inject(state))
        .push(Router::with_path("health").get(health_check))
        .push(Router::with_path("status").get(get_status))
}

#[derive(Clone)]
pub struct WebServer {
    config: WebConfig,
    state: WebState,
}

impl WebServer {
    pub fn new(config: WebConfig, bridge: Arc<BridgeCore>) -> Self {
        Self {
            config,
            state: WebState {
                bridge,
                started_at: Instant::now(),
            },
        }
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!("{}:{}", self.config.bind_address, self.config.port);
        info!("Starting status server on {}", bind_addr);

        let acceptor = TcpListener::new(bind_addr).bind().await;
        Server::new(acceptor)
            .serve(create_router(self.state.clone()))
            .await;

        Ok(())
    }
}
