// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use hookrs::config::settings::Settings;
use hookrs::infrastructure::database::connection;
use hookrs::infrastructure::repositories::hook_task_repo_impl::HookTaskRepoImpl;
use hookrs::infrastructure::repositories::webhook_repo_impl::WebhookRepoImpl;
use hookrs::presentation::routes;
use hookrs::utils::telemetry;
use hookrs::workers::DeliverySubsystem;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting hookrs...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // Initialize Prometheus Metrics
    hookrs::infrastructure::metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = Arc::new(connection::create_pool(&settings.database).await?);
    info!("Database connection established");

    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Start delivery subsystem
    let webhooks = Arc::new(WebhookRepoImpl::new(db.clone()));
    let tasks = Arc::new(HookTaskRepoImpl::new(db));
    let mut subsystem =
        DeliverySubsystem::new(webhooks, tasks, &settings.webhook, &settings.cleanup)?;
    subsystem.start().await?;

    // 5. Start HTTP server
    let app = routes::routes().layer(TraceLayer::new_for_http());
    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    subsystem.shutdown().await;
    info!("hookrs stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}
