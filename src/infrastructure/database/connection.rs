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

use crate::config::settings::DatabaseSettings;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::info;

/// 按配置生成连接选项，未配置的项沿用 sea-orm 默认值
fn connect_options(settings: &DatabaseSettings) -> ConnectOptions {
    let mut opt = ConnectOptions::new(settings.url.to_owned());

    if let Some(max) = settings.max_connections {
        opt.max_connections(max);
    }
    if let Some(min) = settings.min_connections {
        opt.min_connections(min);
    }
    if let Some(timeout) = settings.connect_timeout.map(Duration::from_secs) {
        opt.connect_timeout(timeout).acquire_timeout(timeout);
    }
    if let Some(idle) = settings.idle_timeout {
        opt.idle_timeout(Duration::from_secs(idle));
    }
    if let Some(lifetime) = settings.max_lifetime {
        opt.max_lifetime(Duration::from_secs(lifetime));
    }
    opt.sqlx_logging(settings.sqlx_logging);

    opt
}

/// 创建保存Webhook和投递任务的数据库连接池
///
/// # 参数
///
/// * `settings` - 数据库配置
///
/// # 返回值
///
/// * `Ok(DatabaseConnection)` - 数据库连接
/// * `Err(DbErr)` - 连接过程中出现的错误
pub async fn create_pool(settings: &DatabaseSettings) -> Result<DatabaseConnection, DbErr> {
    let opt = connect_options(settings);
    info!(
        max_connections = ?settings.max_connections,
        sqlx_logging = settings.sqlx_logging,
        "Connecting to hook store"
    );
    Database::connect(opt).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DatabaseSettings {
        DatabaseSettings {
            url: "sqlite::memory:".to_string(),
            max_connections: Some(1),
            min_connections: None,
            connect_timeout: Some(5),
            idle_timeout: None,
            max_lifetime: Some(120),
            sqlx_logging: false,
        }
    }

    #[test]
    fn test_options_follow_settings() {
        let opt = connect_options(&settings());
        assert_eq!(opt.get_max_connections(), Some(1));
        assert_eq!(opt.get_connect_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(opt.get_max_lifetime(), Some(Duration::from_secs(120)));
        assert!(!opt.get_sqlx_logging());
    }

    #[tokio::test]
    async fn test_create_pool_sqlite_memory() {
        let db = create_pool(&settings()).await.unwrap();
        assert!(db.ping().await.is_ok());
    }
}
