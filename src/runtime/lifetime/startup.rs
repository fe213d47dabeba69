use crate::cache::{ObjectCache, create_object_cache};
use crate::config::AppConfig;
use crate::errors::{CourseforgeError, Result};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::random_code::generate_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

/// 初始化默认管理员账号
/// 用户表为空时创建；口令取 ADMIN_PASSWORD，未设置则随机生成并打印一次
async fn seed_admin(storage: &Arc<dyn Storage>, password: Option<String>) -> Result<Option<i64>> {
    let count = storage.count_users().await?;
    if count > 0 {
        debug!("Database already has {} user(s), skipping admin seed", count);
        return Ok(None);
    }
    info!("No users found in database, creating default admin account...");

    let password = password.unwrap_or_else(|| {
        let pwd = generate_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    let admin = storage
        .create_user(CreateUserRequest {
            email: AppConfig::get().bootstrap.admin_email.trim().to_lowercase(),
            password: hash_password(&password)?,
            first_name: "System".into(),
            last_name: "Administrator".into(),
            role: UserRole::Admin,
        })
        .await?;

    info!(
        "Default admin account created (ID: {}, email: {})",
        admin.id, admin.email
    );
    Ok(Some(admin.id))
}

/// 准备服务器启动的上下文：存储（含迁移）、管理员种子、缓存
pub async fn prepare_server_startup() -> Result<StartupContext> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| {
            CourseforgeError::database_config("Failed to install rustls crypto provider")
        })?;

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    if let Err(e) = seed_admin(&storage, std::env::var("ADMIN_PASSWORD").ok()).await {
        warn!("Failed to seed admin account: {}", e.format_simple());
    }

    let cache = create_object_cache().await?;
    warn!("Cache backend initialized");

    Ok(StartupContext { storage, cache })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::utils::password::verify_password;

    #[tokio::test]
    async fn test_seed_admin_only_on_empty_table() {
        let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::in_memory().await);

        let id = seed_admin(&storage, Some("Adm1nSecret".into()))
            .await
            .unwrap()
            .unwrap();
        let admin = storage.get_user_by_id(id).await.unwrap().unwrap();
        assert!(admin.is_admin());
        assert!(verify_password("Adm1nSecret", &admin.password_hash));

        assert!(seed_admin(&storage, None).await.unwrap().is_none());
        assert_eq!(storage.count_users().await.unwrap(), 1);
    }
}
