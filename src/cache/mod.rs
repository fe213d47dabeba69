//! 对象缓存
//!
//! 插件在加载期通过 `declare_object_cache_plugin!` 注册，启动时按 `cache.type` 选择，
//! 构造失败时回退到进程内的 moka。仅缓存鉴权用户，不缓存选题等业务实体。

pub mod object_cache;
pub mod register;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::config::AppConfig;
use crate::errors::{CourseforgeError, Result};

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    /// 后端故障，无法判断键是否存在
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    /// ttl 为 0 时使用后端默认值
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

impl dyn ObjectCache {
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> CacheResult<T> {
        match self.get_raw(key).await {
            CacheResult::Found(json) => match serde_json::from_str(&json) {
                Ok(value) => CacheResult::Found(value),
                Err(_) => {
                    self.remove(key).await;
                    CacheResult::NotFound
                }
            },
            CacheResult::NotFound => CacheResult::NotFound,
            CacheResult::ExistsButNoValue => CacheResult::ExistsButNoValue,
        }
    }

    pub async fn insert_json<T: Serialize + Sync>(&self, key: String, value: &T, ttl: u64) {
        if let Ok(json) = serde_json::to_string(value) {
            self.insert_raw(key, json, ttl).await;
        }
    }
}

/// 注册插件的宏，在程序加载时执行
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:literal, $ty:ty) => {
        #[::ctor::ctor]
        fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                ::std::sync::Arc::new(|| {
                    Box::pin(async {
                        let cache = <$ty>::new()
                            .map_err($crate::errors::CourseforgeError::cache_connection)?;
                        Ok(Box::new(cache) as Box<dyn $crate::cache::ObjectCache>)
                    })
                }),
            );
        }
    };
}

/// 按配置构造缓存
pub async fn create_object_cache() -> Result<Arc<dyn ObjectCache>> {
    let config = AppConfig::get();
    register::debug_object_cache_registry();

    let wanted = config.cache.cache_type.as_str();
    let constructor = register::get_object_cache_plugin(wanted).ok_or_else(|| {
        CourseforgeError::cache_plugin_not_found(format!("Cache plugin '{wanted}' not registered"))
    });

    let built = match constructor {
        Ok(ctor) => ctor().await,
        Err(e) => Err(e),
    };

    match built {
        Ok(cache) => Ok(Arc::from(cache)),
        Err(e) if wanted != "moka" => {
            warn!("{}; falling back to in-memory moka cache", e.format_simple());
            let fallback = register::get_object_cache_plugin("moka").ok_or_else(|| {
                CourseforgeError::cache_plugin_not_found("Cache plugin 'moka' not registered")
            })?;
            Ok(Arc::from(fallback().await?))
        }
        Err(e) => Err(e),
    }
}
