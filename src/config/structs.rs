//! 配置结构
//!
//! 与 `config.toml` 的分节一一对应；`workflow` 与 `bootstrap` 是选题服务特有的两节。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub workflow: WorkflowConfig,
    pub bootstrap: BootstrapConfig,
    pub jwt: JwtConfig,
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub cors: CorsConfig,
    pub argon2: Argon2Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub system_name: String,
    /// development | production
    pub environment: String,
    pub log_level: String,
}

/// HTTP 监听与连接参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 非空时改为监听 Unix 套接字
    pub unix_socket_path: String,
    /// 0 表示按 CPU 核数，且不超过 max_workers
    pub workers: usize,
    pub max_workers: usize,
    pub max_payload_bytes: usize,
    pub http: HttpTimeouts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpTimeouts {
    pub request_ms: u64,
    pub disconnect_ms: u64,
    pub keep_alive_secs: u64,
}

/// 选题流程参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// 单次存储调用的截止时间（毫秒），超时按 Timeout 上报
    pub operation_timeout_ms: u64,
    /// 每个客户端每分钟可发起的选题请求数
    pub enroll_requests_per_minute: u32,
}

/// 空库启动时创建的管理员；口令来自 ADMIN_PASSWORD 或随机生成
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub admin_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(skip_serializing, default)]
    pub secret: String,
    /// 分钟
    pub access_token_expiry: i64,
    /// 天
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 由 scheme 或文件后缀推断 SQLite / PostgreSQL / MySQL
    pub url: String,
    pub pool_size: u32,
    /// 秒
    pub timeout: u64,
}

/// 认证用户缓存；moka 为进程内，redis 连接失败时回退到 moka
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    pub cache_type: String,
    pub default_ttl: u64,
    pub redis: RedisConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub key_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub max_capacity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 为空时允许任意来源
    pub allowed_origins: Vec<String>,
    pub max_age: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Argon2Config {
    /// KiB
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}
