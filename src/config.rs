use crate::service::color::DEFAULT_PALETTE;
use crate::service::totals::CurrencyRate;
use bigdecimal::BigDecimal;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    /// 草稿读写的超时时间
    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    /// 父商品分组颜色
    pub palette: Vec<String>,
    /// 第一个为主币种
    pub currencies: Vec<CurrencyConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    pub code: String,
    pub symbol: String,
    pub rate: f64,
    pub decimals: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

fn default_max_connections() -> u32 {
    20
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

fn default_statement_timeout_secs() -> u64 {
    30
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect(),
            currencies: vec![
                CurrencyConfig { code: "CNY".to_string(), symbol: "¥".to_string(), rate: 1.0, decimals: 2 },
                CurrencyConfig { code: "USD".to_string(), symbol: "$".to_string(), rate: 0.14, decimals: 2 },
                CurrencyConfig { code: "JPY".to_string(), symbol: "￥".to_string(), rate: 20.27, decimals: 0 },
            ],
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/invoice_editor".to_string(),
                max_connections: default_max_connections(),
                acquire_timeout_secs: default_acquire_timeout_secs(),
                statement_timeout_secs: default_statement_timeout_secs(),
            },
            editor: EditorConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// 加载配置: 默认值 -> invoice-editor.toml (可选) -> APP__ 前缀环境变量
    /// -> DATABASE_URL / SERVER_HOST / SERVER_PORT
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Config::try_from(&AppConfig::default())?;

        let mut builder = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("invoice-editor").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"));

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", url)?;
        }
        if let Ok(host) = std::env::var("SERVER_HOST") {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            builder = builder.set_override("server.port", port as i64)?;
        }

        builder.build()?.try_deserialize()
    }

    /// 币种配置转为换算规则, 无法表示的汇率跳过
    pub fn currency_rates(&self) -> Vec<CurrencyRate> {
        self.editor
            .currencies
            .iter()
            .filter_map(|c| match BigDecimal::from_str(&c.rate.to_string()) {
                Ok(rate) => Some(CurrencyRate {
                    code: c.code.clone(),
                    symbol: c.symbol.clone(),
                    rate,
                    decimals: c.decimals,
                }),
                Err(e) => {
                    tracing::warn!("币种 {} 汇率 {} 无效: {}", c.code, c.rate, e);
                    None
                }
            })
            .collect()
    }

    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(&self.log.level).unwrap_or(tracing::Level::INFO)
    }
}
