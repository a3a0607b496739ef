use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

/// Параметры расчётного контура
#[derive(Debug, Deserialize, Clone)]
pub struct SettlementConfig {
    /// Окно удержания после вручения, дней (покрывает окно возврата)
    #[serde(default = "default_hold_days")]
    pub hold_days: i64,
    /// Автовозврат по спору, если магазин молчит N дней
    #[serde(default = "default_dispute_days")]
    pub dispute_auto_refund_days: i64,
    /// Автовозврат по открытой жалобе, если магазин молчит N дней
    #[serde(default = "default_complaint_days")]
    pub complaint_auto_refund_days: i64,
    /// Комиссия платформы по умолчанию, % (если строка её не задаёт)
    #[serde(default = "default_fee_pct")]
    pub platform_fee_percentage_default: f64,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            hold_days: default_hold_days(),
            dispute_auto_refund_days: default_dispute_days(),
            complaint_auto_refund_days: default_complaint_days(),
            platform_fee_percentage_default: default_fee_pct(),
        }
    }
}

fn default_port() -> u16 {
    3000
}
fn default_hold_days() -> i64 {
    7
}
fn default_dispute_days() -> i64 {
    3
}
fn default_complaint_days() -> i64 {
    2
}
fn default_fee_pct() -> f64 {
    5.0
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/app.db"

[server]
port = 3000

[settlement]
hold_days = 7
dispute_auto_refund_days = 3
complaint_auto_refund_days = 2
platform_fee_percentage_default = 5.0
"#;

static SETTLEMENT_CONFIG: OnceCell<SettlementConfig> = OnceCell::new();

/// Зафиксировать параметры расчётного контура на время работы процесса
pub fn init_settlement_config(config: SettlementConfig) {
    let _ = SETTLEMENT_CONFIG.set(config);
}

/// Параметры расчётного контура; до инициализации действуют значения
/// по умолчанию (hold 7 дней, таймеры 3/2 дня, комиссия 5%)
pub fn settlement_config() -> SettlementConfig {
    SETTLEMENT_CONFIG.get().cloned().unwrap_or_default()
}

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let resolved_path = exe_dir.join(db_path);
            return Ok(resolved_path);
        }
    }

    // Fallback: use relative to current directory
    Ok(PathBuf::from(db_path_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.database.path, "target/db/app.db");
        assert_eq!(config.settlement.hold_days, 7);
        assert_eq!(config.settlement.dispute_auto_refund_days, 3);
        assert_eq!(config.settlement.complaint_auto_refund_days, 2);
    }

    #[test]
    fn test_settlement_section_optional() {
        let config: Config = toml::from_str("[database]\npath = \"x.db\"\n").unwrap();
        assert_eq!(config.settlement.hold_days, 7);
        assert_eq!(config.server.port, 3000);
    }
}
