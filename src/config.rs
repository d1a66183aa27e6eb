use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub student_csv: PathBuf,
    pub map_csv: PathBuf,
    #[serde(default = "default_join_column_student")]
    pub join_column_student: String,
    #[serde(default = "default_join_column_map")]
    pub join_column_map: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Marker diameter given to the largest total on the map.
    #[serde(default = "default_size_max")]
    pub size_max: f64,
    #[serde(default = "default_male")]
    pub male: CategoryConfig,
    #[serde(default = "default_female")]
    pub female: CategoryConfig,
    #[serde(default = "default_total")]
    pub total: CategoryConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CategoryConfig {
    pub name: String,
    pub color: String, // Hex code
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    pub static_dir: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            size_max: default_size_max(),
            male: default_male(),
            female: default_female(),
            total: default_total(),
        }
    }
}

fn default_join_column_student() -> String {
    "schools_province".to_string()
}

fn default_join_column_map() -> String {
    "province".to_string()
}

fn default_size_max() -> f64 {
    30.0
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn category(name: &str, color: &str) -> CategoryConfig {
    CategoryConfig {
        name: name.to_string(),
        color: color.to_string(),
    }
}

fn default_male() -> CategoryConfig {
    category("ชาย", "#1f77b4")
}

fn default_female() -> CategoryConfig {
    category("หญิง", "#ff7f0e")
}

fn default_total() -> CategoryConfig {
    category("รวม", "#2ca02c")
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
