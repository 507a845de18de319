use crate::core::finance::FeeSchedule;
use crate::core::ingest::StreamConfig;
use crate::core::transform::{SummaryConfig, DEFAULT_MAX_OBJECTS, DEFAULT_SUMMARY_COLUMNS};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    validate_path_segment, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Deployment configuration: tenants, their streams, and the fee schedule.
/// Vendor credentials are referenced as `${ENV_VAR}` placeholders so the
/// file itself stays secret-free.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    pub settings: Option<Settings>,
    #[serde(default)]
    pub fees: HashMap<String, f64>,
    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub data_dir: Option<String>,
    /// Payment methods that charge a flat $0.30 on top of their percentage.
    #[serde(default)]
    pub fee_flat_surcharge: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Woocommerce,
    Shopify,
    Shipstation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    pub name: String,
    pub platform: Platform,
    pub base_url: String,
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub access_token: Option<String>,
    pub authorization_key: Option<String>,
    pub store_id: Option<String>,
    pub api_version: Option<String>,
    #[serde(default)]
    pub streams: Vec<StreamSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSection {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub windowed: bool,
    pub page_size: u32,
    #[serde(default = "default_epoch_year")]
    pub epoch_year: i32,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_timestamp_field")]
    pub timestamp_field: String,
    #[serde(default)]
    pub pause_on_exhausted: bool,
    #[serde(default)]
    pub stop_at_present: bool,
    pub columns: Option<Vec<String>>,
    pub max_objects: Option<usize>,
}

fn default_epoch_year() -> i32 {
    2023
}

fn default_id_field() -> String {
    "id".to_string()
}

fn default_timestamp_field() -> String {
    "date_created".to_string()
}

impl EtlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| EtlError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn tenant(&self, name: &str) -> Result<&TenantConfig> {
        self.tenants
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| EtlError::ConfigError {
                message: format!("unknown tenant: {}", name),
            })
    }

    pub fn fee_schedule(&self) -> FeeSchedule {
        let surcharge = self
            .settings
            .as_ref()
            .map(|s| s.fee_flat_surcharge.clone())
            .unwrap_or_default();
        FeeSchedule::new(self.fees.clone()).with_flat_surcharge(surcharge)
    }

    pub fn data_dir(&self) -> &str {
        self.settings
            .as_ref()
            .and_then(|s| s.data_dir.as_deref())
            .unwrap_or("./data")
    }
}

impl TenantConfig {
    pub fn stream(&self, name: &str) -> Result<&StreamSection> {
        self.streams
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| EtlError::ConfigError {
                message: format!("tenant {} has no stream {}", self.name, name),
            })
    }
}

impl StreamSection {
    pub fn to_stream_config(&self, tenant: &TenantConfig) -> StreamConfig {
        StreamConfig {
            tenant: tenant.name.clone(),
            stream: self.name.clone(),
            category: self.category.clone(),
            windowed: self.windowed,
            page_size: self.page_size,
            epoch_year: self.epoch_year,
            id_field: self.id_field.clone(),
            timestamp_field: self.timestamp_field.clone(),
            pause_on_exhausted: self.pause_on_exhausted,
            stop_at_present: self.stop_at_present,
        }
    }

    pub fn to_summary_config(&self, tenant: &TenantConfig) -> SummaryConfig {
        SummaryConfig {
            tenant: tenant.name.clone(),
            stream: self.name.clone(),
            category: self.category.clone(),
            columns: self.columns.clone().unwrap_or_else(|| {
                DEFAULT_SUMMARY_COLUMNS
                    .iter()
                    .map(|c| c.to_string())
                    .collect()
            }),
            max_objects: self.max_objects.unwrap_or(DEFAULT_MAX_OBJECTS),
        }
    }
}

/// Replace `${VAR_NAME}` placeholders with environment values. Unset
/// variables keep the placeholder text, so validation can point at them.
fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

impl Validate for EtlConfig {
    fn validate(&self) -> Result<()> {
        for (method, rate) in &self.fees {
            validate_range(&format!("fees.{}", method), *rate, 0.0, 100.0)?;
        }

        for tenant in &self.tenants {
            validate_path_segment("tenants.name", &tenant.name)?;
            validate_url("tenants.base_url", &tenant.base_url)?;

            for stream in &tenant.streams {
                validate_path_segment("streams.name", &stream.name)?;
                validate_path_segment("streams.category", &stream.category)?;
                validate_range("streams.page_size", stream.page_size, 1, 100)?;
                validate_range("streams.epoch_year", stream.epoch_year, 2000, 2100)?;
            }
        }

        Ok(())
    }
}
