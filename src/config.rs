//! Externally supplied settings for the reservation form.
//!
//! Defaults mirror the clinic deployment. A JSON file named by
//! `RESERVATION_CONFIG` is layered on top, then individual environment
//! variables override the values operators change most often.

use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::common::Source;
use crate::models::menu::{MenuItem, VisitTypes};
use crate::models::reservation::VisitType;
use crate::services::validation::{Field, Rule};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },
    #[error("invalid business hours: {0}")]
    BusinessHours(String),
    #[error("availableDays must be at least 1")]
    NoSelectableDays,
    #[error("invalid menu catalog: {0}")]
    Menu(String),
    #[error("no error message configured for {field}.{rule}")]
    MissingMessage { field: Field, rule: Rule },
}

// Opening window used to build the slot list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessHours {
    pub start_hour: u32,
    pub end_hour: u32,
    /// Minutes between slots
    pub interval: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 18,
            interval: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationRules {
    pub name_max_length: usize,
    pub phone_min_digits: usize,
    pub phone_max_digits: usize,
    pub symptom_note_max_length: usize,
    pub memo_max_length: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            name_max_length: 50,
            phone_min_digits: 10,
            phone_max_digits: 11,
            symptom_note_max_length: 200,
            memo_max_length: 200,
        }
    }
}

/// Message table keyed by field and violated rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorMessages(BTreeMap<Field, BTreeMap<Rule, String>>);

impl ErrorMessages {
    pub fn get(&self, field: Field, rule: Rule) -> Option<&str> {
        self.0
            .get(&field)
            .and_then(|rules| rules.get(&rule))
            .map(String::as_str)
    }

    // Falls back to "field.rule" so a gap in the table never hides an error
    pub fn message(&self, field: Field, rule: Rule) -> String {
        match self.get(field, rule) {
            Some(message) => message.to_string(),
            None => {
                warn!("No message configured for {}.{}", field, rule);
                format!("{}.{}", field, rule)
            }
        }
    }

    pub fn set(&mut self, field: Field, rule: Rule, message: impl Into<String>) {
        self.0.entry(field).or_default().insert(rule, message.into());
    }

    /// Every (field, rule) pair the validator can report must have a message.
    pub fn ensure_complete(&self) -> Result<(), ConfigError> {
        for field in Field::ALL {
            for rule in field.rules() {
                if self.get(field, *rule).is_none() {
                    return Err(ConfigError::MissingMessage { field, rule: *rule });
                }
            }
        }
        Ok(())
    }
}

impl Default for ErrorMessages {
    fn default() -> Self {
        let mut messages = ErrorMessages(BTreeMap::new());
        messages.set(Field::VisitType, Rule::Required, "来院区分を選択してください");
        messages.set(Field::Name, Rule::Required, "お名前を入力してください");
        messages.set(Field::Name, Rule::MaxLength, "お名前は50文字以内で入力してください");
        messages.set(Field::Phone, Rule::Required, "電話番号を入力してください");
        messages.set(
            Field::Phone,
            Rule::Pattern,
            "電話番号は数字とハイフンのみで入力してください",
        );
        messages.set(Field::Phone, Rule::Length, "電話番号は10〜11桁で入力してください");
        messages.set(
            Field::SymptomNote,
            Rule::MaxLength,
            "お悩みや症状は200文字以内で入力してください",
        );
        messages.set(Field::Memo, Rule::MaxLength, "連絡事項は200文字以内で入力してください");
        messages.set(Field::Menu, Rule::Required, "施術メニューを選択してください");
        messages.set(Field::Date, Rule::Required, "希望日を選択してください");
        messages.set(Field::Time, Rule::Required, "希望時間を選択してください");
        messages
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormConfig {
    pub webhook_url: String,
    pub liff_id: String,
    pub header_title: String,
    pub default_source: Source,
    pub business_hours: BusinessHours,
    /// How many days, starting today, can be picked
    pub available_days: u32,
    pub first_visit_menu: MenuItem,
    pub treatment_menus: Vec<MenuItem>,
    pub visit_types: VisitTypes,
    pub validation_rules: ValidationRules,
    pub error_messages: ErrorMessages,
    pub availability_api_url: String,
    pub enable_availability_check: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            webhook_url: "https://your-n8n-instance.com/webhook/reservation".to_string(),
            liff_id: String::new(),
            header_title: "ご予約".to_string(),
            default_source: Source::Richmenu,
            business_hours: BusinessHours::default(),
            available_days: 7,
            first_visit_menu: MenuItem::new(
                "first_consult",
                "相談して決めたい",
                60,
                "初めての方は、まずご相談ください",
            ),
            treatment_menus: vec![
                MenuItem::new("shoulder", "肩こり", 30, "肩や首のこり・痛みの改善"),
                MenuItem::new("back", "腰痛", 30, "腰の痛み・重さの改善"),
                MenuItem::new("posture", "姿勢矯正", 45, "猫背や姿勢の乱れを改善"),
                MenuItem::new("postpartum", "産後骨盤", 45, "産後の骨盤ケア"),
                MenuItem::new("accident", "交通事故", 60, "交通事故によるケガの治療"),
                MenuItem::new("headache", "頭痛", 30, "頭痛・偏頭痛の改善"),
                MenuItem::new("sports", "スポーツ障害", 45, "スポーツによるケガや痛み"),
            ],
            visit_types: VisitTypes::default(),
            validation_rules: ValidationRules::default(),
            error_messages: ErrorMessages::default(),
            availability_api_url: String::new(),
            enable_availability_check: false,
        }
    }
}

impl FormConfig {
    /// Load configuration from `.env`, the optional JSON file and environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv().ok();

        let mut config = match env::var("RESERVATION_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => {
                info!("RESERVATION_CONFIG not set, using built-in form configuration");
                Self::default()
            }
        };

        config.apply_overrides(|name| env::var(name).ok())?;
        config.validate()?;

        info!(
            "Form configuration loaded: {} treatment menus, {} selectable days",
            config.treatment_menus.len(),
            config.available_days
        );
        Ok(config)
    }

    // Keys absent from the file keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Reading form configuration from {}", path.display());

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply the operator overrides. `var` looks a variable up by name.
    pub fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = var("WEBHOOK_URL") {
            debug!("Webhook URL overridden from environment");
            self.webhook_url = url;
        }

        if let Some(liff_id) = var("LIFF_ID") {
            self.liff_id = liff_id;
        }

        if let Some(source) = var("DEFAULT_SOURCE") {
            self.default_source = source
                .parse()
                .map_err(|reason| ConfigError::InvalidEnv {
                    name: "DEFAULT_SOURCE",
                    reason,
                })?;
        }

        if let Some(url) = var("AVAILABILITY_API_URL") {
            self.enable_availability_check = !url.trim().is_empty();
            self.availability_api_url = url;
        }

        if let Some(days) = var("AVAILABLE_DAYS") {
            self.available_days = days.trim().parse().map_err(|e| ConfigError::InvalidEnv {
                name: "AVAILABLE_DAYS",
                reason: format!("{}", e),
            })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let hours = &self.business_hours;
        if hours.end_hour > 24 {
            return Err(ConfigError::BusinessHours(format!(
                "endHour {} is past midnight",
                hours.end_hour
            )));
        }
        if hours.start_hour >= hours.end_hour {
            return Err(ConfigError::BusinessHours(format!(
                "startHour {} must be before endHour {}",
                hours.start_hour, hours.end_hour
            )));
        }
        if hours.interval == 0 {
            return Err(ConfigError::BusinessHours(
                "interval must be at least one minute".to_string(),
            ));
        }

        if self.available_days == 0 {
            return Err(ConfigError::NoSelectableDays);
        }

        let mut seen = HashSet::new();
        for menu in self.all_menus() {
            if menu.id.trim().is_empty() {
                return Err(ConfigError::Menu(format!("menu '{}' has an empty id", menu.name)));
            }
            if !seen.insert(menu.id.as_str()) {
                return Err(ConfigError::Menu(format!("duplicate menu id '{}'", menu.id)));
            }
        }

        self.error_messages.ensure_complete()
    }

    pub fn availability_enabled(&self) -> bool {
        self.enable_availability_check && !self.availability_api_url.trim().is_empty()
    }

    fn all_menus(&self) -> impl Iterator<Item = &MenuItem> {
        std::iter::once(&self.first_visit_menu).chain(self.treatment_menus.iter())
    }

    /// Menus offered for a visit type. The consult menu is only shown to first-time visitors.
    pub fn menus_for(&self, visit_type: VisitType) -> Vec<&MenuItem> {
        match visit_type {
            VisitType::First => self.all_menus().collect(),
            VisitType::Revisit => self.treatment_menus.iter().collect(),
        }
    }

    pub fn find_menu(&self, visit_type: VisitType, menu_id: &str) -> Option<&MenuItem> {
        self.menus_for(visit_type)
            .into_iter()
            .find(|menu| menu.id == menu_id)
    }

    pub fn is_known_menu(&self, menu_id: &str) -> bool {
        self.all_menus().any(|menu| menu.id == menu_id)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
