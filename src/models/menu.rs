use serde::{Deserialize, Serialize};

use crate::models::reservation::VisitType;

// A treatment that can be booked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub duration_min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MenuItem {
    pub fn new(id: &str, name: &str, duration_min: u32, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            duration_min,
            description: Some(description.to_string()),
        }
    }
}

// Display data for a visit type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitTypeInfo {
    pub name: String,
    pub description: String,
    pub default_duration: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitTypes {
    pub first: VisitTypeInfo,
    pub revisit: VisitTypeInfo,
}

impl VisitTypes {
    pub fn get(&self, visit_type: VisitType) -> &VisitTypeInfo {
        match visit_type {
            VisitType::First => &self.first,
            VisitType::Revisit => &self.revisit,
        }
    }
}

impl Default for VisitTypes {
    fn default() -> Self {
        Self {
            first: VisitTypeInfo {
                name: "初診".to_string(),
                description: "初めてご来院の方".to_string(),
                default_duration: 60,
            },
            revisit: VisitTypeInfo {
                name: "再診".to_string(),
                description: "2回目以降の方".to_string(),
                default_duration: 30,
            },
        }
    }
}
