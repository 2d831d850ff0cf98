use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::config::{ErrorMessages, FormConfig, ValidationRules};
use crate::models::reservation::{ReservationDraft, Step};

/// Form fields that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    VisitType,
    Menu,
    Date,
    Time,
    Name,
    Phone,
    SymptomNote,
    Memo,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::VisitType,
        Field::Menu,
        Field::Date,
        Field::Time,
        Field::Name,
        Field::Phone,
        Field::SymptomNote,
        Field::Memo,
    ];

    /// Rules the validator can report for this field, in evaluation order.
    pub fn rules(&self) -> &'static [Rule] {
        match self {
            Field::VisitType | Field::Menu | Field::Date | Field::Time => &[Rule::Required],
            Field::Name => &[Rule::Required, Rule::MaxLength],
            Field::Phone => &[Rule::Required, Rule::Pattern, Rule::Length],
            Field::SymptomNote | Field::Memo => &[Rule::MaxLength],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::VisitType => "visitType",
            Field::Menu => "menu",
            Field::Date => "date",
            Field::Time => "time",
            Field::Name => "name",
            Field::Phone => "phone",
            Field::SymptomNote => "symptomNote",
            Field::Memo => "memo",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("unknown field '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rule {
    Required,
    MaxLength,
    Pattern,
    Length,
}

impl Rule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::Required => "required",
            Rule::MaxLength => "maxLength",
            Rule::Pattern => "pattern",
            Rule::Length => "length",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one or more fields.
///
/// Holds at most one message per field: the first rule that field violated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    errors: BTreeMap<Field, String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &BTreeMap<Field, String> {
        &self.errors
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn insert(&mut self, field: Field, message: String) {
        self.errors.entry(field).or_insert(message);
    }

    pub fn clear(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    pub fn merge(&mut self, other: ValidationResult) {
        for (field, message) in other.errors {
            self.insert(field, message);
        }
    }
}

// Length in characters, not bytes, so multi-byte names count the way users see them
fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub fn check_required<T>(value: Option<T>) -> Result<(), Rule> {
    match value {
        Some(_) => Ok(()),
        None => Err(Rule::Required),
    }
}

pub fn check_name(value: &str, rules: &ValidationRules) -> Result<(), Rule> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Rule::Required);
    }
    if char_len(trimmed) > rules.name_max_length {
        return Err(Rule::MaxLength);
    }
    Ok(())
}

// required -> pattern -> length, first failure wins
pub fn check_phone(value: &str, rules: &ValidationRules) -> Result<(), Rule> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Rule::Required);
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return Err(Rule::Pattern);
    }
    let digits = trimmed.chars().filter(|c| *c != '-').count();
    if digits < rules.phone_min_digits || digits > rules.phone_max_digits {
        return Err(Rule::Length);
    }
    Ok(())
}

pub fn check_free_text(value: &str, max_length: usize) -> Result<(), Rule> {
    if char_len(value.trim()) > max_length {
        return Err(Rule::MaxLength);
    }
    Ok(())
}

/// Applies the configured rules to a draft and renders failures with the
/// configured message table.
pub struct Validator<'a> {
    rules: &'a ValidationRules,
    messages: &'a ErrorMessages,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a FormConfig) -> Self {
        Self {
            rules: &config.validation_rules,
            messages: &config.error_messages,
        }
    }

    pub fn from_parts(rules: &'a ValidationRules, messages: &'a ErrorMessages) -> Self {
        Self { rules, messages }
    }

    fn render(&self, field: Field, outcome: Result<(), Rule>) -> Result<(), String> {
        outcome.map_err(|rule| self.messages.message(field, rule))
    }

    pub fn validate_name(&self, name: &str) -> Result<(), String> {
        self.render(Field::Name, check_name(name, self.rules))
    }

    pub fn validate_phone(&self, phone: &str) -> Result<(), String> {
        self.render(Field::Phone, check_phone(phone, self.rules))
    }

    pub fn validate_symptom_note(&self, note: &str) -> Result<(), String> {
        self.render(
            Field::SymptomNote,
            check_free_text(note, self.rules.symptom_note_max_length),
        )
    }

    pub fn validate_memo(&self, memo: &str) -> Result<(), String> {
        self.render(Field::Memo, check_free_text(memo, self.rules.memo_max_length))
    }

    /// Checks a single field of the draft, e.g. when an input loses focus.
    pub fn validate_field(&self, field: Field, draft: &ReservationDraft) -> Result<(), String> {
        match field {
            Field::VisitType => self.render(field, check_required(draft.visit_type)),
            Field::Menu => self.render(field, check_required(draft.menu_id())),
            Field::Date => self.render(field, check_required(draft.selected_date)),
            Field::Time => self.render(field, check_required(draft.selected_time)),
            Field::Name => self.validate_name(&draft.customer_name),
            Field::Phone => self.validate_phone(&draft.phone),
            Field::SymptomNote => self.validate_symptom_note(&draft.symptom_note),
            Field::Memo => self.validate_memo(&draft.memo),
        }
    }

    fn validate_fields(&self, fields: &[Field], draft: &ReservationDraft) -> ValidationResult {
        let mut result = ValidationResult::new();
        for field in fields {
            if let Err(message) = self.validate_field(*field, draft) {
                result.insert(*field, message);
            }
        }
        result
    }

    pub fn validate_step1(&self, draft: &ReservationDraft) -> ValidationResult {
        self.validate_fields(&[Field::VisitType, Field::Menu], draft)
    }

    pub fn validate_step2(&self, draft: &ReservationDraft) -> ValidationResult {
        self.validate_fields(&[Field::Date, Field::Time], draft)
    }

    pub fn validate_step3(&self, draft: &ReservationDraft) -> ValidationResult {
        self.validate_fields(
            &[Field::Name, Field::Phone, Field::SymptomNote, Field::Memo],
            draft,
        )
    }

    // Steps without inputs (confirmation, terminal states) always pass
    pub fn validate_step(&self, step: Step, draft: &ReservationDraft) -> ValidationResult {
        match step {
            Step::MenuSelection => self.validate_step1(draft),
            Step::DateTime => self.validate_step2(draft),
            Step::CustomerInfo => self.validate_step3(draft),
            _ => ValidationResult::new(),
        }
    }

    pub fn validate_all(&self, draft: &ReservationDraft) -> ValidationResult {
        let mut result = self.validate_step1(draft);
        result.merge(self.validate_step2(draft));
        result.merge(self.validate_step3(draft));
        result
    }

    /// Current and maximum character count for a free-text field.
    pub fn char_count(&self, field: Field, draft: &ReservationDraft) -> Option<(usize, usize)> {
        match field {
            Field::SymptomNote => Some((
                char_len(&draft.symptom_note),
                self.rules.symptom_note_max_length,
            )),
            Field::Memo => Some((char_len(&draft.memo), self.rules.memo_max_length)),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod validation_test;
