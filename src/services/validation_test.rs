use crate::config::{ErrorMessages, FormConfig, ValidationRules};
use crate::models::reservation::{ReservationDraft, Step, VisitType};
use crate::services::validation::{
    check_free_text, check_name, check_phone, Field, Rule, Validator,
};
use crate::tests::fixtures::{complete_draft, test_config};

#[test]
fn test_phone_pattern_rejects_foreign_characters() {
    let rules = ValidationRules::default();

    for phone in [
        "090-1234-567a",
        "090 1234 5678",
        "+81-90-1234-5678",
        "(03)1234-5678",
        "０９０１２３４５６７８", // full-width digits
        "090.1234.5678",
    ] {
        assert_eq!(check_phone(phone, &rules), Err(Rule::Pattern), "{}", phone);
    }
}

#[test]
fn test_phone_digit_count() {
    let rules = ValidationRules::default();

    // 10 and 11 digits pass, hyphens don't count
    assert_eq!(check_phone("03-1234-5678", &rules), Ok(()));
    assert_eq!(check_phone("0312345678", &rules), Ok(()));
    assert_eq!(check_phone("090-1234-5678", &rules), Ok(()));
    assert_eq!(check_phone("0-9-0-1-2-3-4-5-6-7-8", &rules), Ok(()));

    assert_eq!(check_phone("12345", &rules), Err(Rule::Length));
    assert_eq!(check_phone("090-1234-567", &rules), Ok(()));
    assert_eq!(check_phone("090-123-456", &rules), Err(Rule::Length));
    assert_eq!(check_phone("090-1234-56789", &rules), Err(Rule::Length));
    assert_eq!(check_phone("----------", &rules), Err(Rule::Length));
}

#[test]
fn test_phone_required_before_pattern() {
    let rules = ValidationRules::default();
    assert_eq!(check_phone("", &rules), Err(Rule::Required));
    assert_eq!(check_phone("   ", &rules), Err(Rule::Required));
    // Surrounding whitespace is trimmed before the pattern check
    assert_eq!(check_phone(" 090-1234-5678 ", &rules), Ok(()));
}

#[test]
fn test_name_rules() {
    let rules = ValidationRules::default();

    assert_eq!(check_name("", &rules), Err(Rule::Required));
    assert_eq!(check_name(" \t ", &rules), Err(Rule::Required));
    assert_eq!(check_name("山田太郎", &rules), Ok(()));

    // Length is counted in characters after trimming
    let fifty = "あ".repeat(50);
    assert_eq!(check_name(&fifty, &rules), Ok(()));
    assert_eq!(check_name(&format!("  {}  ", fifty), &rules), Ok(()));
    assert_eq!(check_name(&"あ".repeat(51), &rules), Err(Rule::MaxLength));
}

#[test]
fn test_free_text_is_optional_but_bounded() {
    assert_eq!(check_free_text("", 200), Ok(()));
    assert_eq!(check_free_text(&"x".repeat(200), 200), Ok(()));
    assert_eq!(check_free_text(&format!("  {}\n", "痛".repeat(200)), 200), Ok(()));
    assert_eq!(check_free_text(&"x".repeat(201), 200), Err(Rule::MaxLength));
}

#[test]
fn test_validate_step3_missing_name() {
    let config = FormConfig::default();
    let validator = Validator::new(&config);

    let draft = ReservationDraft {
        customer_name: String::new(),
        phone: "090-1234-5678".to_string(),
        ..ReservationDraft::default()
    };

    let result = validator.validate_step3(&draft);
    assert!(!result.is_valid());
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.error(Field::Name), Some("お名前を入力してください"));
}

#[test]
fn test_validate_step3_short_phone() {
    let config = FormConfig::default();
    let validator = Validator::new(&config);

    let draft = ReservationDraft {
        customer_name: "山田太郎".to_string(),
        phone: "12345".to_string(),
        ..ReservationDraft::default()
    };

    let result = validator.validate_step3(&draft);
    assert!(!result.is_valid());
    assert_eq!(result.errors().len(), 1);
    assert_eq!(
        result.error(Field::Phone),
        Some("電話番号は10〜11桁で入力してください")
    );
}

#[test]
fn test_validate_step3_collects_every_field() {
    let config = FormConfig::default();
    let validator = Validator::new(&config);

    let draft = ReservationDraft {
        customer_name: "名".repeat(60),
        phone: "abc".to_string(),
        symptom_note: "x".repeat(201),
        memo: "y".repeat(201),
        ..ReservationDraft::default()
    };

    let result = validator.validate_step3(&draft);
    let fields: Vec<Field> = result.errors().keys().copied().collect();
    assert_eq!(
        fields,
        vec![Field::Name, Field::Phone, Field::SymptomNote, Field::Memo]
    );
    assert_eq!(
        result.error(Field::Phone),
        Some("電話番号は数字とハイフンのみで入力してください")
    );
}

#[test]
fn test_validate_step1() {
    let config = FormConfig::default();
    let validator = Validator::new(&config);

    let empty = ReservationDraft::default();
    let result = validator.validate_step1(&empty);
    assert_eq!(result.error(Field::VisitType), Some("来院区分を選択してください"));
    assert_eq!(result.error(Field::Menu), Some("施術メニューを選択してください"));

    let visit_only = ReservationDraft {
        visit_type: Some(VisitType::First),
        ..ReservationDraft::default()
    };
    let result = validator.validate_step1(&visit_only);
    assert_eq!(result.errors().len(), 1);
    assert!(result.error(Field::Menu).is_some());
}

#[test]
fn test_validate_step2() {
    let config = FormConfig::default();
    let validator = Validator::new(&config);

    let result = validator.validate_step2(&ReservationDraft::default());
    assert_eq!(result.error(Field::Date), Some("希望日を選択してください"));
    assert_eq!(result.error(Field::Time), Some("希望時間を選択してください"));

    let result = validator.validate_step2(&complete_draft());
    assert!(result.is_valid());
}

#[test]
fn test_validate_all_is_union_of_steps() {
    let config = test_config();
    let validator = Validator::new(&config);

    assert!(validator.validate_all(&complete_draft()).is_valid());

    let mut draft = complete_draft();
    draft.menu = None;
    draft.selected_time = None;
    draft.phone = "0120".to_string();

    let result = validator.validate_all(&draft);
    let fields: Vec<Field> = result.errors().keys().copied().collect();
    assert_eq!(fields, vec![Field::Menu, Field::Time, Field::Phone]);

    // Steps without inputs never block
    assert!(validator.validate_step(Step::Confirm, &draft).is_valid());
}

#[test]
fn test_messages_come_from_configuration() {
    let rules = ValidationRules {
        name_max_length: 5,
        ..ValidationRules::default()
    };
    let mut messages = ErrorMessages::default();
    messages.set(Field::Name, Rule::MaxLength, "name too long");

    let validator = Validator::from_parts(&rules, &messages);
    assert_eq!(
        validator.validate_name("abcdef"),
        Err("name too long".to_string())
    );
    assert_eq!(validator.validate_name("abcde"), Ok(()));
}

#[test]
fn test_field_rules_and_names() {
    assert_eq!(Field::Phone.rules(), &[Rule::Required, Rule::Pattern, Rule::Length]);
    assert_eq!("symptomNote".parse::<Field>(), Ok(Field::SymptomNote));
    assert!("address".parse::<Field>().is_err());

    let json = serde_json::to_string(&Field::SymptomNote).unwrap();
    assert_eq!(json, "\"symptomNote\"");
}

#[test]
fn test_char_count() {
    let config = FormConfig::default();
    let validator = Validator::new(&config);

    let draft = ReservationDraft {
        symptom_note: "肩が痛い".to_string(),
        ..ReservationDraft::default()
    };
    assert_eq!(validator.char_count(Field::SymptomNote, &draft), Some((4, 200)));
    assert_eq!(validator.char_count(Field::Memo, &draft), Some((0, 200)));
    assert_eq!(validator.char_count(Field::Name, &draft), None);
}
