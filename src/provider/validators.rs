//! Pure field validators and enum translations.
//!
//! Validators run locally against configuration values; none of them touch
//! the network. They return every problem found rather than stopping at the
//! first, so a single validate pass reports all issues.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ProviderError;

static TEAM_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-zA-Z0-9_]+$").expect("team name regex"));

/// Team names: alphanumeric plus underscore, shorter than 100 characters.
pub fn validate_team_name(value: &str, field: &str) -> Vec<String> {
    let mut errors = Vec::new();
    if !TEAM_NAME_RE.is_match(value) {
        errors.push(format!(
            "{} can only contain alphanumeric characters and underscores: {}",
            field, value
        ));
    }
    if value.len() >= 100 {
        errors.push(format!("{} must be shorter than 100 characters", field));
    }
    errors
}

/// Team member roles: `admin` or `user`, case-insensitive.
pub fn validate_member_role(value: &str, field: &str) -> Vec<String> {
    match value.to_lowercase().as_str() {
        "admin" | "user" => vec![],
        _ => vec![format!(
            "{} must be one of 'admin' or 'user', got: {}",
            field, value
        )],
    }
}

/// Usernames (email addresses): shorter than 100 characters.
pub fn validate_username(value: &str, field: &str) -> Vec<String> {
    if value.len() >= 100 {
        vec![format!("{} must be shorter than 100 characters", field)]
    } else {
        vec![]
    }
}

/// Full names: shorter than 512 characters.
pub fn validate_full_name(value: &str, field: &str) -> Vec<String> {
    if value.len() >= 512 {
        vec![format!("{} must be shorter than 512 characters", field)]
    } else {
        vec![]
    }
}

/// User roles are free-form but bounded: shorter than 512 characters.
pub fn validate_user_role(value: &str, field: &str) -> Vec<String> {
    if value.len() >= 512 {
        vec![format!("{} must be shorter than 512 characters", field)]
    } else {
        vec![]
    }
}

/// Translate a contact method. Exact, case-sensitive match; anything else
/// is a hard error naming the value.
pub fn contact_method(value: &str) -> Result<&str, ProviderError> {
    match value {
        "sms" | "email" | "voice" => Ok(value),
        _ => Err(ProviderError::Validation(format!(
            "Invalid contact method: {}",
            value
        ))),
    }
}

/// Translate a rotation type. Exact, case-sensitive match.
pub fn rotation_type(value: &str) -> Result<&str, ProviderError> {
    match value {
        "daily" | "weekly" | "hourly" => Ok(value),
        _ => Err(ProviderError::Validation(format!(
            "Invalid rotation type: {}",
            value
        ))),
    }
}

/// Translate a rotation participant type. Exact, case-sensitive match.
pub fn participant_type(value: &str) -> Result<&str, ProviderError> {
    match value {
        "user" | "team" | "escalation" | "schedule" => Ok(value),
        _ => Err(ProviderError::Validation(format!(
            "Invalid participant type: {}",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_team_name_accepts_alphanumeric_and_underscore() {
        assert!(validate_team_name("ops_team_1", "name").is_empty());
        assert!(validate_team_name("OpsTeam", "name").is_empty());
        assert!(validate_team_name("123", "name").is_empty());
    }

    #[test]
    fn test_team_name_rejects_other_characters() {
        for bad in ["ops team", "ops-team", "ops.team", "", "équipe"] {
            let errors = validate_team_name(bad, "name");
            assert!(!errors.is_empty(), "expected rejection for {:?}", bad);
        }
    }

    #[test]
    fn test_team_name_length_boundary() {
        let ok = "a".repeat(99);
        assert!(validate_team_name(&ok, "name").is_empty());

        let too_long = "a".repeat(100);
        let errors = validate_team_name(&too_long, "name");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("shorter than 100"));
    }

    #[test]
    fn test_team_name_reports_all_problems() {
        let bad = "-".repeat(120);
        let errors = validate_team_name(&bad, "name");
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_member_role_case_insensitive() {
        assert!(validate_member_role("admin", "role").is_empty());
        assert!(validate_member_role("Admin", "role").is_empty());
        assert!(validate_member_role("USER", "role").is_empty());

        let errors = validate_member_role("owner", "role");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("owner"));
    }

    #[test]
    fn test_username_length_boundary() {
        assert!(validate_username(&"a".repeat(99), "username").is_empty());
        assert_eq!(validate_username(&"a".repeat(100), "username").len(), 1);
    }

    #[test]
    fn test_full_name_and_role_length_boundary() {
        assert!(validate_full_name(&"a".repeat(511), "full_name").is_empty());
        assert_eq!(validate_full_name(&"a".repeat(512), "full_name").len(), 1);

        assert!(validate_user_role(&"a".repeat(511), "role").is_empty());
        assert_eq!(validate_user_role(&"a".repeat(512), "role").len(), 1);
    }

    #[test]
    fn test_contact_method_translation() {
        assert!(contact_method("sms").is_ok());
        assert!(contact_method("email").is_ok());
        assert!(contact_method("voice").is_ok());

        let err = contact_method("pager").unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Invalid contact method: pager");

        // case-sensitive
        assert!(contact_method("SMS").is_err());
    }

    #[test]
    fn test_rotation_type_translation() {
        assert!(rotation_type("daily").is_ok());
        assert!(rotation_type("weekly").is_ok());
        assert!(rotation_type("hourly").is_ok());

        let err = rotation_type("monthly").unwrap_err();
        assert!(err.to_string().contains("Invalid rotation type: monthly"));
        assert!(rotation_type("Weekly").is_err());
    }

    #[test]
    fn test_participant_type_translation() {
        for ok in ["user", "team", "escalation", "schedule"] {
            assert!(participant_type(ok).is_ok());
        }

        let err = participant_type("group").unwrap_err();
        assert!(err.to_string().contains("Invalid participant type: group"));
    }
}
