use thiserror::Error;

/// Field-level validation failure. Each entry of `details` names one field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("validation failed: {}", details.join("; "))]
pub struct ValidationError {
    pub details: Vec<String>,
}

impl ValidationError {
    pub fn single(detail: impl Into<String>) -> Self {
        Self {
            details: vec![detail.into()],
        }
    }

    /// `Ok(())` when no detail was collected.
    pub fn check(details: Vec<String>) -> Result<(), Self> {
        if details.is_empty() {
            Ok(())
        } else {
            Err(Self { details })
        }
    }
}

pub(crate) fn require_text(details: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        details.push(format!("{field} is required"));
    }
}

pub(crate) fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_passes_without_details() {
        assert!(ValidationError::check(vec![]).is_ok());
        let err = ValidationError::check(vec!["name is required".into()]).unwrap_err();
        assert_eq!(err.details, vec!["name is required".to_string()]);
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@b.com"));
        assert!(!looks_like_email("invalid"));
        assert!(!looks_like_email("@b.com"));
        assert!(!looks_like_email("a@com"));
    }
}
