use serde::{Deserialize, Serialize};

use aurora_core::{Validate, ValidationErrors};

const MAX_NAME_LEN: usize = 64;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(!self.name.trim().is_empty(), "name", "name must not be blank");
        errors.check(
            self.name.chars().count() <= MAX_NAME_LEN,
            "name",
            "name must be at most 64 characters",
        );
        check_email(&mut errors, &self.email);
        errors.into_result()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub email: String,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        errors.into_result()
    }
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    errors.check(well_formed, "email", "email must be a valid address");
}

#[derive(Debug, Deserialize)]
pub struct FindUserQuery {
    pub name: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct UploadReceipt {
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_reports_first_failure_first() {
        let req = CreateUserRequest {
            name: "".into(),
            email: "nope".into(),
        };
        let errors = req.validate().unwrap_err();
        assert_eq!(errors.violations().len(), 2);
        assert_eq!(errors.first().unwrap().message, "name must not be blank");
    }

    #[test]
    fn email_shape_is_checked() {
        for (email, ok) in [("a@b.io", true), ("@b.io", false), ("a@b", false), ("ab.io", false)] {
            let req = UpdateUserRequest { email: email.into() };
            assert_eq!(req.validate().is_ok(), ok, "{email}");
        }
    }

    #[test]
    fn overlong_names_are_rejected() {
        let req = CreateUserRequest {
            name: "x".repeat(MAX_NAME_LEN + 1),
            email: "a@b.io".into(),
        };
        assert_eq!(req.validate().unwrap_err().first().unwrap().field, "name");
    }
}
