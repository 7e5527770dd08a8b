//! Client-side form checks. Every failure is an [`AppError::ValidationFailure`]
//! carrying the message shown to the user.

use crate::domain::error::{AppError, AppResult};
use crate::domain::models::BlockPlan;

pub const MIN_PASSWORD_LEN: usize = 8;

fn invalid(message: &str) -> AppError {
    AppError::ValidationFailure(message.to_string())
}

/// Loose `something@domain.tld` check, no whitespace anywhere.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn validate_login(email: &str) -> AppResult<()> {
    if !is_valid_email(email.trim()) {
        return Err(invalid("Please enter a valid email."));
    }
    Ok(())
}

pub fn validate_signup(name: &str, email: &str, password: &str, confirm: &str) -> AppResult<()> {
    if name.trim().is_empty() || email.trim().is_empty() || password.trim().is_empty() {
        return Err(invalid("All fields are required."));
    }
    if password.trim() != confirm.trim() {
        return Err(invalid("Passwords do not match."));
    }
    if password.trim().len() < MIN_PASSWORD_LEN {
        return Err(invalid("Password must be at least 8 characters long."));
    }
    if !is_valid_email(email.trim()) {
        return Err(invalid("Please enter a valid email address."));
    }
    Ok(())
}

pub fn validate_profile(name: &str, email: &str) -> AppResult<()> {
    if name.trim().is_empty() || email.trim().is_empty() {
        return Err(invalid("Name and email cannot be empty."));
    }
    if !is_valid_email(email.trim()) {
        return Err(invalid("Please enter a valid email address."));
    }
    Ok(())
}

pub fn validate_password_change(current: &str, new: &str, confirm: &str) -> AppResult<()> {
    if current.is_empty() || new.is_empty() || confirm.is_empty() {
        return Err(invalid("All password fields are required."));
    }
    if new != confirm {
        return Err(invalid("New passwords do not match."));
    }
    if new.len() < MIN_PASSWORD_LEN {
        return Err(invalid("Password must be at least 8 characters."));
    }
    Ok(())
}

pub fn validate_delete(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(invalid("Please enter your password to confirm deletion."));
    }
    Ok(())
}

pub fn validate_blocks(blocks: &[BlockPlan]) -> AppResult<()> {
    if blocks.is_empty() {
        return Err(invalid("Add at least one block."));
    }
    if let Some(i) = blocks.iter().position(|b| b.shots_planned == 0) {
        return Err(AppError::ValidationFailure(format!(
            "Block {} needs at least one planned shot.",
            i + 1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::TargetArea;

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("sam@example.com"));
        assert!(!is_valid_email("sam@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("sam example@x.io"));
        assert!(!is_valid_email("sam@@x.io"));
    }

    #[test]
    fn test_signup_rules() {
        assert!(validate_signup("Sam", "sam@x.io", "longenough", "longenough").is_ok());
        assert_eq!(
            validate_signup("Sam", "sam@x.io", "longenough", "different"),
            Err(AppError::ValidationFailure("Passwords do not match.".into()))
        );
        assert!(validate_signup("Sam", "sam@x.io", "short", "short").is_err());
        assert!(validate_signup("", "sam@x.io", "longenough", "longenough").is_err());
        assert!(validate_signup("Sam", "not-an-email", "longenough", "longenough").is_err());
    }

    #[test]
    fn test_password_change_rules() {
        assert!(validate_password_change("old", "newpassword", "newpassword").is_ok());
        assert!(validate_password_change("old", "newpassword", "newpasswort").is_err());
        assert!(validate_password_change("old", "short", "short").is_err());
        assert!(validate_password_change("", "newpassword", "newpassword").is_err());
    }

    #[test]
    fn test_block_rules() {
        assert!(validate_blocks(&[]).is_err());
        let ok = BlockPlan {
            target_area: TargetArea::FiveHole,
            shots_planned: 3,
        };
        let empty = BlockPlan {
            target_area: TargetArea::TopLeft,
            shots_planned: 0,
        };
        assert!(validate_blocks(&[ok.clone()]).is_ok());
        assert_eq!(
            validate_blocks(&[ok, empty]),
            Err(AppError::ValidationFailure(
                "Block 2 needs at least one planned shot.".into()
            ))
        );
    }

    #[test]
    fn test_login_and_delete() {
        assert!(validate_login(" sam@x.io ").is_ok());
        assert!(validate_login("sam").is_err());
        assert!(validate_delete("").is_err());
        assert!(validate_delete("secret").is_ok());
    }
}
