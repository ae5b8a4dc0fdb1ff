use crate::error::{AppError, CliError};
use crate::storage::config::{AdminCredentials, Secret};
use crate::utils::validation::validate_email;
use rpassword::prompt_password;
use std::io::{self, BufRead, Write};

/// Sign in / sign up credentials input handler
pub struct LoginInput {
    pub email: String,
    pub password: Secret,
}

impl LoginInput {
    /// Collect credentials from flags, falling back to the configured account
    /// and finally to interactive prompts on stderr.
    pub fn collect(
        email: Option<String>,
        password: Option<String>,
        configured: Option<&AdminCredentials>,
        configured_email: Option<&str>,
    ) -> Result<Self, AppError> {
        let email = match email.or_else(|| configured_email.map(str::to_string)) {
            Some(email) => email.trim().to_string(),
            None => prompt_line("Email: ")?,
        };

        // Passwords are sent exactly as given
        let password = match password {
            Some(password) => password,
            None => match configured.filter(|admin| admin.email == email) {
                Some(admin) => admin.password.expose().to_string(),
                None => prompt_password("Password: ")
                    .map_err(|e| CliError::Input(format!("Failed to read password: {}", e)))?,
            },
        };

        Ok(Self {
            email,
            password: Secret::new(password),
        })
    }

    /// Validate that credentials are usable
    pub fn validate(&self) -> Result<(), AppError> {
        validate_email(&self.email)?;
        if self.password.expose().is_empty() {
            return Err(AppError::Cli(CliError::InvalidArguments(
                "Password cannot be empty".to_string(),
            )));
        }
        Ok(())
    }
}

fn prompt_line(label: &str) -> Result<String, AppError> {
    let mut stderr = io::stderr();
    write!(stderr, "{}", label)
        .and_then(|_| stderr.flush())
        .map_err(|e| CliError::Input(format!("Failed to write prompt: {}", e)))?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| CliError::Input(format!("Failed to read input: {}", e)))?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AdminCredentials {
        AdminCredentials {
            email: "admin@example.test".to_string(),
            password: Secret::new("from-env".to_string()),
        }
    }

    #[test]
    fn test_flags_take_priority() {
        let input = LoginInput::collect(
            Some(" user@example.test ".to_string()),
            Some("pw".to_string()),
            Some(&admin()),
            Some("admin@example.test"),
        )
        .unwrap();
        assert_eq!(input.email, "user@example.test");
        assert_eq!(input.password.expose(), "pw");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_configured_account_fills_missing_values() {
        let admin = admin();
        let input =
            LoginInput::collect(None, None, Some(&admin), Some("admin@example.test")).unwrap();
        assert_eq!(input.email, "admin@example.test");
        assert_eq!(input.password.expose(), "from-env");
    }

    #[test]
    fn test_password_whitespace_is_kept() {
        let input = LoginInput::collect(
            Some("user@example.test".to_string()),
            Some(" pw ".to_string()),
            None,
            None,
        )
        .unwrap();
        assert_eq!(input.password.expose(), " pw ");
    }

    #[test]
    fn test_configured_password_matches_auto_sign_in() {
        let admin = AdminCredentials {
            email: "admin@example.test".to_string(),
            password: Secret::new(" spaced ".to_string()),
        };
        let input = LoginInput::collect(
            Some(" admin@example.test".to_string()),
            None,
            Some(&admin),
            None,
        )
        .unwrap();
        assert_eq!(input.password.expose(), admin.password.expose());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let input = LoginInput {
            email: "not-an-email".to_string(),
            password: Secret::new("pw".to_string()),
        };
        assert!(input.validate().is_err());

        let input = LoginInput {
            email: "user@example.test".to_string(),
            password: Secret::new(String::new()),
        };
        assert!(input.validate().is_err());
    }
}
