//! Request field validation.
//!
//! Built once from the `[validation]` config section and shared through
//! `AppState`, so handlers check currencies against the configured set
//! rather than a process-wide registry.

use crate::types::{AppError, Result};
use crate::utils::toml_config::ValidationSection;
use std::collections::HashSet;

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_PAGE_SIZE: i64 = 5;
pub const MAX_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone)]
pub struct ValidationConfig {
    currencies: HashSet<String>,
}

impl ValidationConfig {
    pub fn new<I, S>(currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            currencies: currencies.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_section(section: &ValidationSection) -> Self {
        Self::new(section.currencies.iter().cloned())
    }

    pub fn is_supported_currency(&self, currency: &str) -> bool {
        self.currencies.contains(currency)
    }

    pub fn validate_currency(&self, currency: &str) -> Result<()> {
        if self.is_supported_currency(currency) {
            Ok(())
        } else {
            Err(AppError::InvalidInput(format!(
                "unsupported currency {}",
                currency
            )))
        }
    }

    pub fn validate_username(&self, username: &str) -> Result<()> {
        if username.is_empty() || !username.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::InvalidInput(
                "username must be non-empty and alphanumeric".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_password(&self, password: &str) -> Result<()> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    pub fn validate_email(&self, email: &str) -> Result<()> {
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            }
            None => false,
        };

        if valid {
            Ok(())
        } else {
            Err(AppError::InvalidInput(format!("invalid email {}", email)))
        }
    }

    /// Checks pagination and returns `(limit, offset)`.
    pub fn validate_page(&self, page_id: i64, page_size: i64) -> Result<(i64, i64)> {
        if page_id < 1 {
            return Err(AppError::InvalidInput(
                "page_id must be at least 1".to_string(),
            ));
        }
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::InvalidInput(format!(
                "page_size must be between {} and {}",
                MIN_PAGE_SIZE, MAX_PAGE_SIZE
            )));
        }
        let offset = page_id
            .checked_sub(1)
            .and_then(|p| p.checked_mul(page_size))
            .ok_or_else(|| AppError::InvalidInput("page_id is too large".to_string()))?;
        Ok((page_size, offset))
    }

    pub fn validate_amount(&self, amount: i64) -> Result<()> {
        if amount <= 0 {
            return Err(AppError::InvalidInput(
                "amount must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn validate_account_id(&self, id: i64) -> Result<()> {
        if id < 1 {
            return Err(AppError::InvalidInput(
                "account id must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
