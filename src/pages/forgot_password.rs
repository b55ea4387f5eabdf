//! Forgot-password view. The request is simulated and always succeeds.

use std::time::Duration;

/// Trim and require an email address.
pub fn validate_reset_input(email: &str) -> Result<String, &'static str> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err("Enter the email address for your account.");
    }
    Ok(email.to_owned())
}

/// Submit a reset request for `email` after the simulated delay.
pub async fn request_reset(email: &str, delay: Duration) -> String {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    tracing::info!(%email, "password reset requested");
    format!("Check your email\nWe've sent a password reset link to {email}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reset_input_trims() {
        assert_eq!(validate_reset_input(" a@b.com "), Ok("a@b.com".to_owned()));
    }

    #[test]
    fn validate_reset_input_rejects_blank_and_malformed() {
        assert!(validate_reset_input("  ").is_err());
        assert!(validate_reset_input("not-an-email").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn request_reset_waits_then_confirms() {
        let started = tokio::time::Instant::now();
        let message = request_reset("a@b.com", Duration::from_millis(1500)).await;
        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert!(message.contains("a@b.com"));
        assert!(message.starts_with("Check your email"));
    }
}
