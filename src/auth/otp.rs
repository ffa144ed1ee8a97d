use chrono::{DateTime, Duration, Utc};
use rand::Rng;

/// Email-verification tokens are valid for 24 hours.
const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;
/// Password-reset OTPs are valid for 1 hour.
const RESET_OTP_TTL_MINUTES: i64 = 60;

/// Generates a 64-character lowercase hex token (32 random bytes) for
/// email-verification links. `thread_rng` is a CSPRNG.
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill(&mut bytes[..]);
    hex::encode(bytes)
}

/// Generates a 6-digit numeric one-time code, uniform over 100000–999999.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..=999_999u32).to_string()
}

pub fn verification_token_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS)
}

pub fn reset_otp_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(RESET_OTP_TTL_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_token_shape() {
        let token = generate_verification_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token, token.to_lowercase());

        // Two draws must not collide.
        assert_ne!(token, generate_verification_token());
    }

    #[test]
    fn test_otp_shape_and_range() {
        for _ in 0..1000 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            let value: u32 = otp.parse().unwrap();
            assert!((100_000..=999_999).contains(&value));
        }
    }

    #[test]
    fn test_expiry_windows() {
        let now = Utc::now();
        let verification = verification_token_expiry();
        let reset = reset_otp_expiry();

        assert!(verification > now + Duration::hours(23));
        assert!(verification <= now + Duration::hours(24) + Duration::seconds(1));
        assert!(reset > now + Duration::minutes(59));
        assert!(reset <= now + Duration::minutes(60) + Duration::seconds(1));
    }
}
