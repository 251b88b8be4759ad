use chrono::{DateTime, Duration, Utc};
use rand::Rng;

const OTP_LENGTH: usize = 6;
const ACTIVATION_CODE_LENGTH: usize = 10;
const ACTIVATION_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a 6-digit login OTP.
///
/// Each digit is sampled uniformly from 0..10 (`random_range` rejects rather
/// than taking a modulus, so no position skews low). `rand::rng()` is a
/// CSPRNG.
#[must_use]
pub fn generate_otp() -> String {
    let mut rng = rand::rng();

    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Generate a 10-character organization activation code.
///
/// Rejection-sampled until the string holds at least one lowercase letter,
/// one uppercase letter and three digits. Codes need not be globally unique;
/// they are only ever compared against the record bound to one email.
#[must_use]
pub fn generate_activation_code() -> String {
    let mut rng = rand::rng();

    loop {
        let code: String = (0..ACTIVATION_CODE_LENGTH)
            .map(|_| {
                char::from(ACTIVATION_ALPHABET[rng.random_range(0..ACTIVATION_ALPHABET.len())])
            })
            .collect();

        let has_lower = code.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = code.chars().any(|c| c.is_ascii_uppercase());
        let digits = code.chars().filter(char::is_ascii_digit).count();

        if has_lower && has_upper && digits >= 3 {
            return code;
        }
    }
}

/// Absolute expiry timestamp for a code issued now.
#[must_use]
pub fn expires_at(minutes: i64) -> DateTime<Utc> {
    Utc::now() + Duration::minutes(minutes)
}

/// True when a stored expiry is strictly in the past.
#[must_use]
pub fn is_expired(expires_at: DateTime<Utc>) -> bool {
    expires_at < Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn otp_digits_are_roughly_uniform_per_position() {
        const SAMPLES: usize = 6000;
        let mut counts = [[0usize; 10]; 6];

        for _ in 0..SAMPLES {
            for (pos, c) in generate_otp().chars().enumerate() {
                counts[pos][(c as u8 - b'0') as usize] += 1;
            }
        }

        // Expected 600 per digit per position; a biased generator (e.g.
        // modulo over a small range) lands far outside this band.
        for position in &counts {
            for &count in position {
                assert!(count > 400, "digit undersampled: {count}");
                assert!(count < 800, "digit oversampled: {count}");
            }
        }
    }

    #[test]
    fn activation_code_satisfies_composition_rules() {
        for _ in 0..200 {
            let code = generate_activation_code();
            assert_eq!(code.len(), 10);
            assert!(code.chars().any(|c| c.is_ascii_lowercase()));
            assert!(code.chars().any(|c| c.is_ascii_uppercase()));
            assert!(code.chars().filter(char::is_ascii_digit).count() >= 3);
        }
    }

    #[test]
    fn expiry_window_is_in_the_future() {
        let at = expires_at(10);
        assert!(!is_expired(at));
        assert!(is_expired(Utc::now() - Duration::seconds(1)));
    }
}
