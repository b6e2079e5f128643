use rand::Rng;

const GIFT_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const GIFT_CODE_LEN: usize = 8;

/// Six-digit numeric code for email verification.
pub fn generate_six_digit_code() -> String {
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(100000..=999999))
}

/// 8-character gift code over [A-Z0-9]. Uniqueness is enforced at insert time.
pub fn generate_gift_code() -> String {
    let mut rng = rand::thread_rng();
    (0..GIFT_CODE_LEN)
        .map(|_| GIFT_CODE_ALPHABET[rng.gen_range(0..GIFT_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Opaque single-use token for password resets.
pub fn generate_reset_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_six_digit_code() {
        let code = generate_six_digit_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));

        let code_num: u32 = code.parse().unwrap();
        assert!((100000..=999999).contains(&code_num));
    }

    #[test]
    fn test_generate_gift_code_alphabet() {
        for _ in 0..100 {
            let code = generate_gift_code();
            assert_eq!(code.len(), 8);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }

    #[test]
    fn test_generate_reset_token() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 32);
        assert_ne!(token, generate_reset_token());
    }
}
