use crate::error::{AppError, AppResult};

pub const LOCAL_DIGITS: usize = 10;

/// Strip everything but digits and prefix the country code:
/// `"55 1234-5678"` with code `52` becomes `+525512345678`.
pub fn canonicalize(raw: &str, country_code: &str) -> AppResult<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != LOCAL_DIGITS {
        return Err(AppError::Format(format!(
            "Phone number must have exactly {LOCAL_DIGITS} digits"
        )));
    }
    Ok(format!("+{country_code}{digits}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_ten_digits_with_prefix() {
        assert_eq!(canonicalize("5512345678", "52").unwrap(), "+525512345678");
    }

    #[test]
    fn separators_are_ignored() {
        let a = canonicalize("(55) 1234-5678", "52").unwrap();
        let b = canonicalize("55.1234.5678", "52").unwrap();
        let c = canonicalize(" 55 12 34 56 78 ", "52").unwrap();
        assert_eq!(a, "+525512345678");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn wrong_digit_counts_fail_with_format_error() {
        for input in ["", "123", "551234567", "55123456789", "+52 55 1234 5678", "abcdefghij"] {
            match canonicalize(input, "52") {
                Err(AppError::Format(_)) => {}
                other => panic!("expected format error for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn country_code_is_configurable() {
        assert_eq!(canonicalize("2025550123", "1").unwrap(), "+12025550123");
    }
}
