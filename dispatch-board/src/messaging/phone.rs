use super::ComposeError;

/// Fewest national digits accepted (area code + 8-digit landline)
const MIN_NATIONAL_DIGITS: usize = 10;
/// Area code + 9-digit mobile
const MAX_NATIONAL_DIGITS: usize = 11;

/// Normalize a customer phone for the messaging hand-off
///
/// Keeps digits only, keeps the last 11 when longer, then prefixes
/// `country_code` unless the number already starts with it.
pub fn normalize_phone(raw: &str, country_code: &str) -> Result<String, ComposeError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    let national = if digits.len() > MAX_NATIONAL_DIGITS {
        &digits[digits.len() - MAX_NATIONAL_DIGITS..]
    } else {
        digits.as_str()
    };

    if national.len() < MIN_NATIONAL_DIGITS {
        return Err(ComposeError::InvalidPhone(raw.to_string()));
    }

    if national.starts_with(country_code) {
        Ok(national.to_string())
    } else {
        Ok(format!("{}{}", country_code, national))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_mobile() {
        assert_eq!(normalize_phone("(22) 99982-2324", "55").unwrap(), "5522999822324");
    }

    #[test]
    fn test_twelve_digits_keeps_last_eleven() {
        assert_eq!(normalize_phone("022999822324", "55").unwrap(), "5522999822324");
    }

    #[test]
    fn test_full_international_number() {
        assert_eq!(normalize_phone("+55 (22) 99982-2324", "55").unwrap(), "5522999822324");
    }

    #[test]
    fn test_landline() {
        assert_eq!(normalize_phone("21 3333-4444", "55").unwrap(), "552133334444");
    }

    #[test]
    fn test_letters_only() {
        let err = normalize_phone("sem telefone", "55").unwrap_err();
        assert_eq!(err, ComposeError::InvalidPhone("sem telefone".into()));
    }

    #[test]
    fn test_missing_digits() {
        assert!(normalize_phone("9998-2324", "55").is_err());
        assert!(normalize_phone("", "55").is_err());
    }

    #[test]
    fn test_punctuation_and_letters_mixed() {
        assert_eq!(normalize_phone("tel: 22.99982.2324 (zap)", "55").unwrap(), "5522999822324");
    }

    #[test]
    fn test_area_code_matching_country_code_is_not_prefixed() {
        assert_eq!(normalize_phone("(55) 99982-2324", "55").unwrap(), "55999822324");
    }

    #[test]
    fn test_deterministic() {
        let a = normalize_phone("(22) 99982-2324", "55").unwrap();
        let b = normalize_phone(&a, "55").unwrap();
        assert_eq!(a, b);
    }
}
