use anyhow::{anyhow, Result};

pub fn validate_full_name(full_name: &str) -> Result<()> {
    let full_name = full_name.trim();

    if full_name.is_empty() {
        return Err(anyhow!("Full name cannot be empty"));
    }

    if full_name.split_whitespace().count() < 2 {
        return Err(anyhow!("Enter a full name (at least first and last name)"));
    }

    if full_name.len() > 200 {
        return Err(anyhow!("Full name cannot be longer than 200 characters"));
    }

    if full_name.contains('\n') || full_name.contains('\r') {
        return Err(anyhow!("Full name cannot contain line breaks"));
    }

    Ok(())
}

pub fn validate_description(description: &str) -> Result<()> {
    let description = description.trim();

    if description.is_empty() {
        return Err(anyhow!("Description cannot be empty"));
    }

    if description.len() > 1000 {
        return Err(anyhow!("Description cannot be longer than 1000 characters"));
    }

    Ok(())
}

/// Parses a one-based list choice like the numbered task pick in the
/// set-reminder dialog. Returns the zero-based index.
pub fn parse_choice_index(input: &str, len: usize) -> Result<usize> {
    let picked: usize = input
        .trim()
        .parse()
        .map_err(|_| anyhow!("Enter a number between 1 and {len}"))?;

    if picked == 0 || picked > len {
        return Err(anyhow!("Enter a number between 1 and {len}"));
    }

    Ok(picked - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_full_name_valid() {
        assert!(validate_full_name("Jane Doe").is_ok());
        assert!(validate_full_name("  Jane Doe  ").is_ok());
        assert!(validate_full_name("Anna Maria van der Berg").is_ok());
    }

    #[test]
    fn test_validate_full_name_invalid() {
        assert!(validate_full_name("").is_err());
        assert!(validate_full_name("   ").is_err());
        assert!(validate_full_name("Jane").is_err());
        assert!(validate_full_name("Jane\nDoe").is_err());

        let long_name = "a ".repeat(150);
        assert!(validate_full_name(&long_name).is_err());
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("Prepare the practice program").is_ok());
        assert!(validate_description("").is_err());
        assert!(validate_description(&"a".repeat(1001)).is_err());
    }

    #[test]
    fn test_parse_choice_index() {
        assert_eq!(parse_choice_index("1", 3).unwrap(), 0);
        assert_eq!(parse_choice_index(" 3 ", 3).unwrap(), 2);
        assert!(parse_choice_index("0", 3).is_err());
        assert!(parse_choice_index("4", 3).is_err());
        assert!(parse_choice_index("abc", 3).is_err());
        assert!(parse_choice_index("1", 0).is_err());
    }
}
