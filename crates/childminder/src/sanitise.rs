//! Validation and normalization applied to free-text form input before it
//! reaches a repository. Every function is total: malformed input yields
//! `false` or a cleaned string, never an error.

/// Symbols accepted (and required, at least one) by [`validate_passwords`].
const PASSWORD_SYMBOLS: &str = "@$!%*?&#^";

/// Mailbox-shape check applied after trim + lowercase. This is a shape test,
/// not deliverability: one `@`, a non-empty local part, and a dotted domain
/// with non-empty labels.
pub fn is_valid_email(email: &str) -> bool {
    let cleaned = clean_email(email);
    let Some((local, domain)) = cleaned.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > 64 || domain.is_empty() {
        return false;
    }
    if cleaned.chars().any(char::is_whitespace) || domain.contains('@') {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if !domain.contains('.') {
        return false;
    }

    domain.split('.').all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// E.164-shape check: after [`clean_phone`], a `+` followed by 10-15 digits.
/// Carrier reachability is not verified.
pub fn is_valid_phone(phone: &str) -> bool {
    let cleaned = clean_phone(phone);
    let Some(digits) = cleaned.strip_prefix('+') else {
        return false;
    };
    (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// True iff both entries match and the password has at least 8 characters,
/// one ASCII uppercase letter, one digit, and one symbol from `@$!%*?&#^`,
/// with no characters outside that set plus ASCII letters and digits.
pub fn validate_passwords(password: &str, confirm: &str) -> bool {
    if password != confirm || password.len() < 8 {
        return false;
    }

    let allowed = |c: char| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c);
    if !password.chars().all(allowed) {
        return false;
    }

    password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

/// Strip ends and collapse internal whitespace runs to a single space.
pub fn trim_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`trim_whitespace`] then title-case each token, for proper nouns:
/// `" john  SMITH "` becomes `"John Smith"`.
pub fn trim_name(value: &str) -> String {
    trim_whitespace(value)
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trim and lowercase an email address. Non-validating; pairs with
/// [`is_valid_email`].
pub fn clean_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Strip everything except digits and a leading `+`. Non-validating; pairs
/// with [`is_valid_phone`].
pub fn clean_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    let mut cleaned = String::with_capacity(trimmed.len());
    for (index, c) in trimmed.char_indices() {
        if c.is_ascii_digit() || (c == '+' && index == 0) {
            cleaned.push(c);
        }
    }
    cleaned
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
