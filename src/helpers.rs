//! String helpers shared by DSN rendering and table naming.

use std::collections::BTreeMap;

/// Join `key=value` pairs with `&`, in key order, with no leading or trailing `&`.
#[must_use]
pub fn map_to_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Convert `camelCase` / `PascalCase` to `snake_case`.
///
/// Every uppercase letter starts a new segment, digits stay attached to the segment before
/// them, and existing underscores are kept, so the conversion is idempotent:
/// ```rust
/// use sql_orm::helpers::to_snake_case;
///
/// assert_eq!(to_snake_case("testCase123"), "test_case123");
/// assert_eq!(to_snake_case("UserProfile"), "user_profile");
/// assert_eq!(to_snake_case("user_profile"), "user_profile");
/// ```
#[must_use]
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
