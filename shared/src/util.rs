/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Build a URL slug from a display name.
///
/// Lowercases ASCII alphanumerics and collapses every other run of
/// characters into a single `-`. Leading and trailing separators are dropped.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Apparel"), "apparel");
        assert_eq!(slugify("Home & Garden"), "home-garden");
        assert_eq!(slugify("  T-Shirts  "), "t-shirts");
        assert_eq!(slugify("Men's Wear 2024"), "men-s-wear-2024");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_now_millis_is_recent() {
        // 2024-01-01 00:00:00 UTC
        assert!(now_millis() > 1_704_067_200_000);
    }
}
