/// Get environment variable with PLANHOLD_ prefix, falling back to the
/// unprefixed version.
///
/// Checks `PLANHOLD_{key}` first, then `{key}`, so deployments can scope
/// settings to this service without breaking conventional names like
/// `DATABASE_URL` or `SMTP_HOST`.
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("PLANHOLD_{}", key))
        .or_else(|_| std::env::var(key))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_env_with_prefix() {
        unsafe {
            std::env::set_var("PLANHOLD_ENV_TEST_VAR", "prefixed_value");
        }
        assert_eq!(
            get_env_with_prefix("ENV_TEST_VAR"),
            Some("prefixed_value".to_string())
        );
        unsafe {
            std::env::remove_var("PLANHOLD_ENV_TEST_VAR");
        }

        unsafe {
            std::env::set_var("ENV_FALLBACK_VAR", "unprefixed_value");
        }
        assert_eq!(
            get_env_with_prefix("ENV_FALLBACK_VAR"),
            Some("unprefixed_value".to_string())
        );
        unsafe {
            std::env::remove_var("ENV_FALLBACK_VAR");
        }

        assert_eq!(get_env_with_prefix("ENV_MISSING_VAR"), None);
    }
}
