//! Tests for reading configuration from the environment

#[cfg(test)]
mod tests {
    use std::env;

    use folio::core::{AppConfig, MAX_SESSION_TTL_HOURS};
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "FOLIO_STORAGE_PATH",
        "FOLIO_LLM_API_KEY",
        "FOLIO_LLM_MODEL",
        "FOLIO_SYSTEM_MESSAGE",
        "FOLIO_EMAIL_API_KEY",
        "FOLIO_SESSION_TTL_HOURS",
    ];

    fn clear_vars() {
        for key in VARS {
            // SAFETY: tests touching the environment run serially
            unsafe { env::remove_var(key) };
        }
    }

    /// Tests defaults are used when nothing is set
    #[test]
    #[serial]
    fn it_uses_defaults() {
        clear_vars();
        let config = AppConfig::default();

        assert_eq!(config.db_path, "./db");
        assert_eq!(config.llm_model, "google/gemini-3-flash-preview");
        assert_eq!(config.llm_api_key, None);
        assert_eq!(config.email_api_key, None);
        assert_eq!(config.system_message, None);
        assert_eq!(config.session_ttl_hours, 24);
    }

    /// Tests values are read from the environment and blank secrets
    /// count as missing
    #[test]
    #[serial]
    fn it_reads_the_environment() {
        clear_vars();
        // SAFETY: tests touching the environment run serially
        unsafe {
            env::set_var("FOLIO_STORAGE_PATH", "/var/lib/folio/");
            env::set_var("FOLIO_LLM_API_KEY", "llm-key");
            env::set_var("FOLIO_LLM_MODEL", "other-model");
            env::set_var("FOLIO_SYSTEM_MESSAGE", "  ");
            env::set_var("FOLIO_EMAIL_API_KEY", "");
            env::set_var("FOLIO_SESSION_TTL_HOURS", "not-a-number");
        }
        let config = AppConfig::default();
        clear_vars();

        assert_eq!(config.storage_path, "/var/lib/folio/");
        assert_eq!(config.db_path, "/var/lib/folio/db");
        assert_eq!(config.llm_api_key.as_deref(), Some("llm-key"));
        assert_eq!(config.llm_model, "other-model");
        assert_eq!(config.system_message, None);
        assert_eq!(config.email_api_key, None);
        assert_eq!(config.session_ttl_hours, 24);
    }

    /// Tests session lifetimes outside the accepted range fall back to
    /// the default
    #[test]
    #[serial]
    fn it_bounds_the_session_lifetime() {
        clear_vars();
        for hours in ["0", "-5", "9223372036854775807"] {
            // SAFETY: tests touching the environment run serially
            unsafe { env::set_var("FOLIO_SESSION_TTL_HOURS", hours) };
            assert_eq!(AppConfig::default().session_ttl_hours, 24, "{hours}");
        }

        let max = MAX_SESSION_TTL_HOURS.to_string();
        // SAFETY: tests touching the environment run serially
        unsafe { env::set_var("FOLIO_SESSION_TTL_HOURS", &max) };
        assert_eq!(AppConfig::default().session_ttl_hours, MAX_SESSION_TTL_HOURS);
        clear_vars();
    }
}
