use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub auth_token: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:3000".into(),
            auth_token: String::new(),
        }
    }
}

/// Defaults, then `claims.toml`, then environment variables. Flags handled
/// by the caller win over all of these.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = std::fs::read_to_string("claims.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("api_url") {
                settings.api_url = v.clone();
            }
            if let Some(v) = file_cfg.get("auth_token") {
                settings.auth_token = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("CLAIMS_API_URL") {
        settings.api_url = v;
    }
    if let Ok(v) = std::env::var("CLAIMS_AUTH_TOKEN") {
        settings.auth_token = v;
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_defaults() {
        std::env::set_var("CLAIMS_API_URL", "https://claims.example.test");
        let settings = load_settings();
        assert_eq!(settings.api_url, "https://claims.example.test");
        std::env::remove_var("CLAIMS_API_URL");
    }
}
