use std::path::PathBuf;

use ask_core::RenderStyle;
use serde::Deserialize;

const CONFIG_FILE_PATH: &str = "ask.toml";
const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";
const SESSION_STORE_FILE: &str = "session.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    Terminal,
    Html,
}

impl DisplayStyle {
    pub fn render_style(self) -> RenderStyle {
        match self {
            DisplayStyle::Terminal => RenderStyle::terminal(),
            DisplayStyle::Html => RenderStyle::html(),
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "terminal" | "text" => Some(DisplayStyle::Terminal),
            "html" => Some(DisplayStyle::Html),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_url: String,
    pub state_dir: PathBuf,
    pub display: DisplayStyle,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            state_dir: default_state_dir(),
            display: DisplayStyle::Terminal,
        }
    }
}

fn default_state_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ask-client")
}

impl ClientConfig {
    /// `ask.toml` in the working directory if present, then environment
    /// overrides.
    pub fn load() -> Self {
        let mut config = ClientConfig::default();

        let path = std::path::Path::new(CONFIG_FILE_PATH);
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match Self::from_toml_str(&content) {
                    Ok(file_config) => config = file_config,
                    Err(err) => log::warn!("Ignoring malformed {}: {}", CONFIG_FILE_PATH, err),
                },
                Err(err) => log::warn!("Failed to read {}: {}", CONFIG_FILE_PATH, err),
            }
        }

        config.apply_overrides(|name| std::env::var(name).ok());
        config
    }

    /// Apply `ASK_API_URL`, `ASK_STATE_DIR` and `ASK_DISPLAY` as resolved
    /// by `lookup`. An unknown display value keeps the current style.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_url) = lookup("ASK_API_URL") {
            self.api_url = api_url;
        }
        if let Some(state_dir) = lookup("ASK_STATE_DIR") {
            self.state_dir = PathBuf::from(state_dir);
        }
        if let Some(display) = lookup("ASK_DISPLAY") {
            match DisplayStyle::parse(&display) {
                Some(style) => self.display = style,
                None => log::warn!("Unknown ASK_DISPLAY value {:?}", display),
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn session_store_path(&self) -> PathBuf {
        self.state_dir.join(SESSION_STORE_FILE)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.display, DisplayStyle::Terminal);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = ClientConfig::from_toml_str(
            r#"
api_url = "http://backend:8000"
state_dir = "/tmp/ask"
display = "html"
"#,
        )
        .unwrap();

        assert_eq!(config.api_url, "http://backend:8000");
        assert_eq!(config.session_store_path(), PathBuf::from("/tmp/ask/session.json"));
        assert_eq!(config.display.render_style(), RenderStyle::html());
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = ClientConfig::from_toml_str(
            r#"
api_url = "http://backend:8000"
state_dir = "/tmp/ask"
"#,
        )
        .unwrap();

        config.apply_overrides(env(&[
            ("ASK_API_URL", "http://override:9000"),
            ("ASK_STATE_DIR", "/var/lib/ask"),
            ("ASK_DISPLAY", "html"),
        ]));

        assert_eq!(config.api_url, "http://override:9000");
        assert_eq!(
            config.session_store_path(),
            PathBuf::from("/var/lib/ask/session.json")
        );
        assert_eq!(config.display, DisplayStyle::Html);
    }

    #[test]
    fn unknown_display_value_keeps_current_style() {
        let mut config = ClientConfig::from_toml_str("display = \"html\"").unwrap();

        config.apply_overrides(env(&[("ASK_DISPLAY", "markdown")]));

        assert_eq!(config.display, DisplayStyle::Html);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn unset_variables_change_nothing() {
        let mut config = ClientConfig::default();
        let before = config.state_dir.clone();

        config.apply_overrides(env(&[]));

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.state_dir, before);
        assert_eq!(config.display, DisplayStyle::Terminal);
    }

    #[test]
    fn display_style_parsing() {
        assert_eq!(DisplayStyle::parse(" HTML "), Some(DisplayStyle::Html));
        assert_eq!(DisplayStyle::parse("text"), Some(DisplayStyle::Terminal));
        assert_eq!(DisplayStyle::parse("markdown"), None);
    }
}
