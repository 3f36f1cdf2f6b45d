#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert!(config.rules.table_path.is_none());
        assert!(!config.rules.replace_builtin);
        assert!(config.model.artifacts_path.is_none());
        assert_eq!(config.llm.mode, LlmMode::Disabled);
        assert_eq!(config.logging.filter, "pharmaguard=info,warn");
    }

    #[test]
    fn test_default_llm_is_disabled() {
        assert_eq!(LlmConfig::default().mode, LlmMode::Disabled);
        assert_eq!(default_api_key_env(), "PHARMAGUARD_OPENAI_API_KEY");
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml_str(
            r#"
            [rules]
            table_path = "rules/site.yaml"

            [model]
            artifacts_path = "model/artifacts.json"

            [llm]
            mode = "openai"
            model = "gpt-4o"
            "#,
        )
        .unwrap();

        assert_eq!(config.rules.table_path.as_deref(), Some("rules/site.yaml"));
        assert_eq!(config.model.artifacts_path.as_deref(), Some("model/artifacts.json"));
        assert_eq!(config.llm.mode, LlmMode::OpenAi);
        assert_eq!(config.llm.model_name(), "gpt-4o");
        assert!(config.llm.base_url.is_none());
        assert_eq!(config.llm.max_tokens, 1024);
        assert_eq!(config.llm.timeout_secs, 30);
    }

    #[test]
    fn test_model_default_follows_mode() {
        let ollama = Config::from_toml_str("[llm]\nmode = \"ollama\"\n").unwrap();
        assert_eq!(ollama.llm.model_name(), DEFAULT_OLLAMA_MODEL);
        assert_eq!(ollama.llm.ollama_base_url(), "http://localhost:11434");

        let openai = Config::from_toml_str("[llm]\nmode = \"openai\"\n").unwrap();
        assert_eq!(openai.llm.model_name(), DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn test_base_url_override() {
        let config = Config::from_toml_str(
            r#"
            [llm]
            mode = "openai"
            base_url = "https://openrouter.ai/api"
            "#,
        )
        .unwrap();
        assert_eq!(config.llm.base_url.as_deref(), Some("https://openrouter.ai/api"));
        assert_eq!(config.llm.model_name(), DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn test_unknown_llm_mode_rejected() {
        assert!(Config::from_toml_str("[llm]\nmode = \"gemini\"\n").is_err());
    }
}
