use armplan_core::analyzer::TaskAnalyzer;
use armplan_core::config::Config;
use std::sync::Arc;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub analyzer: TaskAnalyzer,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            analyzer: TaskAnalyzer::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_stores_config() {
        let config = Config {
            default_ai_model: "openai".into(),
            ..Config::default()
        };
        let state = AppState::new(config);
        assert_eq!(state.config.default_ai_model, "openai");
    }
}
