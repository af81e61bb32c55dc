//! Runtime configuration. Environment variables provide the defaults; the
//! serve command's flags override the bind address.

pub const DEFAULT_API_HOST: &str = "127.0.0.1";
pub const DEFAULT_API_PORT: u16 = 8700;
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5-coder:14b";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
    pub ollama_base_url: String,
    pub ollama_model: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            api_host: env_or("CAREERPILOT_API_HOST", DEFAULT_API_HOST),
            api_port: std::env::var("CAREERPILOT_API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_API_PORT),
            ollama_base_url: env_or("OLLAMA_BASE_URL", DEFAULT_OLLAMA_BASE_URL),
            ollama_model: env_or("OLLAMA_MODEL", DEFAULT_OLLAMA_MODEL),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
