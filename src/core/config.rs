use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub storage_path: String,
    pub session_path: String,
    pub drafts_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api_base_url = env::var("HUDDLE_API_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:4001".to_string());
        let storage_path = env::var("HUDDLE_STORAGE_PATH").unwrap_or("./".to_string());
        let root = storage_path.trim_end_matches('/').to_string();
        let session_path = format!("{}/session.json", root);
        let drafts_path = format!("{}/drafts.json", root);

        Self {
            api_base_url,
            storage_path,
            session_path,
            drafts_path,
        }
    }
}
