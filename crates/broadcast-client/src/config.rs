use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub realtime: RealtimeConfig,
    pub auth: AuthConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    pub ws_base_url: String,

    #[serde(default = "default_protocol_error_budget")]
    pub protocol_error_budget: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_path")]
    pub token_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_history_cap")]
    pub history_cap: usize,

    #[serde(default = "default_chat_max_message_len")]
    pub max_message_len: usize,
}

// Default value functions
fn default_api_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_ws_base_url() -> String {
    "ws://localhost:8080".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_protocol_error_budget() -> u32 {
    8
}

fn default_token_path() -> String {
    ".broadcast/token.json".to_string()
}

fn default_chat_history_cap() -> usize {
    100
}

fn default_chat_max_message_len() -> usize {
    500
}

impl ClientConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let api = ApiConfig {
            base_url: env::var("BROADCAST_API_URL").unwrap_or_else(|_| default_api_base_url()),
            request_timeout_secs: env::var("BROADCAST_API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_request_timeout_secs),
            connect_timeout_secs: env::var("BROADCAST_API_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_connect_timeout_secs),
        };

        let realtime = RealtimeConfig {
            ws_base_url: env::var("BROADCAST_WS_URL").unwrap_or_else(|_| default_ws_base_url()),
            protocol_error_budget: env::var("BROADCAST_PROTOCOL_ERROR_BUDGET")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_protocol_error_budget),
        };

        let auth = AuthConfig {
            token_path: env::var("BROADCAST_TOKEN_PATH").unwrap_or_else(|_| default_token_path()),
        };

        let chat = ChatConfig {
            history_cap: env::var("BROADCAST_CHAT_HISTORY_CAP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_chat_history_cap),
            max_message_len: env::var("BROADCAST_CHAT_MAX_MESSAGE_LEN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_chat_max_message_len),
        };

        ClientConfig {
            api,
            realtime,
            auth,
            chat,
        }
    }
}
