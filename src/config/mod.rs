use serde::{Deserialize, Serialize};

const DEFAULT_SUPABASE_URL: &str = "http://localhost:54321";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_AUTOSAVE_MS: i32 = 800;

/// Runtime configuration injected by the host page as `window.ENV`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub(crate) struct EnvConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub log_level: String,
    /// Per-note debounce before an edit is pushed to the backend.
    pub autosave_ms: i32,
}

impl EnvConfig {
    pub fn new() -> Self {
        let env = web_sys::window()
            .and_then(|w| w.get("ENV"))
            .filter(|env| !env.is_undefined() && env.is_object());

        match env {
            Some(env) => Self::from_lookup(|key| {
                js_sys::Reflect::get(&env, &wasm_bindgen::JsValue::from_str(key))
                    .ok()
                    .and_then(|v| v.as_string().or_else(|| v.as_f64().map(|n| n.to_string())))
            }),
            None => Self::from_lookup(|_| None),
        }
    }

    /// Resolves every setting through `lookup`.
    ///
    /// Both `SUPABASE_URL` (documented style) and `supabase_url` (legacy) spellings are accepted;
    /// the upper-case key wins when both are present.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(&key.to_uppercase())
                .or_else(|| lookup(&key.to_lowercase()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let supabase_url = get("supabase_url")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SUPABASE_URL.to_string());

        let autosave_ms = get("autosave_ms")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as i32)
            .unwrap_or(DEFAULT_AUTOSAVE_MS);

        Self {
            supabase_url,
            supabase_anon_key: get("supabase_anon_key").unwrap_or_default(),
            log_level: get("log_level").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            autosave_ms,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new()
    }
}
