//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Herald Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# Credentials come from the environment: GEMINI_API_KEY, TWILIO_ACCOUNT_SID,
# TWILIO_AUTH_TOKEN, TWILIO_WHATSAPP_FROM.

[assistant]
# model = "gemini-2.5-flash"
# max_output_tokens = 200      # 1-8192
# temperature = 0.7            # 0.0-2.0
# system_prompt = "You are a helpful AI assistant with access to tools."

[weather]
# base_url = "https://wttr.in"
# timeout_secs = 6             # 1-60

[notify]
# database_url = "sqlite://jobs.sqlite"
# send_timeout_secs = 15       # 1-120
# heartbeat_secs = 30          # 5-3600
# twilio_api_base = "https://api.twilio.com"

[scheduler]
# max_workers = 10             # 1-64
# max_instances = 3            # 1-16
# coalesce = false
# misfire_grace_secs = 86400   # run jobs up to a day late
# poll_interval_ms = 1000      # 50-60000

[logging]
# level = "info"               # trace, debug, info, warn, error
"##
    .to_string()
}
