use serde::Serialize;

pub const PING_TRIGGER: &str = "!ping";
pub const PING_COMMAND: &str = "ping";
pub const PONG_REPLY: &str = "pong 🏓";

/// Declarative slash-command registration payload, applied in bulk via
/// `RestClient::register_commands`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ApplicationCommand {
    pub name: String,
    pub description: String,
}

impl ApplicationCommand {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into() }
    }
}

pub fn default_commands() -> Vec<ApplicationCommand> {
    vec![ApplicationCommand::new(PING_COMMAND, "Sprawdza, czy bot żyje")]
}

#[cfg(test)]
mod tests {
    use super::default_commands;

    #[test]
    fn default_commands_serialize_to_registration_payload() {
        let value = serde_json::to_value(default_commands()).expect("serialize");
        assert_eq!(value[0]["name"], "ping");
        assert!(value[0]["description"].as_str().is_some_and(|text| !text.is_empty()));
    }
}
