/// One inbound slash command invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandFrame {
    pub command_name: String,
    pub raw_text: String,
    pub invoking_user_id: String,
    pub channel_id: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryMessage {
    pub text: String,
}

impl HistoryMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}
