/// Outcome of resolving a typed person reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedMention {
    Resolved { user_id: String, mention: String },
    Unresolved { original: String },
}

impl ResolvedMention {
    pub fn resolved(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self::Resolved { mention: format_mention(&user_id), user_id }
    }

    pub fn unresolved(original: impl Into<String>) -> Self {
        Self::Unresolved { original: original.into() }
    }

    /// Text to render for the person: a `<@ID>` mention, or the literal token when unresolved.
    pub fn mention_text(&self) -> &str {
        match self {
            Self::Resolved { mention, .. } => mention,
            Self::Unresolved { original } => original,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Resolved { user_id, .. } => Some(user_id),
            Self::Unresolved { .. } => None,
        }
    }
}

pub fn format_mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Returns the interior of a literal `<@U...>` mention, verbatim.
pub fn parse_exact_mention(token: &str) -> Option<&str> {
    if token.starts_with("<@U") && token.ends_with('>') {
        Some(&token[2..token.len() - 1])
    } else {
        None
    }
}
