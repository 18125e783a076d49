use serde::{Deserialize, Serialize};

/// Slack's built-in system pseudo-user. Never a valid praise or feedback target.
pub const SYSTEM_USER_ID: &str = "USLACKBOT";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub id: String,
    pub display_name: String,
    pub real_name: String,
    pub username: String,
    pub is_deleted: bool,
    pub is_bot: bool,
}

impl MemberProfile {
    pub fn is_system_user(&self) -> bool {
        self.id == SYSTEM_USER_ID
    }

    /// Whether the profile may ever be chosen as a resolution target.
    pub fn is_resolvable(&self) -> bool {
        !self.is_system_user() && !self.is_deleted && !self.is_bot
    }

    /// Display name, real name and username joined by single spaces, lowercased.
    pub fn combined_name(&self) -> String {
        format!("{} {} {}", self.display_name, self.real_name, self.username).to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::{MemberProfile, SYSTEM_USER_ID};

    fn profile(id: &str) -> MemberProfile {
        MemberProfile {
            id: id.to_owned(),
            display_name: "Ariel".to_owned(),
            real_name: "Ariel Smith".to_owned(),
            username: "ariel.smith".to_owned(),
            ..MemberProfile::default()
        }
    }

    #[test]
    fn combined_name_joins_and_lowercases_all_three_names() {
        assert_eq!(profile("U1").combined_name(), "ariel ariel smith ariel.smith");
    }

    #[test]
    fn combined_name_keeps_separators_for_blank_fields() {
        let member = MemberProfile {
            id: "U2".to_owned(),
            username: "sam".to_owned(),
            ..MemberProfile::default()
        };
        assert_eq!(member.combined_name(), "  sam");
    }

    #[test]
    fn system_deleted_and_bot_profiles_are_not_resolvable() {
        assert!(profile("U1").is_resolvable());
        assert!(!profile(SYSTEM_USER_ID).is_resolvable());
        assert!(!MemberProfile { is_deleted: true, ..profile("U3") }.is_resolvable());
        assert!(!MemberProfile { is_bot: true, ..profile("U4") }.is_resolvable());
    }
}
