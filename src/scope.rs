// src/scope.rs
use crate::message::InboundMessage;
use crate::rules::Where;

impl Where {
    /// Deny lists are checked before allow lists; an empty allow list is "allow all".
    pub fn permits(&self, msg: &InboundMessage) -> bool {
        let channel = msg.channel_id.as_str();
        let user = msg.author_id.as_str();
        let roles = &msg.role_ids;

        if contains(&self.deny_channels, channel) || contains(&self.deny_users, user) {
            return false;
        }
        if roles.iter().any(|r| contains(&self.deny_roles, r)) {
            return false;
        }
        if !self.allow_channels.is_empty() && !contains(&self.allow_channels, channel) {
            return false;
        }
        if !self.allow_users.is_empty() && !contains(&self.allow_users, user) {
            return false;
        }
        if !self.allow_roles.is_empty() && !roles.iter().any(|r| contains(&self.allow_roles, r)) {
            return false;
        }
        true
    }
}

fn contains(list: &[String], needle: &str) -> bool {
    list.iter().any(|x| x == needle)
}
