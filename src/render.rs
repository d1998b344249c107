// src/render.rs
//! Reply selection and placeholder substitution.
//!
//! Supported tokens: `{mention}`, `{username}`, `{userid}`, `{content}`.
//! Unknown `{tokens}` are left as they are.

use rand::Rng;

use crate::message::InboundMessage;

/// Platform mention markup for a user id.
pub fn mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Substitute all known tokens, applied in the order listed in the module docs.
pub fn render_template(tpl: &str, msg: &InboundMessage) -> String {
    tpl.replace("{mention}", &mention(&msg.author_id))
        .replace("{username}", msg.author_name.as_deref().unwrap_or_default())
        .replace("{userid}", &msg.author_id)
        .replace("{content}", msg.text())
}

/// Uniform pick; `None` for an empty list.
pub fn pick_reply<'a, R: Rng>(replies: &'a [String], rng: &mut R) -> Option<&'a str> {
    if replies.is_empty() {
        return None;
    }
    let i = rng.random_range(0..replies.len());
    replies.get(i).map(String::as_str)
}
