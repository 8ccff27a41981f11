//! Shared test utilities and arbitrary generators for property-based testing.

use crate::webhooks::{Repository, Sender, WebhookEvent};
use proptest::prelude::*;

pub fn arb_login() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9-]{0,38}".prop_map(String::from)
}

pub fn arb_sender() -> impl Strategy<Value = Sender> {
    (
        any::<u64>(),
        arb_login(),
        prop_oneof![Just("User"), Just("Bot"), Just("Organization")],
    )
        .prop_map(|(id, login, kind)| Sender {
            id,
            avatar_url: format!("https://avatars.githubusercontent.com/u/{}", id),
            html_url: format!("https://github.com/{}", login),
            login,
            account_type: kind.to_string(),
        })
}

pub fn arb_repository() -> impl Strategy<Value = Repository> {
    (any::<u64>(), arb_login(), "[a-zA-Z0-9._-]{1,40}", any::<bool>()).prop_map(
        |(id, owner, name, private)| Repository {
            id,
            full_name: format!("{}/{}", owner, name),
            html_url: format!("https://github.com/{}/{}", owner, name),
            name,
            private,
        },
    )
}

pub fn arb_git_ref() -> impl Strategy<Value = String> {
    prop_oneof![
        "refs/heads/[a-z][a-z0-9/-]{0,30}".prop_map(String::from),
        "refs/tags/v[0-9]{1,2}\\.[0-9]{1,2}\\.[0-9]{1,2}".prop_map(String::from),
        Just(String::new()),
    ]
}

pub fn arb_webhook_event() -> impl Strategy<Value = WebhookEvent> {
    (arb_sender(), arb_repository(), arb_git_ref()).prop_map(|(sender, repository, git_ref)| {
        WebhookEvent {
            sender,
            repository,
            git_ref,
        }
    })
}

/// Room identifiers in the `!opaque:server` form.
pub fn arb_room_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("![a-zA-Z]{6,18}:[a-z]{3,10}\\.org", 1..6)
}
