//! Command processing - parses pending bot messages and applies them to the
//! channel registry and the subscriber list.

use crate::resolver::{self, PageFetcher};
use crate::store::{BotState, ChannelRegistry};
use crate::telegram::{IncomingUpdate, Outgoing};

/// Parsed bot command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// Channel id, channel URL or handle
    Add { name: String, target: String },
    AddRss { name: String, url: String },
    AddUrl { name: String, url: String },
    Remove { name: String },
    List,
    /// Anything unrecognised; `looks_like_url` selects the `/addurl` hint
    Other { looks_like_url: bool },
}

/// Whitespace split into at most three tokens; the last keeps inner whitespace
fn split3(text: &str) -> Vec<&str> {
    let mut parts = Vec::with_capacity(3);
    let mut rest = text.trim();
    while !rest.is_empty() {
        if parts.len() == 2 {
            parts.push(rest);
            break;
        }
        match rest.split_once(char::is_whitespace) {
            Some((head, tail)) => {
                parts.push(head);
                rest = tail.trim_start();
            }
            None => {
                parts.push(rest);
                break;
            }
        }
    }
    parts
}

impl Command {
    pub fn parse(text: &str) -> Command {
        let parts = split3(text);
        let Some(first) = parts.first() else {
            return Command::Other {
                looks_like_url: false,
            };
        };

        // `/list@my_bot` in group chats
        let cmd = first.split('@').next().unwrap_or_default().to_lowercase();
        let arg = |i: usize| parts.get(i).map(|s| s.to_string());

        match (cmd.as_str(), arg(1), arg(2)) {
            ("/start" | "start", _, _) => Command::Start,
            ("/help" | "help", _, _) => Command::Help,
            ("/add", Some(name), Some(target)) => Command::Add { name, target },
            ("/addrss", Some(name), Some(url)) => Command::AddRss { name, url },
            ("/addurl", Some(name), Some(url)) => Command::AddUrl { name, url },
            ("/remove" | "/rm", Some(name), _) => Command::Remove { name },
            ("/list", _, _) => Command::List,
            _ => Command::Other {
                looks_like_url: first.starts_with("http://") || first.starts_with("https://"),
            },
        }
    }
}

pub const START_REPLY: &str = "You are subscribed! Use /add <name> <channel_id> or /addurl <name> <youtube_url> to add a channel.";

pub const HELP_REPLY: &str = "Commands:
/start - Subscribe
/add <name> <channel_id> - Add directly by channel id (UC...)
/addrss <name> <rss_url> - Add by RSS URL
/addurl <name> <youtube_url> - Add by any YouTube link or handle
/remove <name> - Remove channel
/list - Show tracked channels";

pub const URL_HINT_REPLY: &str = "Use /addurl <name> <youtube_url> to add by link.";

pub const ADD_URL_FAILED_REPLY: &str = "Failed to extract channel id from the URL. Try /add <name> <channel_id> or paste the standard channel link.";

pub fn add_failed_reply(target: &str) -> String {
    format!("Could not find a channel id for '{target}'. Use /add <name> <channel_id> with an id starting with UC.")
}

pub fn list_reply(registry: &ChannelRegistry) -> String {
    if registry.is_empty() {
        return "No channels tracked yet.".to_string();
    }
    let lines = registry
        .iter()
        .map(|(name, url)| format!("{name}: {url}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Tracked channels:\n{lines}")
}

/// Result of one batch of updates
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub registry: ChannelRegistry,
    pub bot_state: BotState,
    pub replies: Vec<Outgoing>,
    pub changed: bool,
}

/// Apply one command for `chat_id`, returning the reply if there is one
async fn execute<F: PageFetcher>(
    fetcher: &F,
    command: Command,
    chat_id: i64,
    out: &mut CommandOutcome,
) -> Option<String> {
    match command {
        Command::Start => {
            if out.bot_state.subscribers.insert(chat_id) {
                log::info!("New subscriber {chat_id}");
                out.changed = true;
            }
            Some(START_REPLY.to_string())
        }
        Command::Help => Some(HELP_REPLY.to_string()),
        Command::Add { name, target } => match resolver::resolve(fetcher, &target).await {
            Some(id) => {
                let feed = id.feed_url();
                let reply = format!("Added channel: {name}\n{feed}");
                out.registry.insert(name, feed);
                out.changed = true;
                Some(reply)
            }
            None => Some(add_failed_reply(&target)),
        },
        Command::AddRss { name, url } => {
            let reply = format!("Added RSS: {name} -> {url}");
            out.registry.insert(name, url);
            out.changed = true;
            Some(reply)
        }
        Command::AddUrl { name, url } => match resolver::resolve(fetcher, &url).await {
            Some(id) => {
                let feed = id.feed_url();
                let reply = format!("Added channel: {name}\n{feed}");
                out.registry.insert(name, feed);
                out.changed = true;
                Some(reply)
            }
            None => Some(ADD_URL_FAILED_REPLY.to_string()),
        },
        Command::Remove { name } => {
            if out.registry.remove(&name).is_some() {
                out.changed = true;
                Some(format!("Removed channel: {name}"))
            } else {
                Some(format!("Channel '{name}' not found."))
            }
        }
        Command::List => Some(list_reply(&out.registry)),
        Command::Other { looks_like_url } => looks_like_url.then(|| URL_HINT_REPLY.to_string()),
    }
}

/// Process a batch of pending updates against the loaded snapshots.
///
/// Updates at or below the stored sequence number are skipped, so a batch
/// delivered twice is applied once. The stored sequence number ends at the
/// highest update id seen.
pub async fn process<F: PageFetcher>(
    fetcher: &F,
    updates: &[IncomingUpdate],
    registry: &ChannelRegistry,
    bot_state: &BotState,
) -> CommandOutcome {
    let mut out = CommandOutcome {
        registry: registry.clone(),
        bot_state: bot_state.clone(),
        replies: Vec::new(),
        changed: false,
    };

    for update in updates {
        if update.update_id <= bot_state.last_update_id {
            log::debug!("Skipping already handled update {}", update.update_id);
            continue;
        }
        out.bot_state.last_update_id = out.bot_state.last_update_id.max(update.update_id);

        let (Some(chat_id), Some(text)) = (update.chat_id, update.text.as_deref()) else {
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }

        let command = Command::parse(text);
        log::info!("{chat_id}: {command:?}");
        if let Some(reply) = execute(fetcher, command, chat_id, &mut out).await {
            out.replies.push(Outgoing::new(chat_id, reply));
        }
    }

    if out.bot_state.last_update_id != bot_state.last_update_id {
        out.changed = true;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::tests::{FakePages, ID};

    fn text_update(update_id: i64, chat_id: i64, text: &str) -> IncomingUpdate {
        IncomingUpdate {
            update_id,
            chat_id: Some(chat_id),
            text: Some(text.to_string()),
        }
    }

    async fn run(updates: &[IncomingUpdate], registry: &ChannelRegistry) -> CommandOutcome {
        process(&FakePages::failing(), updates, registry, &BotState::default()).await
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("START"), Command::Start);
        assert_eq!(Command::parse("/help@ytwatch_bot"), Command::Help);
        assert_eq!(Command::parse("/list"), Command::List);
        assert_eq!(
            Command::parse("/rm news"),
            Command::Remove {
                name: "news".into()
            }
        );
        assert_eq!(
            Command::parse("/addrss blog   https://blog.example/feed.xml"),
            Command::AddRss {
                name: "blog".into(),
                url: "https://blog.example/feed.xml".into()
            }
        );
    }

    #[test]
    fn third_token_keeps_inner_whitespace() {
        assert_eq!(split3("  /add  name  a b  c "), vec!["/add", "name", "a b  c"]);
        assert_eq!(split3("/list"), vec!["/list"]);
        assert!(split3("   ").is_empty());
    }

    #[test]
    fn wrong_arity_falls_through() {
        assert_eq!(
            Command::parse("/add onlyname"),
            Command::Other {
                looks_like_url: false
            }
        );
        assert_eq!(
            Command::parse("/remove"),
            Command::Other {
                looks_like_url: false
            }
        );
        assert_eq!(
            Command::parse("https://youtube.com/@someone please"),
            Command::Other {
                looks_like_url: true
            }
        );
    }

    #[tokio::test]
    async fn add_with_canonical_id_builds_feed_url() {
        let pages = FakePages::failing();
        let updates = [text_update(1, 10, &format!("/add news {ID}"))];
        let out = process(&pages, &updates, &ChannelRegistry::new(), &BotState::default()).await;

        assert_eq!(
            out.registry.get("news").map(String::as_str),
            Some(format!("https://www.youtube.com/feeds/videos.xml?channel_id={ID}").as_str())
        );
        assert_eq!(pages.calls.get(), 0);
        assert!(out.changed);
        assert_eq!(
            out.replies,
            vec![Outgoing::new(
                10,
                format!("Added channel: news\nhttps://www.youtube.com/feeds/videos.xml?channel_id={ID}")
            )]
        );
    }

    #[tokio::test]
    async fn add_resolves_urls_through_the_page() {
        let pages = FakePages::serving(&format!(r#"{{"externalId":"{ID}"}}"#));
        let updates = [text_update(1, 10, "/add news https://www.youtube.com/@news")];
        let out = process(&pages, &updates, &ChannelRegistry::new(), &BotState::default()).await;
        assert!(out.registry["news"].ends_with(ID));
        assert_eq!(pages.calls.get(), 1);
    }

    #[tokio::test]
    async fn unresolvable_add_replies_failure() {
        let updates = [
            text_update(1, 10, "/add news notachannel"),
            text_update(2, 10, "/addurl news https://www.youtube.com/@ghost"),
        ];
        let out = run(&updates, &ChannelRegistry::new()).await;
        assert!(out.registry.is_empty());
        assert_eq!(out.replies.len(), 2);
        assert!(out.replies[0].text.contains("notachannel"));
        assert_eq!(out.replies[1].text, ADD_URL_FAILED_REPLY);
    }

    #[tokio::test]
    async fn addurl_with_channel_path_needs_no_fetch() {
        let pages = FakePages::failing();
        let updates = [text_update(
            3,
            10,
            &format!("/addurl talks https://www.youtube.com/channel/{ID}/videos"),
        )];
        let out = process(&pages, &updates, &ChannelRegistry::new(), &BotState::default()).await;
        assert!(out.registry["talks"].ends_with(ID));
        assert_eq!(pages.calls.get(), 0);
    }

    #[tokio::test]
    async fn addrss_overwrites_existing_name() {
        let mut registry = ChannelRegistry::new();
        registry.insert("blog".into(), "https://old.example/feed".into());
        let updates = [text_update(1, 10, "/addrss blog https://new.example/feed")];
        let out = run(&updates, &registry).await;
        assert_eq!(out.registry["blog"], "https://new.example/feed");
        assert_eq!(out.replies[0].text, "Added RSS: blog -> https://new.example/feed");
    }

    #[tokio::test]
    async fn remove_absent_name_is_not_found() {
        let mut registry = ChannelRegistry::new();
        registry.insert("keep".into(), "https://feed.example".into());
        let updates = [text_update(1, 10, "/remove ghost")];
        let out = run(&updates, &registry).await;
        assert_eq!(out.registry, registry);
        assert_eq!(out.replies[0].text, "Channel 'ghost' not found.");
    }

    #[tokio::test]
    async fn remove_present_name() {
        let mut registry = ChannelRegistry::new();
        registry.insert("gone".into(), "https://feed.example".into());
        let out = run(&[text_update(1, 10, "/remove gone")], &registry).await;
        assert!(out.registry.is_empty());
        assert_eq!(out.replies[0].text, "Removed channel: gone");
    }

    #[tokio::test]
    async fn list_replies() {
        let out = run(&[text_update(1, 10, "/list")], &ChannelRegistry::new()).await;
        assert_eq!(out.replies[0].text, "No channels tracked yet.");

        let mut registry = ChannelRegistry::new();
        registry.insert("b".into(), "https://b.example".into());
        registry.insert("a".into(), "https://a.example".into());
        let out = run(&[text_update(1, 10, "/list")], &registry).await;
        assert_eq!(
            out.replies[0].text,
            "Tracked channels:\na: https://a.example\nb: https://b.example"
        );
    }

    #[tokio::test]
    async fn start_subscribes_once() {
        let updates = [text_update(1, 10, "/start"), text_update(2, 10, "/start")];
        let out = run(&updates, &ChannelRegistry::new()).await;
        assert_eq!(out.bot_state.subscribers.len(), 1);
        assert!(out.bot_state.subscribers.contains(&10));
        assert_eq!(out.replies.len(), 2);
        assert_eq!(out.replies[0].text, START_REPLY);
    }

    #[tokio::test]
    async fn unknown_text_is_silent_except_urls() {
        let updates = [
            text_update(1, 10, "hello there"),
            text_update(2, 10, "/frobnicate"),
            text_update(3, 10, "https://www.youtube.com/@someone"),
        ];
        let out = run(&updates, &ChannelRegistry::new()).await;
        assert_eq!(out.replies, vec![Outgoing::new(10, URL_HINT_REPLY)]);
    }

    #[tokio::test]
    async fn sequence_number_tracks_maximum_seen() {
        let updates = [
            text_update(7, 10, "/help"),
            IncomingUpdate {
                update_id: 12,
                chat_id: Some(10),
                text: None,
            },
            text_update(9, 11, "/help"),
        ];
        let out = run(&updates, &ChannelRegistry::new()).await;
        assert_eq!(out.bot_state.last_update_id, 12);
        assert_eq!(out.replies.len(), 2);
        assert!(out.changed);
    }

    #[tokio::test]
    async fn empty_batch_changes_nothing() {
        let state = BotState {
            last_update_id: 40,
            ..Default::default()
        };
        let out = process(&FakePages::failing(), &[], &ChannelRegistry::new(), &state).await;
        assert_eq!(out.bot_state.last_update_id, 40);
        assert!(!out.changed);
    }

    #[tokio::test]
    async fn redelivered_updates_are_not_reapplied() {
        let state = BotState {
            last_update_id: 5,
            ..Default::default()
        };
        let updates = [text_update(5, 10, "/addrss x https://x.example"), text_update(6, 10, "/list")];
        let out = process(&FakePages::failing(), &updates, &ChannelRegistry::new(), &state).await;
        assert!(out.registry.is_empty());
        assert_eq!(out.bot_state.last_update_id, 6);
        assert_eq!(out.replies[0].text, "No channels tracked yet.");
    }
}
