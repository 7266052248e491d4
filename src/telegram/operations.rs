use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

/// Operation category of the Telegram Bot API surface.
///
/// Groups mirror the Bot API documentation sections. Each group carries the
/// closed catalog of operation names selectable under it; `Advanced`
/// (payments, games, passport) has no closed catalog and is driven entirely
/// through the payload override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationGroup {
    Register,
    Messages,
    Chat,
    Editing,
    StickersInline,
    Advanced,
    Settings,
}

impl OperationGroup {
    pub fn all() -> &'static [OperationGroup] {
        &[
            OperationGroup::Register,
            OperationGroup::Messages,
            OperationGroup::Chat,
            OperationGroup::Editing,
            OperationGroup::StickersInline,
            OperationGroup::Advanced,
            OperationGroup::Settings,
        ]
    }

    /// The wire tag used in configuration and templates
    pub fn tag(&self) -> &'static str {
        match self {
            OperationGroup::Register => "register",
            OperationGroup::Messages => "messages",
            OperationGroup::Chat => "chat",
            OperationGroup::Editing => "editing",
            OperationGroup::StickersInline => "stickers_inline",
            OperationGroup::Advanced => "advanced",
            OperationGroup::Settings => "settings",
        }
    }

    /// The closed catalog of operation names under this group
    pub fn operations(&self) -> &'static [&'static str] {
        match self {
            OperationGroup::Register => &["setWebhook"],
            OperationGroup::Messages => &[
                "sendMessage",
                "forwardMessage",
                "copyMessage",
                "sendPhoto",
                "sendAudio",
                "sendDocument",
                "sendVideo",
                "sendAnimation",
                "sendVoice",
                "sendVideoNote",
                "sendMediaGroup",
                "sendLocation",
                "sendVenue",
                "sendContact",
                "sendPoll",
                "sendDice",
                "sendChatAction",
            ],
            OperationGroup::Chat => &[
                "banChatMember",
                "unbanChatMember",
                "restrictChatMember",
                "promoteChatMember",
                "setChatPhoto",
                "deleteChatPhoto",
                "setChatTitle",
                "setChatDescription",
                "pinChatMessage",
                "unpinChatMessage",
                "unpinAllChatMessages",
                "leaveChat",
                "getChat",
            ],
            OperationGroup::Editing => &[
                "editMessageText",
                "editMessageCaption",
                "editMessageMedia",
                "editMessageReplyMarkup",
                "stopPoll",
                "deleteMessage",
            ],
            OperationGroup::StickersInline => &[
                "sendSticker",
                "getStickerSet",
                "createNewStickerSet",
                "answerInlineQuery",
                "answerWebAppQuery",
            ],
            OperationGroup::Advanced => &[],
            OperationGroup::Settings => &[
                "setMyCommands",
                "deleteMyCommands",
                "getMyCommands",
                "setMyName",
                "getMyName",
                "setMyDescription",
                "getMyDescription",
                "setMyShortDescription",
                "getMyShortDescription",
            ],
        }
    }

    /// Whether `operation` belongs to this group's catalog. Groups without
    /// a closed catalog accept any name.
    pub fn contains(&self, operation: &str) -> bool {
        let catalog = self.operations();
        catalog.is_empty() || catalog.contains(&operation)
    }
}

impl fmt::Display for OperationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for OperationGroup {
    type Err = UnknownOperationGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationGroup::all()
            .iter()
            .copied()
            .find(|group| group.tag() == s)
            .ok_or_else(|| UnknownOperationGroup(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown operation group: {0}")]
pub struct UnknownOperationGroup(String);

/// One selected operation: a group tag plus an operation name.
///
/// The operation name is forwarded verbatim into the outbound URL path; it
/// is never validated against the remote API. A name outside the local
/// catalog only produces a diagnostic.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationSelector {
    pub operation_group: OperationGroup,
    pub operation: String,
}

impl OperationSelector {
    /// The opaque operation name to forward, logging a diagnostic when the
    /// name is not part of the group's known catalog
    pub fn resolve(&self) -> &str {
        if !self.operation_group.contains(&self.operation) {
            warn!(
                operation_group = %self.operation_group,
                operation = %self.operation,
                "Operation is not in the group's known catalog, forwarding as-is"
            );
        }
        &self.operation
    }
}
