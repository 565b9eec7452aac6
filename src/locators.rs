//! Locator table for the WhatsApp Web markup.
//!
//! Every UI probe the client performs is resolved through this immutable
//! role-to-selector table, injected at construction so tests can point the
//! client at a fake DOM. The default selectors target the Portuguese-language
//! WhatsApp Web interface and are matched against the live page either as CSS
//! selectors or as XPath expressions (those starting with `//`). They are
//! brittle by nature: WhatsApp may change its markup without notice.

use std::borrow::Cow;
use std::collections::HashMap;

/// Logical roles the client resolves against the live page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiRole {
    /// Search field used to open a conversation by contact or group name.
    /// Its presence also marks an authenticated session.
    ConversationSearch,
    /// Editable message input of an open conversation. Its presence marks the
    /// conversation as open.
    MessageInput,
    /// Send button for plain text messages.
    SendButton,
    /// Send button on the attachment preview overlay. Distinct from
    /// [`UiRole::SendButton`].
    AttachmentSendButton,
    /// Transient clock icon displayed while a message is in flight; its
    /// detachment signals delivery from the UI's perspective.
    SendingIndicator,
    /// QR code canvas displayed when the session is not authenticated.
    QrCode,
    /// "Plus" icon that opens the attachment menu.
    AttachMenu,
    /// Attachment menu entry for generic documents.
    DocumentOption,
    /// Attachment menu entry for photos and images.
    ImageOption,
    /// Hidden file input revealed by the document option.
    DocumentFileInput,
    /// Hidden file input revealed by the image option.
    ImageFileInput,
}

impl UiRole {
    pub const ALL: [UiRole; 11] = [
        UiRole::ConversationSearch,
        UiRole::MessageInput,
        UiRole::SendButton,
        UiRole::AttachmentSendButton,
        UiRole::SendingIndicator,
        UiRole::QrCode,
        UiRole::AttachMenu,
        UiRole::DocumentOption,
        UiRole::ImageOption,
        UiRole::DocumentFileInput,
        UiRole::ImageFileInput,
    ];

    fn default_selector(self) -> &'static str {
        match self {
            UiRole::ConversationSearch => {
                "//div[@aria-placeholder='Pesquisar ou começar uma nova conversa']"
            }
            UiRole::MessageInput => {
                r#"//div[contains(@aria-label,"Digitar") or contains(@aria-label,"Digite")]"#
            }
            UiRole::SendButton => r#"//span[contains(@data-icon,"send")]"#,
            UiRole::AttachmentSendButton => r#"//div[@aria-label="Enviar"]"#,
            UiRole::SendingIndicator => r#"//span[@data-icon="msg-time"]"#,
            UiRole::QrCode => "canvas[aria-label='Scan this QR code to link a device!']",
            UiRole::AttachMenu => r#"span[data-icon="plus-rounded"]"#,
            UiRole::DocumentOption => r#"//div[contains(@aria-label,"Documento")]"#,
            UiRole::ImageOption => r#"//div[contains(@aria-label,"Fotos")]"#,
            UiRole::DocumentFileInput => "input[accept='*']",
            UiRole::ImageFileInput => "input[type='file']",
        }
    }
}

/// Immutable mapping from [`UiRole`] to an opaque selector string.
///
/// Never mutated after construction; [`LocatorSet::with_selector`] is a
/// builder-style override used before the table is handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorSet {
    selectors: HashMap<UiRole, Cow<'static, str>>,
}

impl Default for LocatorSet {
    fn default() -> Self {
        let selectors = UiRole::ALL
            .into_iter()
            .map(|role| (role, Cow::Borrowed(role.default_selector())))
            .collect();
        LocatorSet { selectors }
    }
}

impl LocatorSet {
    /// Replace the selector for a single role, consuming and returning the set.
    pub fn with_selector(mut self, role: UiRole, selector: impl Into<String>) -> Self {
        self.selectors.insert(role, Cow::Owned(selector.into()));
        self
    }

    /// Resolve the selector for a role.
    pub fn selector(&self, role: UiRole) -> &str {
        self.selectors
            .get(&role)
            .map(Cow::as_ref)
            .unwrap_or_else(|| role.default_selector())
    }
}
