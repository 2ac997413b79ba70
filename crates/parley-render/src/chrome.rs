//! Container, bubble and button presentation derived from config.

use parley_core::config::{ButtonConfig, ButtonIcon, Config, IconPosition, StyleMap, Theme};
use parley_types::Role;
use serde::Serialize;

fn style(pairs: &[(&str, &str)]) -> StyleMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// `base` with `overrides` applied on top.
fn merged(mut base: StyleMap, overrides: &StyleMap) -> StyleMap {
    base.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    base
}

pub fn default_user_bubble_style() -> StyleMap {
    style(&[
        ("backgroundColor", "#007bff"),
        ("color", "white"),
        ("marginLeft", "auto"),
        ("textAlign", "right"),
    ])
}

pub fn default_assistant_bubble_style() -> StyleMap {
    style(&[
        ("backgroundColor", "#f1f0f0"),
        ("color", "black"),
        ("marginRight", "auto"),
        ("textAlign", "left"),
    ])
}

/// Resolved presentation for one mounted chat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chrome {
    pub container_class: String,
    pub container_style: StyleMap,
    pub input_container_style: StyleMap,
    pub input_style: StyleMap,
    pub user_bubble_style: StyleMap,
    pub assistant_bubble_style: StyleMap,
    pub placeholder: String,
    /// The clear-chat menu only exists when transcripts are persisted.
    pub show_clear_action: bool,
}

impl Chrome {
    pub fn from_config(config: &Config) -> Self {
        let mut container = style(&[
            ("height", if config.fill_height { "100%" } else { "50%" }),
            ("width", if config.fill_width { "auto" } else { "50%" }),
        ]);
        let mut input = StyleMap::new();

        let (theme_container, theme_input) = match config.theme {
            Theme::Dark => (
                style(&[
                    ("backgroundColor", "#161618"),
                    ("borderColor", "#444444"),
                    ("color", "#ffffff"),
                ]),
                style(&[("borderColor", "#f1f0f0"), ("color", "#000000")]),
            ),
            Theme::Light => (
                style(&[
                    ("backgroundColor", "#ffffff"),
                    ("borderColor", "#e0e0e0"),
                    ("color", "#e0e0e0"),
                ]),
                style(&[("borderColor", "#e0e0e0")]),
            ),
        };
        container.extend(theme_container);
        input.extend(theme_input);

        let container_class = format!("chat-container {}", config.class_name)
            .trim_end()
            .to_string();

        Self {
            container_class,
            container_style: merged(container, &config.container_style),
            input_container_style: config.input_container_style.clone(),
            input_style: merged(input, &config.input_text_style),
            user_bubble_style: merged(default_user_bubble_style(), &config.user_bubble_style),
            assistant_bubble_style: merged(
                default_assistant_bubble_style(),
                &config.assistant_bubble_style,
            ),
            placeholder: config.input_placeholder.clone(),
            show_clear_action: config.persistence,
        }
    }

    /// Bubble style for a role; anything but `user` gets the assistant style.
    pub fn bubble_style(&self, role: Role) -> &StyleMap {
        match role {
            Role::User => &self.user_bubble_style,
            Role::Assistant | Role::Unknown => &self.assistant_bubble_style,
        }
    }
}

/// One visual piece of a button, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPart<'a> {
    IconLeft(ButtonIcon),
    Label(&'a str),
    IconRight(ButtonIcon),
    IconOnly(ButtonIcon),
}

/// Lays out a button: the label shows unless the position is `only`; the
/// icon goes where `icon_position` says, if there is one.
pub fn button_parts(config: &ButtonConfig) -> Vec<ButtonPart<'_>> {
    let mut parts = Vec::new();
    if let Some(icon) = config.icon
        && config.icon_position == IconPosition::Left
    {
        parts.push(ButtonPart::IconLeft(icon));
    }
    if config.icon_position != IconPosition::Only {
        parts.push(ButtonPart::Label(&config.label));
    }
    if let Some(icon) = config.icon {
        match config.icon_position {
            IconPosition::Right => parts.push(ButtonPart::IconRight(icon)),
            IconPosition::Only => parts.push(ButtonPart::IconOnly(icon)),
            IconPosition::Left => {}
        }
    }
    parts
}

/// Short textual stand-in for an icon.
pub fn icon_glyph(icon: ButtonIcon) -> &'static str {
    match icon {
        ButtonIcon::PaperPlaneHorizontal | ButtonIcon::PaperPlane => "➤",
        ButtonIcon::Folder => "📁",
        ButtonIcon::File => "📄",
        ButtonIcon::Paperclip => "📎",
    }
}
