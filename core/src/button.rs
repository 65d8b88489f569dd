//! Embeddable "Buffer" share button snippet.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

pub const BUTTON_STYLES: [&str; 3] = ["vertical", "horizontal", "none"];

const SCRIPT_TAG: &str = r#"<script type="text/javascript" src="//static.bufferapp.com/js/button.js"></script>"#;

/// Where the share counter is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Vertical,
    Horizontal,
    None,
}

impl ButtonStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonStyle::Vertical => "vertical",
            ButtonStyle::Horizontal => "horizontal",
            ButtonStyle::None => "none",
        }
    }
}

impl FromStr for ButtonStyle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertical" => Ok(ButtonStyle::Vertical),
            "horizontal" => Ok(ButtonStyle::Horizontal),
            "none" => Ok(ButtonStyle::None),
            _ => Err(ValidationError::InvalidButtonStyle { value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    style: ButtonStyle,
    text: Option<String>,
    url: Option<String>,
    via: Option<String>,
    picture: Option<String>,
}

impl Button {
    pub fn new(style: ButtonStyle) -> Self {
        Self {
            style,
            text: None,
            url: None,
            via: None,
            picture: None,
        }
    }

    pub fn vertical() -> Self {
        Self::new(ButtonStyle::Vertical)
    }

    pub fn horizontal() -> Self {
        Self::new(ButtonStyle::Horizontal)
    }

    pub fn none() -> Self {
        Self::new(ButtonStyle::None)
    }

    /// Pre-filled share text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Username credited with "via @username".
    pub fn via(mut self, username: impl Into<String>) -> Self {
        self.via = Some(username.into());
        self
    }

    pub fn picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"<a href="http://bufferapp.com/add" class="buffer-add-button" data-count="{}""#,
            self.style.as_str()
        )?;
        if let Some(text) = &self.text {
            write!(f, r#" data-text="{}""#, escape_html(text))?;
        }
        if let Some(url) = &self.url {
            write!(f, r#" data-url="{}""#, encode_component(url))?;
        }
        if let Some(via) = &self.via {
            write!(f, r#" data-via="{}""#, escape_html(via))?;
        }
        if let Some(picture) = &self.picture {
            write!(f, r#" data-picture="{}""#, encode_component(picture))?;
        }
        write!(f, ">Buffer</a>{SCRIPT_TAG}")
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

fn encode_component(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_button_markup() {
        assert_eq!(
            Button::vertical().render(),
            r#"<a href="http://bufferapp.com/add" class="buffer-add-button" data-count="vertical">Buffer</a><script type="text/javascript" src="//static.bufferapp.com/js/button.js"></script>"#
        );
    }

    #[test]
    fn each_style_sets_data_count() {
        assert!(Button::vertical().render().contains(r#"data-count="vertical""#));
        assert!(Button::horizontal().render().contains(r#"data-count="horizontal""#));
        assert!(Button::none().render().contains(r#"data-count="none""#));
    }

    #[test]
    fn styles_parse_from_text() {
        for style in BUTTON_STYLES {
            assert_eq!(style.parse::<ButtonStyle>().unwrap().as_str(), style);
        }
        assert_eq!(
            "ipalaus".parse::<ButtonStyle>().unwrap_err(),
            ValidationError::InvalidButtonStyle {
                value: "ipalaus".to_string()
            }
        );
    }

    #[test]
    fn optional_attributes_are_escaped() {
        assert!(Button::none().text("Isern Palaus").render().contains(r#"data-text="Isern Palaus""#));
        assert!(Button::none()
            .url("http://ipalaus.com")
            .render()
            .contains(r#"data-url="http%3A%2F%2Fipalaus.com""#));
        assert!(Button::none().via("ipalaus").render().contains(r#"data-via="ipalaus""#));
        assert!(Button::none()
            .picture("http://ipalaus.com")
            .render()
            .contains(r#"data-picture="http%3A%2F%2Fipalaus.com""#));
        assert!(Button::none()
            .text(r#"<b>"Tom & Jerry"</b>"#)
            .render()
            .contains(r#"data-text="&lt;b&gt;&quot;Tom &amp; Jerry&quot;&lt;/b&gt;""#));
    }

    #[test]
    fn attributes_render_in_fixed_order() {
        let html = Button::horizontal().picture("p").via("v").url("u").text("t").render();
        let positions: Vec<usize> = ["data-text", "data-url", "data-via", "data-picture"]
            .iter()
            .map(|attr| html.find(attr).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
