//! Inline style builder for native elements

use core::fmt;

/// An ordered list of CSS declarations rendered into a `style` attribute.
///
/// Property names may be given in camelCase (`backgroundColor`) or kebab-case;
/// they are stored kebab-case. Setting a property twice keeps its first position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Style {
    properties: Vec<(String, String)>,
}

impl Style {
    /// Create a new empty style
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a CSS property
    #[must_use]
    pub fn set(mut self, property: impl AsRef<str>, value: impl Into<String>) -> Self {
        let name = kebab_case(property.as_ref());
        let value = value.into();
        if let Some(slot) = self.properties.iter_mut().find(|(prop, _)| *prop == name) {
            slot.1 = value;
        } else {
            self.properties.push((name, value));
        }
        self
    }

    // Common properties with type-safe methods

    #[must_use]
    pub fn padding(self, value: impl Into<String>) -> Self {
        self.set("padding", value)
    }

    #[must_use]
    pub fn margin(self, value: impl Into<String>) -> Self {
        self.set("margin", value)
    }

    #[must_use]
    pub fn margin_bottom(self, value: impl Into<String>) -> Self {
        self.set("margin-bottom", value)
    }

    #[must_use]
    pub fn background_color(self, value: impl Into<String>) -> Self {
        self.set("background-color", value)
    }

    #[must_use]
    pub fn color(self, value: impl Into<String>) -> Self {
        self.set("color", value)
    }

    #[must_use]
    pub fn font_size(self, value: impl Into<String>) -> Self {
        self.set("font-size", value)
    }

    #[must_use]
    pub fn font_weight(self, value: impl Into<String>) -> Self {
        self.set("font-weight", value)
    }

    #[must_use]
    pub fn border(self, value: impl Into<String>) -> Self {
        self.set("border", value)
    }

    #[must_use]
    pub fn border_radius(self, value: impl Into<String>) -> Self {
        self.set("border-radius", value)
    }

    #[must_use]
    pub fn display(self, value: impl Into<String>) -> Self {
        self.set("display", value)
    }

    #[must_use]
    pub fn gap(self, value: impl Into<String>) -> Self {
        self.set("gap", value)
    }

    #[must_use]
    pub fn cursor(self, value: impl Into<String>) -> Self {
        self.set("cursor", value)
    }

    #[must_use]
    pub fn text_align(self, value: impl Into<String>) -> Self {
        self.set("text-align", value)
    }

    #[must_use]
    pub fn list_style(self, value: impl Into<String>) -> Self {
        self.set("list-style", value)
    }

    /// Declarations in insertion order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(prop, val)| (prop.as_str(), val.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Convert to inline style attribute string
    pub fn to_inline(&self) -> String {
        self.properties
            .iter()
            .map(|(prop, val)| format!("{prop}: {val};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_inline())
    }
}

fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Macro to create styles more concisely
#[macro_export]
macro_rules! style {
    ($($prop:ident: $val:expr),* $(,)?) => {
        {
            let style = $crate::Style::new();
            $(
                let style = style.$prop($val);
            )*
            style
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_properties_render_kebab_case() {
        let style = Style::new()
            .set("backgroundColor", "red")
            .padding("4px")
            .set("background-color", "blue");
        assert_eq!(style.to_inline(), "background-color: blue; padding: 4px;");
    }

    #[test]
    fn macro_builds_in_order() {
        let style = crate::style! { color: "white", font_size: "12px" };
        assert_eq!(style.to_string(), "color: white; font-size: 12px;");
    }
}
