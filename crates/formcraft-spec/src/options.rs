use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Paper size of the printed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// Value for the CSS `@page { size }` descriptor.
    pub fn css_size(&self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::Letter => "letter",
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            other => Err(format!("unknown page size '{}'", other)),
        }
    }
}

/// Knobs for the static (view / print) presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Blank rows printed for a repeater with no stored entries.
    #[serde(default = "default_placeholder_rows")]
    pub placeholder_rows: usize,
    /// Blank body rows printed under a table header.
    #[serde(default = "default_table_rows")]
    pub table_rows: usize,
    #[serde(default)]
    pub page: PageSize,
}

fn default_placeholder_rows() -> usize {
    3
}

fn default_table_rows() -> usize {
    5
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            placeholder_rows: default_placeholder_rows(),
            table_rows: default_table_rows(),
            page: PageSize::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let options: RenderOptions = serde_json::from_str(r#"{ "page": "letter" }"#).unwrap();
        assert_eq!(options.page, PageSize::Letter);
        assert_eq!(options.placeholder_rows, 3);
        assert_eq!(options.table_rows, 5);
    }

    #[test]
    fn page_size_parses_case_insensitively() {
        assert_eq!("A4".parse::<PageSize>(), Ok(PageSize::A4));
        assert!("tabloid".parse::<PageSize>().is_err());
    }
}
