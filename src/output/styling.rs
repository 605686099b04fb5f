//! Terminal styles by role, so every view colors the same things alike.

use std::fmt::Display;

use console::{style, StyledObject};

use crate::present::CardGroup;

pub type Styled = StyledObject<String>;

fn paint(text: impl Display) -> Styled {
    style(text.to_string())
}

pub fn heading(text: impl Display) -> Styled {
    paint(text).bright()
}

pub fn label(text: impl Display) -> Styled {
    paint(text).dim()
}

pub fn link(text: impl Display) -> Styled {
    paint(text).cyan()
}

pub fn notice(text: impl Display) -> Styled {
    paint(text).bright().yellow()
}

pub fn success(text: impl Display) -> Styled {
    paint(text).bright().green()
}

pub fn failure(text: impl Display) -> Styled {
    paint(text).bright().red()
}

pub fn brand(text: impl Display) -> Styled {
    paint(text).magenta().bold()
}

/// Styles text the way cards of `group` are colored in the grid.
pub fn for_group(group: CardGroup, text: impl Display) -> Styled {
    match group {
        CardGroup::Errors => failure(text),
        CardGroup::Successful => success(text),
        CardGroup::NoRuns => label(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(styled: Styled) -> String {
        styled.force_styling(true).to_string()
    }

    #[test]
    fn test_group_styles_follow_card_colors() {
        assert_eq!(rendered(for_group(CardGroup::Errors, "2")), rendered(failure("2")));
        assert_eq!(rendered(for_group(CardGroup::Successful, "2")), rendered(success("2")));
        assert_eq!(rendered(for_group(CardGroup::NoRuns, "2")), rendered(label("2")));
        assert_ne!(rendered(failure("2")), rendered(success("2")));
    }
}
