//! Ordered element-matching strategies.
//!
//! Each locator is a priority list of pure matchers. [`first_match`] tries
//! them in order against a scope and returns the first element found by the
//! first matcher that finds anything.

use crate::dom::Element;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Element whose `id` attribute equals the value.
    Id(String),
    /// Element with the given tag carrying every listed class (`td.dval.vet`).
    TagWithClasses {
        tag: &'static str,
        classes: &'static [&'static str],
    },
}

impl Matcher {
    #[must_use]
    pub fn matches(&self, element: &Element<'_>) -> bool {
        match self {
            Matcher::Id(id) => element.attr("id") == Some(id.as_str()),
            Matcher::TagWithClasses { tag, classes } => {
                element.tag() == *tag && classes.iter().all(|c| element.has_class(c))
            }
        }
    }
}

impl std::fmt::Display for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::Id(id) => write!(f, "#{id}"),
            Matcher::TagWithClasses { tag, classes } => {
                write!(f, "{tag}")?;
                for class in *classes {
                    write!(f, ".{class}")?;
                }
                Ok(())
            }
        }
    }
}

/// Applies `strategies` in priority order within `scope`'s descendants.
#[must_use]
pub fn first_match<'a>(scope: Element<'a>, strategies: &[Matcher]) -> Option<Element<'a>> {
    strategies.iter().find_map(|strategy| {
        let found = scope.descendants().find(|el| strategy.matches(el));
        if let Some(el) = &found {
            tracing::trace!(strategy = %strategy, tag = el.tag(), "matcher strategy hit");
        }
        found
    })
}
