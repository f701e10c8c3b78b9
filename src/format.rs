//! Composable formatters that build one line of diagram text at a time.
//!
//! A formatter sees the full context of the line plus the text produced so
//! far. `None` means nothing has been produced yet: the first formatter of a
//! chain turns `None` into base text, every later one refines `Some` text and
//! passes `None` through.

mod column;
mod relationship;

pub use column::{ColumnContext, ColumnFormatter};
pub use relationship::{RelationshipContext, RelationshipFormatter};

pub trait Formatter<C: ?Sized> {
    fn format(&self, ctx: &C, text: Option<String>) -> Option<String>;
}

/// Ordered formatters applied one after another.
///
/// Order is the caller's contract; the chain never reorders steps. An empty
/// chain hands its input back unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatterChain<F> {
    steps: Vec<F>,
}

impl<F> Default for FormatterChain<F> {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

impl<F> FromIterator<F> for FormatterChain<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

impl<F> From<Option<Vec<F>>> for FormatterChain<F> {
    fn from(steps: Option<Vec<F>>) -> Self {
        Self {
            steps: steps.unwrap_or_default(),
        }
    }
}

impl<F> FormatterChain<F> {
    pub fn new(steps: Vec<F>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[F] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn apply<C: ?Sized>(&self, ctx: &C, text: Option<String>) -> Option<String>
    where
        F: Formatter<C>,
    {
        self.steps
            .iter()
            .fold(text, |text, step| step.format(ctx, text))
    }
}

impl<C: ?Sized, F: Formatter<C>> Formatter<C> for FormatterChain<F> {
    fn format(&self, ctx: &C, text: Option<String>) -> Option<String> {
        self.apply(ctx, text)
    }
}
