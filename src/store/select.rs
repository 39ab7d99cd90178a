//! Label predicates used to select value objects

use crate::value::Labels;

/// Relational test applied to the `year` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// year == target
    Eq,
    /// year > target
    Gt,
    /// year < target
    Lt,
    /// year >= target
    Gte,
}

impl Comparator {
    /// Check `year <op> target`
    pub fn matches(self, year: i32, target: i32) -> bool {
        match self {
            Comparator::Eq => year == target,
            Comparator::Gt => year > target,
            Comparator::Lt => year < target,
            Comparator::Gte => year >= target,
        }
    }
}

/// Which kind of value objects a selection admits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Origin {
    #[default]
    Any,
    Explicit,
    Extrapolated,
}

/// A selection over a parameter's value objects.
///
/// The comparator applies to `year`. Secondary labels are matched exactly;
/// labels that are not mentioned match anything.
///
/// # Examples
///
/// ```
/// use taxparams_rs::store::{Comparator, Selector};
///
/// let sel = Selector::gt(2020).with_label("MARS", "single");
/// assert_eq!(sel.year_filter(), Some((Comparator::Gt, 2020)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    year: Option<(Comparator, i32)>,
    labels: Labels,
    origin: Origin,
}

impl Selector {
    /// Select every value object.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn year(comparator: Comparator, year: i32) -> Self {
        Self {
            year: Some((comparator, year)),
            ..Self::default()
        }
    }

    pub fn eq(year: i32) -> Self {
        Self::year(Comparator::Eq, year)
    }

    pub fn gt(year: i32) -> Self {
        Self::year(Comparator::Gt, year)
    }

    pub fn lt(year: i32) -> Self {
        Self::year(Comparator::Lt, year)
    }

    pub fn gte(year: i32) -> Self {
        Self::year(Comparator::Gte, year)
    }

    pub fn with_label(mut self, name: &str, value: &str) -> Self {
        self.labels.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_labels(mut self, labels: &Labels) -> Self {
        self.labels
            .extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Skip extrapolated values.
    pub fn explicit_only(mut self) -> Self {
        self.origin = Origin::Explicit;
        self
    }

    /// Keep only values produced by extension.
    pub fn extrapolated_only(mut self) -> Self {
        self.origin = Origin::Extrapolated;
        self
    }

    pub fn year_filter(&self) -> Option<(Comparator, i32)> {
        self.year
    }

    pub(crate) fn matches_labels(&self, labels: &Labels) -> bool {
        self.labels
            .iter()
            .all(|(name, value)| labels.get(name) == Some(value))
    }

    pub(crate) fn matches(&self, year: i32, labels: &Labels, auto: bool) -> bool {
        match (self.origin, auto) {
            (Origin::Explicit, true) | (Origin::Extrapolated, false) => return false,
            _ => {}
        }
        if let Some((cmp, target)) = self.year {
            if !cmp.matches(year, target) {
                return false;
            }
        }
        self.matches_labels(labels)
    }
}
