//! Classification stage
//!
//! A classifier is a total, non-blocking predicate run on the dispatch loop
//! itself. It decides whether an item goes on to the transform stage or is
//! emitted directly as a waste value.

use crate::error::panic_message;
use std::panic::{self, AssertUnwindSafe};

/// Outcome of classifying one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<W> {
    /// Item continues to the transformer
    Recyclable,
    /// Item leaves the pipeline as this waste value
    Waste(W),
}

impl<W> Classification<W> {
    pub fn is_recyclable(&self) -> bool {
        matches!(self, Classification::Recyclable)
    }
}

/// `(is_recyclable, waste_value)` form; the waste value is dropped when the
/// item is recyclable.
impl<W> From<(bool, W)> for Classification<W> {
    fn from((is_recyclable, waste): (bool, W)) -> Self {
        if is_recyclable {
            Classification::Recyclable
        } else {
            Classification::Waste(waste)
        }
    }
}

/// Pluggable recyclability predicate
///
/// Must not block and must not fail. A panic inside `classify` aborts the
/// process.
pub trait Classifier<I, W>: Send + Sync + 'static {
    fn classify(&self, item: &I) -> Classification<W>;
}

impl<I, W, F> Classifier<I, W> for F
where
    F: Fn(&I) -> Classification<W> + Send + Sync + 'static,
{
    fn classify(&self, item: &I) -> Classification<W> {
        self(item)
    }
}

/// Invoke the classifier, returning the panic message if it panics
pub fn try_classify<I, W>(classifier: &dyn Classifier<I, W>, item: &I) -> Result<Classification<W>, String>
where
    I: 'static,
    W: 'static,
{
    panic::catch_unwind(AssertUnwindSafe(|| classifier.classify(item)))
        .map_err(|payload| panic_message(payload.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_conversion_recyclable_drops_waste() {
        let c: Classification<&str> = (true, "ignored").into();
        assert_eq!(c, Classification::Recyclable);
        assert!(c.is_recyclable());
    }

    #[test]
    fn test_tuple_conversion_waste_keeps_value() {
        let c: Classification<&str> = (false, "waste1").into();
        assert_eq!(c, Classification::Waste("waste1"));
        assert!(!c.is_recyclable());
    }

    #[test]
    fn test_closure_is_classifier() {
        let odd_is_waste = |n: &u32| {
            if n % 2 == 1 {
                Classification::Waste(*n)
            } else {
                Classification::Recyclable
            }
        };
        assert_eq!(odd_is_waste.classify(&3), Classification::Waste(3));
        assert_eq!(odd_is_waste.classify(&4), Classification::Recyclable);
    }

    #[test]
    fn test_try_classify_passes_through() {
        let all_waste = |n: &u32| Classification::Waste(*n);
        assert_eq!(try_classify::<u32, u32>(&all_waste, &9), Ok(Classification::Waste(9)));
    }

    #[test]
    fn test_try_classify_reports_panic_message() {
        let partial = |n: &u32| -> Classification<u32> {
            if *n == 0 {
                panic!("no class for zero");
            }
            Classification::Recyclable
        };
        assert_eq!(try_classify::<u32, u32>(&partial, &0), Err("no class for zero".to_string()));
        assert_eq!(try_classify::<u32, u32>(&partial, &1), Ok(Classification::Recyclable));
    }
}
