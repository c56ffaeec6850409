//! Collaborator traits.
//!
//! The harvester never reads files or evaluates models itself: histogram lookup
//! and opaque model objects (pdfs, datasets) are supplied through these seams.

use std::fmt;

use crate::{Histogram, Result};

/// Something that can resolve a path to a histogram (a shape file, an in-memory map).
pub trait HistogramSource {
    /// Human-readable source name, used in error messages.
    fn source_name(&self) -> &str;

    /// Return an owned copy of the histogram stored at `path`.
    ///
    /// Fails with [`crate::Error::NotFound`] if nothing is stored at `path` and with
    /// [`crate::Error::WrongType`] if the object there is not a histogram.
    fn get_histogram(&self, path: &str) -> Result<Histogram>;
}

/// An opaque model object (pdf, dataset) held by a process or observation.
pub trait ModelObject: fmt::Debug + Send + Sync {
    /// Object name.
    fn name(&self) -> &str;

    /// Type name (e.g. "RooGaussian", "RooDataHist").
    fn class_name(&self) -> &str;

    /// Deep copy behind a new box.
    fn clone_object(&self) -> Box<dyn ModelObject>;
}

impl Clone for Box<dyn ModelObject> {
    fn clone(&self) -> Self {
        self.clone_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[derive(Debug, Clone)]
    struct Constant(String);

    impl ModelObject for Constant {
        fn name(&self) -> &str {
            &self.0
        }

        fn class_name(&self) -> &str {
            "Constant"
        }

        fn clone_object(&self) -> Box<dyn ModelObject> {
            Box::new(self.clone())
        }
    }

    struct Empty;

    impl HistogramSource for Empty {
        fn source_name(&self) -> &str {
            "empty"
        }

        fn get_histogram(&self, path: &str) -> Result<Histogram> {
            Err(Error::NotFound(format!("{} in {}", path, self.source_name())))
        }
    }

    #[test]
    fn test_boxed_clone() {
        let a: Box<dyn ModelObject> = Box::new(Constant("c".into()));
        let b = a.clone();
        assert_eq!(b.name(), "c");
        assert_eq!(b.class_name(), "Constant");
    }

    #[test]
    fn test_source_not_found() {
        assert!(matches!(Empty.get_histogram("x"), Err(Error::NotFound(_))));
    }
}
