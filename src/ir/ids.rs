//! Newtype identifiers for images, annotations and categories.
//!
//! All three are 1-based in COCO output. YOLO class indices are 0-based
//! and are derived from [`CategoryId::class_index`].

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Identifies one image; the 1-based position of its annotation file
    /// in the scanned input list.
    ImageId
);

id_newtype!(
    /// Identifies one COCO annotation. Unique across the whole run.
    AnnotationId
);

id_newtype!(
    /// Identifies one category in COCO output (1-based).
    CategoryId
);

impl ImageId {
    /// Image id for the file at `index` in the scanned list.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self(index as u64 + 1)
    }
}

impl AnnotationId {
    /// The first id handed out in a run.
    pub const FIRST: AnnotationId = AnnotationId(1);

    /// The id that follows this one.
    #[inline]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::FIRST
    }
}

impl CategoryId {
    /// COCO id for the table entry at `index`.
    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self(index as u64 + 1)
    }

    /// 0-based class index, as written in YOLO label rows.
    #[inline]
    pub fn class_index(&self) -> usize {
        (self.0 as usize).saturating_sub(1)
    }
}
