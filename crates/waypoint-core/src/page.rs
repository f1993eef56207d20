//! Opaque page references.
//!
//! A [`Page`] is what gets pushed onto a path or placed in a modal root slot.
//! The state machine only ever asks a page three things: is it the same page
//! as another one, what is its hash, and what should a log line call it.
//! Everything else (what the page renders, which screen type it is) belongs to
//! the view layer, which gets the original value back with
//! [`Page::downcast_ref`].
//!
//! # Identity
//!
//! Equality and hashing use the wrapped value and its concrete type. The
//! optional label is presentation-only and never takes part in identity, so
//! `Page::labeled(Screen::Home, "Home")` equals `Page::new(Screen::Home)`.
//!
//! ```
//! use waypoint_core::Page;
//!
//! #[derive(Debug, PartialEq, Eq, Hash)]
//! enum Screen { Home, Detail(u32) }
//!
//! let a = Page::new(Screen::Detail(7));
//! let b = Page::labeled(Screen::Detail(7), "Detail #7");
//! assert_eq!(a, b);
//! assert_eq!(b.description(), "Detail #7");
//! assert_eq!(a.downcast_ref::<Screen>(), Some(&Screen::Detail(7)));
//! assert_ne!(a, Page::new(Screen::Home));
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Object-safe view of a page value.
trait PageContent: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn content_type(&self) -> TypeId;
    fn dyn_eq(&self, other: &dyn PageContent) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn debug_text(&self) -> String;
}

impl<T> PageContent for T
where
    T: Any + Eq + Hash + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn content_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn dyn_eq(&self, other: &dyn PageContent) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        self.hash(&mut state);
    }

    fn debug_text(&self) -> String {
        format!("{self:?}")
    }
}

/// A cheaply clonable, type-erased page reference.
#[derive(Clone)]
pub struct Page {
    content: Arc<dyn PageContent>,
    label: Option<Arc<str>>,
}

impl Page {
    /// Wrap a value as a page. Its `Debug` output becomes the description.
    #[must_use]
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Eq + Hash + fmt::Debug + Send + Sync,
    {
        Self {
            content: Arc::new(value),
            label: None,
        }
    }

    /// Wrap a value with an explicit human-readable label.
    #[must_use]
    pub fn labeled<T>(value: T, label: impl Into<String>) -> Self
    where
        T: Any + Eq + Hash + fmt::Debug + Send + Sync,
    {
        let label: String = label.into();
        Self {
            content: Arc::new(value),
            label: Some(label.into()),
        }
    }

    /// Human-readable description for log lines.
    #[must_use]
    pub fn description(&self) -> String {
        match &self.label {
            Some(label) => label.to_string(),
            None => self.content.debug_text(),
        }
    }

    /// The explicit label, if one was given.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Borrow the wrapped value if it has type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.content.as_any().downcast_ref::<T>()
    }

    /// Whether the wrapped value has type `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.content.content_type() == TypeId::of::<T>()
    }
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.content, &other.content) || self.content.dyn_eq(other.content.as_ref())
    }
}

impl Eq for Page {}

impl Hash for Page {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.content.content_type().hash(state);
        self.content.dyn_hash(state);
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Page").field(&self.description()).finish()
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
