//! User-visible notifications ("toasts").
//!
//! Every mutating store operation reports its outcome through a
//! [`Notifier`]. The CLI drains a [`ToastQueue`] after each command and
//! prints it; a graphical client would render it instead.

use std::cell::RefCell;
use std::rc::Rc;
use uuid::Uuid;

pub const DEFAULT_TOAST_DURATION_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
}

/// What a caller asks to show. The notifier assigns id and duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastSpec {
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
    pub duration_ms: Option<u64>,
}

impl ToastSpec {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            variant: ToastVariant::Default,
            duration_ms: None,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Some(description.into()),
            variant: ToastVariant::Destructive,
            duration_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub variant: ToastVariant,
    pub duration_ms: u64,
}

impl Toast {
    pub fn is_error(&self) -> bool {
        self.variant == ToastVariant::Destructive
    }
}

pub trait Notifier {
    /// Shows a toast and returns its id.
    fn show(&self, spec: ToastSpec) -> String;
}

impl<N: Notifier + ?Sized> Notifier for Rc<N> {
    fn show(&self, spec: ToastSpec) -> String {
        (**self).show(spec)
    }
}

/// The list of currently visible toasts.
///
/// Cloning is cheap and clones share the same queue, so the store, the
/// transfer manager and the UI can all hold one.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: Rc<RefCell<Vec<Toast>>>,
    default_duration_ms: u64,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION_MS)
    }
}

impl ToastQueue {
    pub fn new(default_duration_ms: u64) -> Self {
        Self {
            toasts: Rc::new(RefCell::new(Vec::new())),
            default_duration_ms,
        }
    }

    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.toasts.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.borrow().is_empty()
    }

    pub fn last(&self) -> Option<Toast> {
        self.toasts.borrow().last().cloned()
    }

    /// Removes the toast with `id`. Returns false if it was already gone.
    pub fn dismiss(&self, id: &str) -> bool {
        let mut toasts = self.toasts.borrow_mut();
        let before = toasts.len();
        toasts.retain(|t| t.id != id);
        toasts.len() != before
    }

    pub fn clear(&self) {
        self.toasts.borrow_mut().clear();
    }

    /// Takes every pending toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        std::mem::take(&mut *self.toasts.borrow_mut())
    }
}

impl Notifier for ToastQueue {
    fn show(&self, spec: ToastSpec) -> String {
        let id = Uuid::new_v4().simple().to_string()[..8].to_string();
        let duration_ms = match spec.duration_ms {
            Some(d) if d > 0 => d,
            _ => self.default_duration_ms,
        };
        self.toasts.borrow_mut().push(Toast {
            id: id.clone(),
            title: spec.title,
            description: spec.description,
            variant: spec.variant,
            duration_ms,
        });
        id
    }
}
