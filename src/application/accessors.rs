//! Named operations installed for each preset.
//!
//! Instead of attaching methods to live objects, the store keeps a table
//! of `(target, name) -> operation`. A sync tears the table down and
//! rebuilds it from the freshly loaded documents.

use std::fmt;

/// Object an accessor is exposed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// The preset store itself (`add_*`, `add_here_*`).
    Store,
    /// The owning mover (`mv_*`, `umv_*`, `wm_*`).
    Mover,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => write!(f, "store"),
            Self::Mover => write!(f, "mover"),
        }
    }
}

/// What an installed accessor does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Validate and save a preset of this category.
    AddPreset { category: String },
    /// Save a preset of this category at the mover's current position.
    AddPresetHere { category: String },
    /// Start a move to the preset.
    MoveTo { category: String, name: String },
    /// Move to the preset and wait for completion.
    MoveToAndWait { category: String, name: String },
    /// `preset value - current position`.
    OffsetFrom { category: String, name: String },
}

impl Operation {
    /// Object this operation is installed on.
    #[must_use]
    pub const fn target(&self) -> Target {
        match self {
            Self::AddPreset { .. } | Self::AddPresetHere { .. } => Target::Store,
            Self::MoveTo { .. } | Self::MoveToAndWait { .. } | Self::OffsetFrom { .. } => {
                Target::Mover
            }
        }
    }

    /// Public name, e.g. `add_beamline` or `wm_sample`.
    #[must_use]
    pub fn accessor_name(&self) -> String {
        match self {
            Self::AddPreset { category } => format!("add_{category}"),
            Self::AddPresetHere { category } => format!("add_here_{category}"),
            Self::MoveTo { name, .. } => format!("mv_{name}"),
            Self::MoveToAndWait { name, .. } => format!("umv_{name}"),
            Self::OffsetFrom { name, .. } => format!("wm_{name}"),
        }
    }

    /// Category the operation works on.
    #[must_use]
    pub fn category(&self) -> &str {
        match self {
            Self::AddPreset { category }
            | Self::AddPresetHere { category }
            | Self::MoveTo { category, .. }
            | Self::MoveToAndWait { category, .. }
            | Self::OffsetFrom { category, .. } => category,
        }
    }

    /// Preset name for per-preset operations.
    #[must_use]
    pub fn preset(&self) -> Option<&str> {
        match self {
            Self::AddPreset { .. } | Self::AddPresetHere { .. } => None,
            Self::MoveTo { name, .. }
            | Self::MoveToAndWait { name, .. }
            | Self::OffsetFrom { name, .. } => Some(name),
        }
    }
}

/// One installed accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    pub target: Target,
    pub name: String,
    pub operation: Operation,
}

/// Table of installed accessors, in registration order.
#[derive(Debug, Default)]
pub struct AccessorRegistry {
    installed: Vec<Accessor>,
}

impl AccessorRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            installed: Vec::new(),
        }
    }

    /// Install an operation under its accessor name.
    ///
    /// Re-registering a name on the same target replaces the operation but
    /// keeps the original registration slot.
    pub fn register(&mut self, operation: Operation) -> &Accessor {
        let target = operation.target();
        let name = operation.accessor_name();
        tracing::debug!(method = %name, target = %target, "register method");

        if let Some(idx) = self
            .installed
            .iter()
            .position(|a| a.target == target && a.name == name)
        {
            tracing::warn!(method = %name, target = %target, "accessor already installed, replacing");
            self.installed[idx].operation = operation;
            return &self.installed[idx];
        }

        self.installed.push(Accessor {
            target,
            name,
            operation,
        });
        &self.installed[self.installed.len() - 1]
    }

    /// Remove every installed accessor and return what was removed.
    pub fn remove_all(&mut self) -> Vec<Accessor> {
        tracing::debug!(count = self.installed.len(), "remove methods");
        std::mem::take(&mut self.installed)
    }

    /// Look up an accessor by target and name.
    #[must_use]
    pub fn get(&self, target: Target, name: &str) -> Option<&Accessor> {
        self.installed
            .iter()
            .find(|a| a.target == target && a.name == name)
    }

    /// Names installed on `target`, in registration order.
    pub fn names(&self, target: Target) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(move |a| a.target == target)
            .map(|a| a.name.as_str())
    }

    /// All accessors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Accessor> {
        self.installed.iter()
    }

    /// Installed offset operations, in registration order.
    pub fn offsets(&self) -> impl Iterator<Item = &Operation> {
        self.installed
            .iter()
            .map(|a| &a.operation)
            .filter(|op| matches!(op, Operation::OffsetFrom { .. }))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.installed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }
}
