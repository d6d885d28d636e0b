#![forbid(unsafe_code)]

//! Composite handles and the uniform modification surface.
//!
//! High-level operations return a [`TermMod`]: one item, an ordered
//! bundle of items treated as one logical modification, or a pseudo
//! stand-in when the platform makes the operation meaningless. All three
//! shapes answer the same capability set (`origin`, `request`,
//! `add_flag`, `sub_flag`, `reset`, `purge`) so callers never branch on
//! the concrete shape.

use crate::error::ModeError;
use crate::item::ModItem;

/// An ordered bundle of modifications treated as one.
///
/// Application runs front to back; withdrawal, reset, and purge run back
/// to front, mirroring the order the driver saw the changes.
#[derive(Debug, Clone)]
pub struct ModGroup {
    items: Vec<ModItem>,
}

impl ModGroup {
    #[must_use]
    pub fn new(items: Vec<ModItem>) -> Self {
        Self { items }
    }

    /// The bundled items, in application order.
    #[must_use]
    pub fn items(&self) -> &[ModItem] {
        &self.items
    }

    /// Baseline observations, in application order.
    #[must_use]
    pub fn origin(&self) -> Vec<bool> {
        self.items.iter().map(ModItem::origin).collect()
    }

    /// Fresh driver reads, in application order.
    pub fn request(&self) -> Result<Vec<bool>, ModeError> {
        self.items.iter().map(ModItem::request).collect()
    }

    /// Apply every modification, front to back.
    pub fn add_flag(&self) -> Result<(), ModeError> {
        for item in &self.items {
            item.add_flag()?;
        }
        Ok(())
    }

    /// Withdraw every modification, back to front.
    pub fn sub_flag(&self) -> Result<(), ModeError> {
        for item in self.items.iter().rev() {
            item.sub_flag()?;
        }
        Ok(())
    }

    /// Reset every modification, back to front.
    pub fn reset(&self) -> Result<(), ModeError> {
        for item in self.items.iter().rev() {
            item.reset()?;
        }
        Ok(())
    }

    /// Purge every modification, back to front.
    pub fn purge(&self) -> Result<(), ModeError> {
        for item in self.items.iter().rev() {
            item.purge()?;
        }
        Ok(())
    }
}

/// Uniform return of a high-level operation.
#[derive(Debug, Clone)]
pub enum TermMod {
    /// A single modification.
    Item(ModItem),
    /// Several modifications applied as one unit.
    Group(ModGroup),
    /// The operation is a no-op on this platform. Every capability
    /// answers with a well-defined empty value and never errors.
    Pseudo,
}

impl TermMod {
    /// Whether this handle stands for real driver modifications.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        !matches!(self, Self::Pseudo)
    }

    /// Baseline observations; empty for a pseudo-modification.
    #[must_use]
    pub fn origin(&self) -> Vec<bool> {
        match self {
            Self::Item(item) => vec![item.origin()],
            Self::Group(group) => group.origin(),
            Self::Pseudo => Vec::new(),
        }
    }

    /// Fresh driver reads; empty for a pseudo-modification.
    pub fn request(&self) -> Result<Vec<bool>, ModeError> {
        match self {
            Self::Item(item) => Ok(vec![item.request()?]),
            Self::Group(group) => group.request(),
            Self::Pseudo => Ok(Vec::new()),
        }
    }

    /// Apply (front to back for a group).
    pub fn add_flag(&self) -> Result<(), ModeError> {
        match self {
            Self::Item(item) => item.add_flag(),
            Self::Group(group) => group.add_flag(),
            Self::Pseudo => Ok(()),
        }
    }

    /// Withdraw (back to front for a group).
    pub fn sub_flag(&self) -> Result<(), ModeError> {
        match self {
            Self::Item(item) => item.sub_flag(),
            Self::Group(group) => group.sub_flag(),
            Self::Pseudo => Ok(()),
        }
    }

    /// Reset to baseline (back to front for a group).
    pub fn reset(&self) -> Result<(), ModeError> {
        match self {
            Self::Item(item) => item.reset(),
            Self::Group(group) => group.reset(),
            Self::Pseudo => Ok(()),
        }
    }

    /// Purge (back to front for a group).
    pub fn purge(&self) -> Result<(), ModeError> {
        match self {
            Self::Item(item) => item.purge(),
            Self::Group(group) => group.purge(),
            Self::Pseudo => Ok(()),
        }
    }

    /// The single item, when this is one.
    #[must_use]
    pub fn as_item(&self) -> Option<&ModItem> {
        match self {
            Self::Item(item) => Some(item),
            _ => None,
        }
    }

    /// The bundle, when this is one.
    #[must_use]
    pub fn as_group(&self) -> Option<&ModGroup> {
        match self {
            Self::Group(group) => Some(group),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudo_answers_every_capability() {
        let pseudo = TermMod::Pseudo;
        assert!(!pseudo.is_effective());
        assert!(pseudo.origin().is_empty());
        assert!(pseudo.request().unwrap().is_empty());
        pseudo.add_flag().unwrap();
        pseudo.sub_flag().unwrap();
        pseudo.reset().unwrap();
        pseudo.purge().unwrap();
        assert!(pseudo.as_item().is_none());
        assert!(pseudo.as_group().is_none());
    }
}
