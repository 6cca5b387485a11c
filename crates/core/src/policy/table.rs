//! Generic, table-driven transition function.
//!
//! Every workflow decision in the engine is a lookup of
//! `(current state, role, action)` in a static [`TransitionTable`]. The table
//! is fail-closed: any triple without a row is denied.

use crate::actor::Role;

/// One allowed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition<S, A> {
    /// Role allowed to perform the action.
    pub role: Role,
    /// The action.
    pub action: A,
    /// Required current state; `None` is the creation edge.
    pub from: Option<S>,
    /// Resulting state. Equal to `from` for non-mutating actions.
    pub to: S,
}

/// Why a lookup was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial<S, A> {
    /// The role may never perform this action.
    Forbidden {
        /// Requesting role.
        role: Role,
        /// Requested action.
        action: A,
    },
    /// The role may perform this action, but not from the current state.
    InvalidState {
        /// Requesting role.
        role: Role,
        /// Requested action.
        action: A,
        /// State the subject was in.
        current: Option<S>,
    },
}

/// Static transition table.
#[derive(Debug)]
pub struct TransitionTable<S: 'static, A: 'static> {
    rows: &'static [Transition<S, A>],
}

impl<S, A> TransitionTable<S, A>
where
    S: Copy + Eq,
    A: Copy + Eq,
{
    /// Wraps a static slice of rows.
    #[must_use]
    pub const fn new(rows: &'static [Transition<S, A>]) -> Self {
        Self { rows }
    }

    /// All rows, in declaration order.
    #[must_use]
    pub fn rows(&self) -> &'static [Transition<S, A>] {
        self.rows
    }

    /// Returns true if `role` may perform `action` from at least one state.
    #[must_use]
    pub fn permits(&self, role: Role, action: A) -> bool {
        self.rows
            .iter()
            .any(|row| row.role == role && row.action == action)
    }

    /// Checks the role half of a lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Denial::Forbidden`] if no row grants `action` to `role`.
    pub fn authorize(&self, role: Role, action: A) -> Result<(), Denial<S, A>> {
        if self.permits(role, action) {
            Ok(())
        } else {
            Err(Denial::Forbidden { role, action })
        }
    }

    /// Resolves `(current, role, action)` to the next state.
    ///
    /// The role is checked before the state, so a wrong role is reported as
    /// `Forbidden` even when the state is also wrong.
    ///
    /// # Errors
    ///
    /// - [`Denial::Forbidden`] if the role may never perform the action
    /// - [`Denial::InvalidState`] if no row starts from `current`
    pub fn resolve(&self, current: Option<S>, role: Role, action: A) -> Result<S, Denial<S, A>> {
        self.authorize(role, action)?;

        self.rows
            .iter()
            .find(|row| row.role == role && row.action == action && row.from == current)
            .map(|row| row.to)
            .ok_or(Denial::InvalidState {
                role,
                action,
                current,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Red,
        Green,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Switch {
        Install,
        Toggle,
    }

    static LIGHTS: TransitionTable<Light, Switch> = TransitionTable::new(&[
        Transition {
            role: Role::Admin,
            action: Switch::Install,
            from: None,
            to: Light::Red,
        },
        Transition {
            role: Role::Bank,
            action: Switch::Toggle,
            from: Some(Light::Red),
            to: Light::Green,
        },
    ]);

    #[test]
    fn test_resolve_allowed_row() {
        assert_eq!(
            LIGHTS.resolve(Some(Light::Red), Role::Bank, Switch::Toggle),
            Ok(Light::Green)
        );
        assert_eq!(
            LIGHTS.resolve(None, Role::Admin, Switch::Install),
            Ok(Light::Red)
        );
    }

    #[test]
    fn test_wrong_role_is_forbidden_before_state() {
        assert_eq!(
            LIGHTS.resolve(Some(Light::Green), Role::Buyer, Switch::Toggle),
            Err(Denial::Forbidden {
                role: Role::Buyer,
                action: Switch::Toggle
            })
        );
    }

    #[test]
    fn test_wrong_state_is_invalid_state() {
        assert_eq!(
            LIGHTS.resolve(Some(Light::Green), Role::Bank, Switch::Toggle),
            Err(Denial::InvalidState {
                role: Role::Bank,
                action: Switch::Toggle,
                current: Some(Light::Green)
            })
        );
    }

    #[test]
    fn test_permits() {
        assert!(LIGHTS.permits(Role::Bank, Switch::Toggle));
        assert!(!LIGHTS.permits(Role::Bank, Switch::Install));
        assert_eq!(LIGHTS.rows().len(), 2);
    }
}
