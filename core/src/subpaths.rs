//! The three-state subpaths restriction: no restriction specified at all
//! (keep whatever is deployed), unrestricted (all subpaths), or an explicit
//! list to narrow to.

use std::fmt;

/// Which subtrees of a ref to materialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subpaths {
    /// No restriction was specified; keep whatever is already deployed.
    /// Only ever produced internally (e.g. runtime dependency/update ops);
    /// never the result of normalizing a caller-supplied `add_install` call.
    Inherit,
    /// Unrestricted: materialize every subpath.
    All,
    /// Restrict to exactly these subpaths.
    Only(Vec<String>),
}

impl Subpaths {
    /// `add_install` normalizes a caller's `None` into "all subpaths".
    pub fn from_install_request(subpaths: Option<Subpaths>) -> Subpaths {
        subpaths.unwrap_or(Subpaths::All)
    }

    /// Merge an incoming request into an already-recorded value, per the Op
    /// Table merge rule: only a *non-empty explicit list*
    /// existing value can be overridden, and only by a non-`Inherit`
    /// incoming value. An unrestricted (`All`) existing value is never
    /// narrowed; an `Inherit` existing value is left alone by this rule too
    /// (it is never reached by `add_op` with a non-null subpaths argument
    /// in the flows this core implements).
    pub fn merge_from(&mut self, incoming: &Subpaths) {
        if let Subpaths::Only(existing) = self {
            if !existing.is_empty() && !matches!(incoming, Subpaths::Inherit) {
                *self = incoming.clone();
            }
        }
    }
}

impl fmt::Display for Subpaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subpaths::Inherit => write!(f, "[$old]"),
            Subpaths::All => write!(f, "[*]"),
            Subpaths::Only(paths) => write!(f, "[{}]", paths.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrestricted_existing_never_narrows() {
        let mut existing = Subpaths::All;
        existing.merge_from(&Subpaths::Only(vec!["de".into()]));
        assert_eq!(existing, Subpaths::All);
    }

    #[test]
    fn unrestricted_incoming_overrides_restricted_existing() {
        let mut existing = Subpaths::Only(vec!["de".into()]);
        existing.merge_from(&Subpaths::All);
        assert_eq!(existing, Subpaths::All);
    }

    #[test]
    fn restricted_incoming_overrides_restricted_existing() {
        let mut existing = Subpaths::Only(vec!["de".into()]);
        existing.merge_from(&Subpaths::Only(vec!["fr".into()]));
        assert_eq!(existing, Subpaths::Only(vec!["fr".into()]));
    }

    #[test]
    fn inherit_incoming_never_overrides() {
        let mut existing = Subpaths::Only(vec!["de".into()]);
        existing.merge_from(&Subpaths::Inherit);
        assert_eq!(existing, Subpaths::Only(vec!["de".into()]));
    }

    #[test]
    fn display_uses_bracketed_shorthand() {
        assert_eq!(Subpaths::Inherit.to_string(), "[$old]");
        assert_eq!(Subpaths::All.to_string(), "[*]");
        assert_eq!(
            Subpaths::Only(vec!["de".into(), "fr".into()]).to_string(),
            "[de, fr]"
        );
    }
}
