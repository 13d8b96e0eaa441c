//! Role-based authorization.
//!
//! A requirement is satisfied when it is empty or when the identity holds
//! ANY of the required roles (OR semantics). Roles are flat name strings;
//! transports that carry roles in another shape map them at the boundary.

use std::collections::BTreeSet;

use super::Denial;

pub fn evaluate(roles: &BTreeSet<String>, requirement: &[&str]) -> Result<(), Denial> {
    if requirement.is_empty() {
        return Ok(());
    }

    if requirement.iter().any(|required| roles.contains(*required)) {
        Ok(())
    } else {
        Err(Denial::InsufficientRole)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn empty_requirement_allows_any_identity() {
        assert!(evaluate(&roles(&[]), &[]).is_ok());
        assert!(evaluate(&roles(&["admin"]), &[]).is_ok());
    }

    #[test]
    fn any_matching_role_is_sufficient() {
        // {A} against {A, B}: allowed
        assert!(evaluate(&roles(&["a"]), &["a", "b"]).is_ok());
    }

    #[test]
    fn no_matching_role_is_denied() {
        // {A} against {B, C}: denied
        assert_eq!(
            evaluate(&roles(&["a"]), &["b", "c"]),
            Err(Denial::InsufficientRole)
        );
    }

    #[test]
    fn empty_role_set_fails_any_requirement() {
        assert_eq!(
            evaluate(&roles(&[]), &["admin"]),
            Err(Denial::InsufficientRole)
        );
    }
}
