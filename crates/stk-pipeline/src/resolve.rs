//! Wraps `stk_core::params::resolve_parameters` into the `key -> value`
//! scope every downstream component (`ExprEval` call sites throughout
//! `stk-model`/`stk-solid`/`stk-toolpath`) expects.

use std::collections::HashMap;

use stk_core::{resolve_parameters, Parameter, ResolvedParameter};

/// Resolves `params` and returns both the scope map and the full
/// resolved list.
pub fn resolve_scope(params: &[Parameter]) -> (HashMap<String, f64>, Vec<ResolvedParameter>) {
    let resolved = resolve_parameters(params);
    let scope = resolved.iter().map(|r| (r.key.clone(), r.value)).collect();
    (scope, resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stk_core::Unit;

    #[test]
    fn resolves_dependent_parameters_into_one_scope() {
        let params = vec![
            Parameter { id: "p1".into(), key: "width".into(), expression: "100".into(), unit: Unit::Millimeters },
            Parameter { id: "p2".into(), key: "half_width".into(), expression: "width / 2".into(), unit: Unit::Millimeters },
        ];
        let (scope, resolved) = resolve_scope(&params);
        assert_eq!(scope["half_width"], 50.0);
        assert!(resolved.iter().all(|r| r.error.is_none()));
    }
}
