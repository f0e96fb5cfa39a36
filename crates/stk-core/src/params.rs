//! Parameter dependency resolution.
//!
//! Orders a parameter set by dependency, detects cycles (any self-loop or
//! non-trivial strongly-connected component), and evaluates each
//! expression once every identifier it references is known.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::expr::{self, EvalError};
use crate::units::Unit;

/// A named, expression-backed numeric value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub id: String,
    pub key: String,
    pub expression: String,
    #[serde(default)]
    pub unit: Unit,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParamError {
    #[error("dependency cycle")]
    Cycle,
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// A parameter after resolution: `value` is always populated (0.0 on
/// error) and carries an error flag but never stops the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParameter {
    pub id: String,
    pub key: String,
    pub value: f64,
    pub error: Option<ParamError>,
}

/// Extract identifier tokens from an expression that match a known key.
fn referenced_keys(expression: &str, keys: &HashSet<&str>) -> HashSet<String> {
    let mut found = HashSet::new();
    let mut current = String::new();
    let mut chars = expression.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_alphabetic() || c == '_' {
            current.push(c);
            while let Some(&n) = chars.peek() {
                if n.is_alphanumeric() || n == '_' {
                    current.push(n);
                    chars.next();
                } else {
                    break;
                }
            }
            // Unit suffixes are not parameter references.
            if current != "mm" && current != "in" && keys.contains(current.as_str()) {
                found.insert(current.clone());
            }
            current.clear();
        }
    }
    found
}

/// Resolve a parameter set: populate `value` in dependency order, flagging
/// cycles. Tie-breaking for equal-depth nodes follows insertion order.
pub fn resolve_parameters(params: &[Parameter]) -> Vec<ResolvedParameter> {
    let keys: HashSet<&str> = params.iter().map(|p| p.key.as_str()).collect();
    let key_to_index: HashMap<&str, usize> =
        params.iter().enumerate().map(|(i, p)| (p.key.as_str(), i)).collect();

    // deps[i] = set of indices that params[i] references.
    let deps: Vec<HashSet<usize>> = params
        .iter()
        .map(|p| {
            referenced_keys(&p.expression, &keys)
                .into_iter()
                .filter_map(|k| key_to_index.get(k.as_str()).copied())
                .collect()
        })
        .collect();

    let cyclic = find_cyclic_members(&deps);

    // Kahn's algorithm over the acyclic subset: an edge i -> j (i depends on j)
    // means j must be evaluated before i. We evaluate in reverse topological
    // order, i.e. nodes with no remaining (non-cyclic) dependents first.
    let mut in_degree = vec![0usize; params.len()]; // number of unresolved deps
    for (i, d) in deps.iter().enumerate() {
        if cyclic.contains(&i) {
            continue;
        }
        in_degree[i] = d.iter().filter(|j| !cyclic.contains(*j)).count();
    }

    let mut ready: VecDeque<usize> = (0..params.len())
        .filter(|i| !cyclic.contains(i) && in_degree[*i] == 0)
        .collect();

    // dependents[j] = list of i such that i depends on j.
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); params.len()];
    for (i, d) in deps.iter().enumerate() {
        for &j in d {
            dependents[j].push(i);
        }
    }

    let mut values = vec![0.0_f64; params.len()];
    let mut errors: Vec<Option<ParamError>> = vec![None; params.len()];
    let mut resolved = vec![false; params.len()];

    while let Some(i) = ready.pop_front() {
        let mut scope = HashMap::new();
        for &j in &deps[i] {
            if !cyclic.contains(&j) {
                scope.insert(params[j].key.clone(), values[j]);
            }
        }
        match expr::eval(&params[i].expression, &scope) {
            Ok(mm) => values[i] = mm,
            Err(e) => {
                values[i] = 0.0;
                errors[i] = Some(ParamError::Eval(e));
            }
        }
        resolved[i] = true;

        for &dependent in &dependents[i] {
            if cyclic.contains(&dependent) {
                continue;
            }
            in_degree[dependent] = in_degree[dependent].saturating_sub(1);
            if in_degree[dependent] == 0 && !resolved[dependent] {
                ready.push_back(dependent);
            }
        }
    }

    for &i in &cyclic {
        values[i] = 0.0;
        errors[i] = Some(ParamError::Cycle);
    }

    params
        .iter()
        .enumerate()
        .map(|(i, p)| ResolvedParameter {
            id: p.id.clone(),
            key: p.key.clone(),
            value: values[i],
            error: errors[i].clone(),
        })
        .collect()
}

/// Tarjan's SCC over the dependency graph; returns indices that are in a
/// cycle (SCC of size > 1, or a self-loop).
fn find_cyclic_members(deps: &[HashSet<usize>]) -> HashSet<usize> {
    let n = deps.len();
    let mut index_counter = 0;
    let mut indices: Vec<Option<usize>> = vec![None; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack = Vec::new();
    let mut cyclic = HashSet::new();

    fn strongconnect(
        v: usize,
        deps: &[HashSet<usize>],
        index_counter: &mut usize,
        indices: &mut Vec<Option<usize>>,
        lowlink: &mut Vec<usize>,
        on_stack: &mut Vec<bool>,
        stack: &mut Vec<usize>,
        cyclic: &mut HashSet<usize>,
    ) {
        indices[v] = Some(*index_counter);
        lowlink[v] = *index_counter;
        *index_counter += 1;
        stack.push(v);
        on_stack[v] = true;

        let mut neighbors: Vec<usize> = deps[v].iter().copied().collect();
        neighbors.sort_unstable();
        for w in neighbors {
            if indices[w].is_none() {
                strongconnect(w, deps, index_counter, indices, lowlink, on_stack, stack, cyclic);
                lowlink[v] = lowlink[v].min(lowlink[w]);
            } else if on_stack[w] {
                lowlink[v] = lowlink[v].min(indices[w].unwrap());
            }
        }

        if lowlink[v] == indices[v].unwrap() {
            let mut component = Vec::new();
            loop {
                let w = stack.pop().unwrap();
                on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            let has_self_loop = component.len() == 1 && deps[component[0]].contains(&component[0]);
            if component.len() > 1 || has_self_loop {
                for w in component {
                    cyclic.insert(w);
                }
            }
        }
    }

    for v in 0..n {
        if indices[v].is_none() {
            strongconnect(
                v,
                deps,
                &mut index_counter,
                &mut indices,
                &mut lowlink,
                &mut on_stack,
                &mut stack,
                &mut cyclic,
            );
        }
    }
    cyclic
}

/// Transitive reachability: does `source` (directly or indirectly) depend
/// on `target`? Used by the editor to forbid edits that would close a
/// cycle before they're made.
pub fn depends_on(params: &[Parameter], source: &str, target: &str) -> bool {
    let keys: HashSet<&str> = params.iter().map(|p| p.key.as_str()).collect();
    let key_to_index: HashMap<&str, usize> =
        params.iter().enumerate().map(|(i, p)| (p.key.as_str(), i)).collect();

    let Some(&start) = key_to_index.get(source) else {
        return false;
    };
    let Some(&goal) = key_to_index.get(target) else {
        return false;
    };

    let mut visited = HashSet::new();
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        if !visited.insert(i) {
            continue;
        }
        if i == goal && i != start {
            return true;
        }
        for k in referenced_keys(&params[i].expression, &keys) {
            if let Some(&j) = key_to_index.get(k.as_str()) {
                if j == goal {
                    return true;
                }
                stack.push(j);
            }
        }
    }
    false
}
