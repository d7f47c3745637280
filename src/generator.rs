//! Synthetic people/relationship dataset generation.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::{Result, SocialGraphError};

/// Inputs for one generation pass.
#[derive(Debug, Clone)]
pub struct GeneratorSpec {
    pub first_names: Vec<String>,
    pub last_names: Vec<String>,
    pub relation_kinds: Vec<String>,
    pub relation_count: usize,
    /// Operational ceiling on `relation_count`.
    pub max_relation_count: usize,
}

impl GeneratorSpec {
    pub fn from_config(config: &GeneratorConfig, relation_count: usize) -> Self {
        Self {
            first_names: config.first_names.clone(),
            last_names: config.last_names.clone(),
            relation_kinds: config.relation_kinds.clone(),
            relation_count,
            max_relation_count: config.max_relation_count,
        }
    }
}

/// "Ensure both people exist and that this edge exists between them."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOp {
    pub source_name: String,
    pub target_name: String,
    pub relation_kind: String,
}

/// Reject relation counts above the ceiling.
pub fn check_relation_count(relation_count: usize, max_relation_count: usize) -> Result<usize> {
    if relation_count > max_relation_count {
        return Err(SocialGraphError::InvalidParameter(format!(
            "relation count {} exceeds the maximum of {}",
            relation_count, max_relation_count
        )));
    }
    Ok(relation_count)
}

/// Draw `spec.relation_count` random relationships.
///
/// Names are not deduplicated here; the store's upsert merges repeated
/// names into one person. Self-relations are kept.
pub fn generate<R: Rng + ?Sized>(spec: &GeneratorSpec, rng: &mut R) -> Result<Vec<InsertOp>> {
    let count = check_relation_count(spec.relation_count, spec.max_relation_count)?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let first = pool(&spec.first_names, "first name")?;
    let last = pool(&spec.last_names, "last name")?;
    let kinds = pool(&spec.relation_kinds, "relation kind")?;

    let mut ops = Vec::with_capacity(count);
    for _ in 0..count {
        let source_name = full_name(first, last, rng);
        let target_name = full_name(first, last, rng);
        let relation_kind = pick(kinds, rng).to_string();
        ops.push(InsertOp {
            source_name,
            target_name,
            relation_kind,
        });
    }
    Ok(ops)
}

fn pool<'a>(values: &'a [String], what: &str) -> Result<&'a [String]> {
    if values.is_empty() {
        return Err(SocialGraphError::InvalidParameter(format!(
            "{} pool is empty",
            what
        )));
    }
    Ok(values)
}

// Pools are checked non-empty before drawing.
fn pick<'a, R: Rng + ?Sized>(values: &'a [String], rng: &mut R) -> &'a str {
    values.choose(rng).map(String::as_str).unwrap_or_default()
}

fn full_name<R: Rng + ?Sized>(first: &[String], last: &[String], rng: &mut R) -> String {
    format!("{} {}", pick(first, rng), pick(last, rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn spec(relation_count: usize) -> GeneratorSpec {
        GeneratorSpec {
            first_names: vec!["Alice".into(), "Bob".into(), "Carol".into()],
            last_names: vec!["Smith".into(), "Jones".into()],
            relation_kinds: vec!["KNOWS".into(), "LIKES".into()],
            relation_count,
            max_relation_count: 100,
        }
    }

    #[test]
    fn test_zero_count_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(generate(&spec(0), &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_zero_count_ignores_empty_pools() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = spec(0);
        s.first_names.clear();
        assert!(generate(&s, &mut rng).unwrap().is_empty());
    }

    #[test]
    fn test_generates_exact_count_from_pools() {
        let mut rng = StdRng::seed_from_u64(7);
        let s = spec(40);
        let ops = generate(&s, &mut rng).unwrap();
        assert_eq!(ops.len(), 40);

        let mut names = HashSet::new();
        for first in &s.first_names {
            for last in &s.last_names {
                names.insert(format!("{} {}", first, last));
            }
        }
        for op in &ops {
            assert!(names.contains(&op.source_name), "{}", op.source_name);
            assert!(names.contains(&op.target_name), "{}", op.target_name);
            assert!(s.relation_kinds.contains(&op.relation_kind));
        }
    }

    #[test]
    fn test_same_seed_same_batch() {
        let a = generate(&spec(25), &mut StdRng::seed_from_u64(99)).unwrap();
        let b = generate(&spec(25), &mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_self_relations_are_kept() {
        let mut s = spec(10);
        s.first_names = vec!["Solo".into()];
        s.last_names = vec!["Person".into()];
        let ops = generate(&s, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(ops.len(), 10);
        assert!(ops.iter().all(|op| op.source_name == op.target_name));
    }

    #[test]
    fn test_count_above_ceiling_rejected() {
        let err = generate(&spec(101), &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, SocialGraphError::InvalidParameter(_)));
        assert!(check_relation_count(100, 100).is_ok());
    }

    #[test]
    fn test_empty_pool_rejected() {
        let mut s = spec(5);
        s.relation_kinds.clear();
        let err = generate(&s, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(err.to_string().contains("relation kind"));
    }

    #[test]
    fn test_from_config_copies_pools() {
        let config = GeneratorConfig::default();
        let s = GeneratorSpec::from_config(&config, 12);
        assert_eq!(s.relation_count, 12);
        assert_eq!(s.max_relation_count, config.max_relation_count);
        assert_eq!(s.first_names, config.first_names);
    }
}
