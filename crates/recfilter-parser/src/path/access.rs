//! Path accessors: read, test existence, set and delete.
//!
//! Read walks the record one chunk at a time, keeping a *frontier* — the
//! set of currently-active nodes — in two buffers swapped at each step, so
//! arbitrary record depth is handled without recursion. Write and delete
//! target a single path and so are implemented as a direct recursive
//! descent that creates missing containers as it goes.

use super::chunk::{Chunk, Index};
use crate::error::PathShapeError;
use crate::value::Value;
use indexmap::IndexMap;

/// The result of a [`set`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Set,
    /// `overwrite` was disabled and a value was already present.
    Exists,
    /// `unique` was enabled and the list already contained the value.
    Duplicate,
}

/// Returns every value the path selects, in encounter order. Total: shape
/// violations and out-of-range indices are silent no-ops that simply
/// contribute nothing to the result.
pub fn values(record: &Value, chunks: &[Chunk]) -> Vec<Value> {
    let mut frontier: Vec<&Value> = vec![record];
    for chunk in chunks {
        let mut next: Vec<&Value> = Vec::new();
        for node in frontier {
            let Some(map) = node.as_map() else { continue };
            let Some(child) = map.get(&chunk.name) else {
                continue;
            };
            expand_read(child, chunk.index, &mut next);
        }
        frontier = next;
    }
    frontier.into_iter().cloned().collect()
}

fn expand_read<'a>(child: &'a Value, index: Index, out: &mut Vec<&'a Value>) {
    match index {
        Index::Absent => {
            if let Some(items) = child.as_seq() {
                out.extend(items.iter());
            } else {
                out.push(child);
            }
        }
        Index::All => {
            if let Some(items) = child.as_seq() {
                out.extend(items.iter());
            }
        }
        Index::Last => {
            if let Some(items) = child.as_seq() {
                if let Some(last) = items.last() {
                    out.push(last);
                }
            }
        }
        Index::Num(i) => {
            if let Some(items) = child.as_seq() {
                if let Some(v) = items.get(i) {
                    out.push(v);
                }
            }
        }
    }
}

/// The first value the path selects, or [`Value::Absent`].
pub fn value(record: &Value, chunks: &[Chunk]) -> Value {
    values(record, chunks).into_iter().next().unwrap_or(Value::Absent)
}

/// Whether the path selects anything.
pub fn exists(record: &Value, chunks: &[Chunk]) -> bool {
    !value(record, chunks).is_absent()
}

/// Writes `v` at `chunks`, creating missing map keys and sequences along
/// the way. Behavior per index form is documented on [`Index`].
pub fn set(
    record: &mut Value,
    chunks: &[Chunk],
    v: Value,
    overwrite: bool,
    unique: bool,
) -> Result<SetOutcome, PathShapeError> {
    assert!(!chunks.is_empty(), "path must not be empty");
    set_rec(record, chunks, v, overwrite, unique, String::new())
}

fn ensure_map<'a>(node: &'a mut Value, at: &str) -> Result<&'a mut IndexMap<String, Value>, PathShapeError> {
    match node {
        Value::Map(_) => {}
        Value::Seq(_) => return Err(PathShapeError::ExpectedMap(at.to_string())),
        other => *other = Value::Map(IndexMap::new()),
    }
    Ok(node.as_map_mut().unwrap())
}

fn ensure_seq<'a>(node: &'a mut Value, at: &str) -> Result<&'a mut Vec<Value>, PathShapeError> {
    match node {
        Value::Seq(_) => {}
        Value::Map(_) => return Err(PathShapeError::ExpectedSequence(at.to_string())),
        other => *other = Value::Seq(Vec::new()),
    }
    Ok(node.as_seq_mut().unwrap())
}

fn set_rec(
    node: &mut Value,
    chunks: &[Chunk],
    v: Value,
    overwrite: bool,
    unique: bool,
    at: String,
) -> Result<SetOutcome, PathShapeError> {
    let chunk = &chunks[0];
    let rest = &chunks[1..];
    let here = format!("{at}{}", chunk.name);

    if rest.is_empty() {
        let map = ensure_map(node, &at)?;
        return match chunk.index {
            Index::Absent => {
                if map.contains_key(&chunk.name) && !overwrite {
                    Ok(SetOutcome::Exists)
                } else {
                    map.insert(chunk.name.clone(), v);
                    Ok(SetOutcome::Set)
                }
            }
            Index::Num(i) => {
                let entry = map.entry(chunk.name.clone()).or_insert_with(|| Value::Seq(Vec::new()));
                let seq = ensure_seq(entry, &here)?;
                while seq.len() <= i {
                    seq.push(Value::Absent);
                }
                if !matches!(seq[i], Value::Absent) && !overwrite {
                    return Ok(SetOutcome::Exists);
                }
                seq[i] = v;
                Ok(SetOutcome::Set)
            }
            Index::Last => {
                let entry = map.entry(chunk.name.clone()).or_insert_with(|| Value::Seq(Vec::new()));
                let seq = ensure_seq(entry, &here)?;
                if seq.is_empty() {
                    seq.push(v);
                    return Ok(SetOutcome::Set);
                }
                if unique && seq.contains(&v) {
                    return Ok(SetOutcome::Duplicate);
                }
                *seq.last_mut().unwrap() = v;
                Ok(SetOutcome::Set)
            }
            Index::All => {
                let entry = map.entry(chunk.name.clone()).or_insert_with(|| Value::Seq(Vec::new()));
                let seq = ensure_seq(entry, &here)?;
                if unique && seq.contains(&v) {
                    return Ok(SetOutcome::Duplicate);
                }
                seq.push(v);
                Ok(SetOutcome::Set)
            }
        };
    }

    let map = ensure_map(node, &at)?;
    match chunk.index {
        Index::Absent => {
            let child = map
                .entry(chunk.name.clone())
                .or_insert_with(|| Value::Map(IndexMap::new()));
            set_rec(child, rest, v, overwrite, unique, format!("{here}."))
        }
        Index::Num(i) => {
            let entry = map.entry(chunk.name.clone()).or_insert_with(|| Value::Seq(Vec::new()));
            let seq = ensure_seq(entry, &here)?;
            while seq.len() <= i {
                seq.push(Value::Map(IndexMap::new()));
            }
            set_rec(&mut seq[i], rest, v, overwrite, unique, format!("{here}."))
        }
        Index::Last => {
            let entry = map.entry(chunk.name.clone()).or_insert_with(|| Value::Seq(Vec::new()));
            let seq = ensure_seq(entry, &here)?;
            if seq.is_empty() {
                seq.push(Value::Map(IndexMap::new()));
            }
            set_rec(seq.last_mut().unwrap(), rest, v, overwrite, unique, format!("{here}."))
        }
        Index::All => {
            let entry = map.entry(chunk.name.clone()).or_insert_with(|| Value::Seq(Vec::new()));
            let seq = ensure_seq(entry, &here)?;
            seq.push(Value::Map(IndexMap::new()));
            let last = seq.last_mut().unwrap();
            set_rec(last, rest, v, overwrite, unique, format!("{here}."))
        }
    }
}

/// Removes the target of `chunks`. A wildcard on the final chunk deletes
/// the whole sequence it addresses, not just one element.
pub fn unset(record: &mut Value, chunks: &[Chunk]) -> Result<bool, PathShapeError> {
    assert!(!chunks.is_empty(), "path must not be empty");
    unset_rec(record, chunks, String::new())
}

fn unset_rec(node: &mut Value, chunks: &[Chunk], at: String) -> Result<bool, PathShapeError> {
    let chunk = &chunks[0];
    let rest = &chunks[1..];
    let here = format!("{at}{}", chunk.name);

    let Some(map) = node.as_map() else {
        return Err(PathShapeError::ExpectedMap(at));
    };
    if !map.contains_key(&chunk.name) {
        return Ok(false);
    }

    if rest.is_empty() {
        let map = node.as_map_mut().unwrap();
        return match chunk.index {
            Index::Absent => Ok(map.shift_remove(&chunk.name).is_some()),
            Index::All => Ok(map.shift_remove(&chunk.name).is_some()),
            Index::Num(i) => {
                let Some(seq) = map.get_mut(&chunk.name).and_then(|v| v.as_seq_mut()) else {
                    return Err(PathShapeError::ExpectedSequence(here));
                };
                if i < seq.len() {
                    seq.remove(i);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Index::Last => {
                let Some(seq) = map.get_mut(&chunk.name).and_then(|v| v.as_seq_mut()) else {
                    return Err(PathShapeError::ExpectedSequence(here));
                };
                Ok(seq.pop().is_some())
            }
        };
    }

    let map = node.as_map_mut().unwrap();
    let child = map.get_mut(&chunk.name).unwrap();
    match chunk.index {
        Index::Absent => unset_rec(child, rest, format!("{here}.")),
        Index::All => {
            let Some(seq) = child.as_seq_mut() else {
                return Err(PathShapeError::ExpectedSequence(here));
            };
            let mut removed_any = false;
            for item in seq.iter_mut() {
                if unset_rec(item, rest, format!("{here}."))? {
                    removed_any = true;
                }
            }
            Ok(removed_any)
        }
        Index::Last => {
            let Some(seq) = child.as_seq_mut() else {
                return Err(PathShapeError::ExpectedSequence(here));
            };
            match seq.last_mut() {
                Some(last) => unset_rec(last, rest, format!("{here}.")),
                None => Ok(false),
            }
        }
        Index::Num(i) => {
            let Some(seq) = child.as_seq_mut() else {
                return Err(PathShapeError::ExpectedSequence(here));
            };
            match seq.get_mut(i) {
                Some(item) => unset_rec(item, rest, format!("{here}.")),
                None => Ok(false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::parse;
    use pretty_assertions::assert_eq;

    fn map(pairs: Vec<(&str, Value)>) -> Value {
        let mut m = IndexMap::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v);
        }
        Value::Map(m)
    }

    fn record_fixture() -> Value {
        map(vec![(
            "Source",
            Value::Seq(vec![
                map(vec![(
                    "IP4",
                    Value::Seq(vec![
                        Value::Str("192.168.1.1".into()),
                        Value::Str("192.168.1.2".into()),
                    ]),
                )]),
                map(vec![(
                    "IP4",
                    Value::Seq(vec![
                        Value::Str("192.168.2.1".into()),
                        Value::Str("192.168.2.2".into()),
                    ]),
                )]),
            ]),
        )])
    }

    fn strs(values: Vec<Value>) -> Vec<String> {
        values
            .into_iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn scenario_1_path_read() {
        let record = record_fixture();

        let all_ips = values(&record, &parse("Source.IP4").unwrap());
        assert_eq!(
            strs(all_ips),
            vec!["192.168.1.1", "192.168.1.2", "192.168.2.1", "192.168.2.2"]
        );

        let last_of_second = values(&record, &parse("Source[2].IP4[#]").unwrap());
        assert_eq!(strs(last_of_second), vec!["192.168.2.2"]);

        let firsts = values(&record, &parse("Source[*].IP4[1]").unwrap());
        assert_eq!(strs(firsts), vec!["192.168.1.1", "192.168.2.1"]);
    }

    #[test]
    fn scenario_2_path_set() {
        let mut record = Value::Map(IndexMap::new());
        let outcome1 = set(
            &mut record,
            &parse("A.B[1].C").unwrap(),
            Value::Str("x".into()),
            true,
            false,
        )
        .unwrap();
        let outcome2 = set(
            &mut record,
            &parse("A.B[#].D").unwrap(),
            Value::Str("y".into()),
            true,
            false,
        )
        .unwrap();

        assert_eq!(outcome1, SetOutcome::Set);
        assert_eq!(outcome2, SetOutcome::Set);

        let b = record.as_map().unwrap().get("A").unwrap().as_map().unwrap().get("B").unwrap();
        let seq = b.as_seq().unwrap();
        assert_eq!(seq.len(), 1);
        let elem = seq[0].as_map().unwrap();
        assert_eq!(elem.get("C").unwrap(), &Value::Str("x".into()));
        assert_eq!(elem.get("D").unwrap(), &Value::Str("y".into()));
    }

    #[test]
    fn set_respects_overwrite_flag() {
        let mut record = Value::Map(IndexMap::new());
        set(&mut record, &parse("A").unwrap(), Value::Int(1), true, false).unwrap();
        let outcome = set(&mut record, &parse("A").unwrap(), Value::Int(2), false, false).unwrap();
        assert_eq!(outcome, SetOutcome::Exists);
        assert_eq!(record.as_map().unwrap().get("A").unwrap(), &Value::Int(1));
    }

    #[test]
    fn unset_removes_target() {
        let mut record = record_fixture();
        let removed = unset(&mut record, &parse("Source[1].IP4[#]").unwrap()).unwrap();
        assert!(removed);
        let remaining = values(&record, &parse("Source[1].IP4").unwrap());
        assert_eq!(strs(remaining), vec!["192.168.1.1"]);
    }

    #[test]
    fn unset_wildcard_on_final_chunk_drops_whole_sequence() {
        let mut record = record_fixture();
        let removed = unset(&mut record, &parse("Source[1].IP4[*]").unwrap()).unwrap();
        assert!(removed);
        assert!(!exists(&record, &parse("Source[1].IP4").unwrap()));
    }

    #[test]
    fn read_is_total_over_shape_violations() {
        let record = map(vec![("A", Value::Str("scalar".into()))]);
        // A[*] expects a sequence but finds a scalar: silent empty result.
        assert!(values(&record, &parse("A[*]").unwrap()).is_empty());
    }
}
