//! Snapshot -> JSON encoder.
//!
//! Each `.`-separated segment of a metric name becomes one level of object
//! nesting. Leaves carry a `type` tag plus kind-specific fields:
//!
//! ```text
//! {"a": {"b": {"type": "c", "val": 5}, "c": {"type": "g", "val": -3}}}
//! ```
//!
//! Distributions encode as `{"type": "d", "mean", "variance", "count", "sum", "min", "max"}`.

use std::collections::BTreeMap;

use serde_json::{json, Map};

use crate::error::{Result, VitalsError};
use crate::metric::Value;
use crate::name;
use crate::store::Snapshot;

/// Latest JSON document version. Clients pin with `?v=1`.
pub const API_VERSION: u32 = 1;

/// Encode a single metric as its leaf object.
pub fn encode_value(v: &Value) -> serde_json::Value {
    let tag = v.kind().tag();
    match v {
        Value::Counter(n) => json!({ "type": tag, "val": n }),
        Value::Gauge(n) => json!({ "type": tag, "val": n }),
        Value::Label(s) => json!({ "type": tag, "val": s }),
        Value::Distribution(d) => json!({
            "type": tag,
            "mean": d.mean,
            "variance": d.variance,
            "count": d.count,
            "sum": d.sum,
            "min": d.min,
            "max": d.max,
        }),
    }
}

enum Node<'a> {
    Leaf(&'a Value),
    Branch(BTreeMap<&'a str, Node<'a>>),
}

impl Node<'_> {
    /// Dotted path of some leaf below this node, relative to it.
    fn any_leaf_path(&self) -> Option<String> {
        match self {
            Node::Leaf(_) => Some(String::new()),
            Node::Branch(children) => children.iter().find_map(|(k, n)| {
                n.any_leaf_path().map(|rest| {
                    if rest.is_empty() {
                        (*k).to_string()
                    } else {
                        format!("{k}.{rest}")
                    }
                })
            }),
        }
    }

    fn into_json(self) -> serde_json::Value {
        match self {
            Node::Leaf(v) => encode_value(v),
            Node::Branch(children) => {
                let map: Map<String, serde_json::Value> = children
                    .into_iter()
                    .map(|(k, n)| (k.to_string(), n.into_json()))
                    .collect();
                serde_json::Value::Object(map)
            }
        }
    }
}

/// `rel` qualified by the namespace the entries were taken from.
fn qualify(ns: &str, rel: &str) -> String {
    if ns.is_empty() {
        rel.to_string()
    } else {
        format!("{ns}.{rel}")
    }
}

/// Builds the nested document. Entry names are relative to `ns`, which only
/// qualifies names in errors.
fn nest<'a, I>(ns: &str, entries: I) -> Result<serde_json::Value>
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut root: BTreeMap<&'a str, Node<'a>> = BTreeMap::new();

    for (full, value) in entries {
        let mut segs: Vec<&'a str> = name::segments(full).collect();
        let Some(leaf) = segs.pop() else { continue };

        let mut level = &mut root;
        for (i, seg) in segs.iter().enumerate() {
            let node = level
                .entry(*seg)
                .or_insert_with(|| Node::Branch(BTreeMap::new()));
            level = match node {
                Node::Branch(children) => children,
                Node::Leaf(_) => {
                    return Err(VitalsError::PrefixConflict {
                        name: qualify(ns, full),
                        existing: qualify(ns, &segs[..=i].join(".")),
                    })
                }
            };
        }
        if let Some(old) = level.insert(leaf, Node::Leaf(value)) {
            // Only a branch can sit here: names in a snapshot are unique.
            let existing = match old.any_leaf_path() {
                Some(rest) if !rest.is_empty() => format!("{full}.{rest}"),
                _ => full.to_string(),
            };
            return Err(VitalsError::PrefixConflict {
                name: qualify(ns, full),
                existing: qualify(ns, &existing),
            });
        }
    }

    Ok(Node::Branch(root).into_json())
}

/// Encode a full snapshot as a nested document.
///
/// Snapshots taken from a [`Store`](crate::Store) never collide; a hand-built
/// one where `foo` and `foo.bar` both appear fails with `PrefixConflict`.
pub fn encode_sample(sample: &Snapshot) -> Result<serde_json::Value> {
    nest("", sample.iter().map(|(k, v)| (k.as_str(), v)))
}

/// Encode the part of a snapshot under namespace `ns`, relative to it.
///
/// Returns `Ok(None)` when nothing lives under `ns`.
pub fn encode_subtree(sample: &Snapshot, ns: &str) -> Result<Option<serde_json::Value>> {
    let skip = ns.len() + 1;
    let mut under = sample
        .iter()
        .filter(|(k, _)| name::is_namespace_of(ns, k))
        .map(|(k, v)| (&k[skip..], v))
        .peekable();

    if under.peek().is_none() {
        return Ok(None);
    }
    nest(ns, under).map(Some)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::metric::DistributionStats;

    #[test]
    fn flat_name_is_top_level() {
        let mut s = Snapshot::new();
        s.insert("uptime".into(), Value::Counter(7));
        assert_eq!(
            encode_sample(&s).unwrap(),
            json!({ "uptime": { "type": "c", "val": 7 } })
        );
    }

    #[test]
    fn empty_distribution_is_zeroed() {
        let v = encode_value(&Value::Distribution(DistributionStats::default()));
        assert_eq!(
            v,
            json!({ "type": "d", "mean": 0.0, "variance": 0.0, "count": 0, "sum": 0.0, "min": 0.0, "max": 0.0 })
        );
    }

    #[test]
    fn prefix_collision_is_reported() {
        let mut s = Snapshot::new();
        s.insert("foo".into(), Value::Counter(1));
        s.insert("foo.bar".into(), Value::Counter(2));
        assert_eq!(
            encode_sample(&s).unwrap_err(),
            VitalsError::PrefixConflict {
                name: "foo.bar".into(),
                existing: "foo".into(),
            }
        );
    }

    #[test]
    fn prefix_collision_names_the_occupied_path() {
        let mut s = Snapshot::new();
        s.insert("a.b".into(), Value::Counter(1));
        s.insert("a.b.c.d".into(), Value::Counter(2));
        assert_eq!(
            encode_sample(&s).unwrap_err(),
            VitalsError::PrefixConflict {
                name: "a.b.c.d".into(),
                existing: "a.b".into(),
            }
        );

        // Inside a subtree the names stay fully qualified.
        assert_eq!(
            encode_subtree(&s, "a").unwrap_err(),
            VitalsError::PrefixConflict {
                name: "a.b.c.d".into(),
                existing: "a.b".into(),
            }
        );
    }

    #[test]
    fn leaf_landing_on_a_branch_names_a_leaf_below_it() {
        let a = Value::Counter(1);
        let b = Value::Counter(2);
        let err = nest("", [("x.y.z", &a), ("x.y", &b)]).unwrap_err();
        assert_eq!(
            err,
            VitalsError::PrefixConflict {
                name: "x.y".into(),
                existing: "x.y.z".into(),
            }
        );
    }

    #[test]
    fn subtree_is_relative_to_namespace() {
        let mut s = Snapshot::new();
        s.insert("http.req.ok".into(), Value::Counter(3));
        s.insert("http.req.err".into(), Value::Counter(1));
        s.insert("httpd".into(), Value::Label("x".into()));

        let sub = encode_subtree(&s, "http").unwrap().unwrap();
        assert_eq!(
            sub,
            json!({ "req": { "ok": { "type": "c", "val": 3 }, "err": { "type": "c", "val": 1 } } })
        );
        assert!(encode_subtree(&s, "nope").unwrap().is_none());
    }
}
