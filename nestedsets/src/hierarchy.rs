//! In-memory helpers: flat↔nested conversion, rendering, integrity
//! validation and renumbering from a nested literal. Nothing here touches a
//! store.

use std::collections::BTreeMap;

use itertools::Itertools;
use storage::Record;

use crate::schema::{TreeSchema, TreeScope};
use crate::Error;

/// A node of a nested literal: the row itself plus its child subtrees.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub record: Record,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Leaf wrapper around a record.
    pub fn new(record: Record) -> Self {
        TreeNode {
            record,
            children: Vec::new(),
        }
    }

    /// Node with the given child subtrees.
    pub fn with_children(record: Record, children: Vec<TreeNode>) -> Self {
        TreeNode { record, children }
    }
}

/// A structural defect found by [`validate_tree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("node {id:?} has lft {lft} >= rgt {rgt}")]
    InvalidBounds {
        id: Option<u64>,
        lft: i64,
        rgt: i64,
    },
    #[error("node {id:?} straddles a range it does not contain")]
    Overlap { id: Option<u64> },
    #[error("node {id:?} has depth {actual}, expected {expected}")]
    WrongDepth {
        id: Option<u64>,
        actual: i64,
        expected: i64,
    },
    #[error("node {id:?} has no integer value for column `{column}`")]
    MissingColumn { id: Option<u64>, column: String },
}

struct Keyed<'a> {
    tree: Option<i64>,
    lft: i64,
    rgt: i64,
    record: &'a Record,
}

/// Groups a flat node list into nested trees by range containment.
///
/// Input order does not matter; nodes are sorted by tree, then `lft`. Each
/// independent root of the input becomes one top-level entry.
pub fn build_tree(records: &[Record], schema: &TreeSchema) -> Result<Vec<TreeNode>, Error> {
    let keyed: Vec<Keyed> = records
        .iter()
        .map(|record| {
            Ok(Keyed {
                tree: schema.tree_of(record)?,
                lft: schema.left_of(record)?,
                rgt: schema.right_of(record)?,
                record,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?
        .into_iter()
        .sorted_by_key(|keyed| (keyed.tree, keyed.lft))
        .collect();
    Ok(group(&keyed))
}

fn group(items: &[Keyed]) -> Vec<TreeNode> {
    let mut nodes = Vec::new();
    let mut index = 0;
    while index < items.len() {
        let head = &items[index];
        let mut end = index + 1;
        while end < items.len() && items[end].tree == head.tree && items[end].rgt < head.rgt {
            end += 1;
        }
        nodes.push(TreeNode {
            record: head.record.clone(),
            children: group(&items[index + 1..end]),
        });
        index = end;
    }
    nodes
}

/// Pre-order walk of nested trees, emitting each record with its nesting
/// level (0 for the top level).
pub fn flatten_tree(nodes: &[TreeNode]) -> Vec<(Record, i64)> {
    fn walk(nodes: &[TreeNode], level: i64, out: &mut Vec<(Record, i64)>) {
        for node in nodes {
            out.push((node.record.clone(), level));
            walk(&node.children, level + 1, out);
        }
    }
    let mut out = Vec::new();
    walk(nodes, 0, &mut out);
    out
}

/// Renders the path from the outermost ancestor down to `record`, joining
/// each node's `name_field` with `separator`. Nodes missing the field render
/// as an empty segment.
pub fn path_string(
    record: &Record,
    ancestors: &[Record],
    separator: &str,
    name_field: &str,
) -> String {
    ancestors
        .iter()
        .chain(std::iter::once(record))
        .map(|node| {
            node.get(name_field)
                .map(ToString::to_string)
                .unwrap_or_default()
        })
        .join(separator)
}

/// Indentation prefix for rendering a node at its depth: `indent_string`
/// repeated `depth` times followed by `prefix`, or empty at depth 0.
pub fn indent(
    record: &Record,
    schema: &TreeSchema,
    indent_string: &str,
    prefix: &str,
) -> Result<String, Error> {
    let depth = schema.depth_of(record)?;
    if depth <= 0 {
        return Ok(String::new());
    }
    let mut rendered = indent_string.repeat(depth as usize);
    rendered.push_str(prefix);
    Ok(rendered)
}

/// Checks a flat node list for structural integrity, per tree scope.
///
/// A sorted sweep keeps a stack of open ranges: entries whose `rgt` lies
/// before the current node's `lft` are closed, the stack top must contain
/// the current range, and the stack size is the expected depth.
pub fn validate_tree(records: &[Record], schema: &TreeSchema) -> Result<(), ValidationError> {
    let mut scopes: BTreeMap<Option<i64>, Vec<&Record>> = BTreeMap::new();
    for record in records {
        let tree = match schema.scope() {
            TreeScope::Single => None,
            TreeScope::Column(column) => Some(record.int(column).ok_or_else(|| {
                ValidationError::MissingColumn {
                    id: record.id(),
                    column: column.to_owned(),
                }
            })?),
        };
        scopes.entry(tree).or_default().push(record);
    }
    for scope in scopes.values() {
        validate_scope(scope, schema)?;
    }
    Ok(())
}

fn validate_scope(records: &[&Record], schema: &TreeSchema) -> Result<(), ValidationError> {
    let int_column = |record: &Record, column: &str| {
        record
            .int(column)
            .ok_or_else(|| ValidationError::MissingColumn {
                id: record.id(),
                column: column.to_owned(),
            })
    };
    let mut keyed = records
        .iter()
        .map(|record| {
            Ok((
                int_column(record, schema.left())?,
                int_column(record, schema.right())?,
                int_column(record, schema.depth())?,
                record.id(),
            ))
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;
    keyed.sort_by_key(|(lft, ..)| *lft);

    let mut open: Vec<i64> = Vec::new();
    for (lft, rgt, depth, id) in keyed {
        if lft >= rgt {
            return Err(ValidationError::InvalidBounds { id, lft, rgt });
        }
        while matches!(open.last(), Some(frame) if *frame < lft) {
            open.pop();
        }
        if matches!(open.last(), Some(frame) if *frame < rgt) {
            return Err(ValidationError::Overlap { id });
        }
        let expected = open.len() as i64;
        if depth != expected {
            return Err(ValidationError::WrongDepth {
                id,
                actual: depth,
                expected,
            });
        }
        open.push(rgt);
    }
    Ok(())
}

/// Computes `(lft, rgt, depth)` for every node of a nested literal.
///
/// Each top-level tree numbers independently from 1 (one scope per root).
/// Tuples come out in post-order: a node follows all of its descendants.
pub fn rebuild_from_hierarchy(nodes: &[TreeNode]) -> Vec<(Record, i64, i64, i64)> {
    fn assign(
        node: &TreeNode,
        counter: &mut i64,
        depth: i64,
        out: &mut Vec<(Record, i64, i64, i64)>,
    ) {
        let lft = *counter;
        *counter += 1;
        for child in &node.children {
            assign(child, counter, depth + 1, out);
        }
        let rgt = *counter;
        *counter += 1;
        out.push((node.record.clone(), lft, rgt, depth));
    }

    let mut out = Vec::new();
    for node in nodes {
        let mut counter = 1;
        assign(node, &mut counter, 0, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> TreeSchema {
        TreeSchema::new("pages")
    }

    fn page(name: &str, lft: i64, rgt: i64, depth: i64) -> Record {
        Record::new("pages")
            .with("name", name)
            .with("lft", lft)
            .with("rgt", rgt)
            .with("depth", depth)
    }

    fn names(nodes: &[TreeNode]) -> Vec<String> {
        nodes
            .iter()
            .map(|node| node.record.get("name").unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_build_tree_groups_by_containment() {
        // root -> [a -> [a1], b]
        let records = vec![
            page("b", 6, 7, 1),
            page("root", 1, 8, 0),
            page("a1", 3, 4, 2),
            page("a", 2, 5, 1),
        ];
        let tree = build_tree(&records, &schema()).expect("expected tree to build");
        assert_eq!(names(&tree), vec!["root"]);
        assert_eq!(names(&tree[0].children), vec!["a", "b"]);
        assert_eq!(names(&tree[0].children[0].children), vec!["a1"]);
        assert!(tree[0].children[1].children.is_empty());
    }

    #[test]
    fn test_build_tree_separates_scopes() {
        let schema = TreeSchema::new("pages").scoped_by("tree");
        let records = vec![
            page("t2_root", 1, 4, 0).with("tree", 2),
            page("t1_root", 1, 6, 0).with("tree", 1),
            page("t1_child", 2, 5, 1).with("tree", 1),
            page("t2_child", 2, 3, 1).with("tree", 2),
        ];
        let tree = build_tree(&records, &schema).expect("expected tree to build");
        assert_eq!(names(&tree), vec!["t1_root", "t2_root"]);
        assert_eq!(names(&tree[0].children), vec!["t1_child"]);
        assert_eq!(names(&tree[1].children), vec!["t2_child"]);
    }

    #[test]
    fn test_flatten_tree_inverts_build_tree() {
        let records = vec![
            page("root", 1, 8, 0),
            page("a", 2, 5, 1),
            page("a1", 3, 4, 2),
            page("b", 6, 7, 1),
        ];
        let tree = build_tree(&records, &schema()).expect("expected tree to build");
        let flattened = flatten_tree(&tree);
        let expected: Vec<(Record, i64)> = records
            .iter()
            .map(|record| (record.clone(), record.int("depth").unwrap()))
            .collect();
        assert_eq!(flattened, expected);
    }

    #[test]
    fn test_path_string() {
        let root = page("root", 1, 6, 0);
        let a = page("a", 2, 5, 1);
        let a1 = page("a1", 3, 4, 2);
        assert_eq!(
            path_string(&a1, &[root.clone(), a.clone()], " / ", "name"),
            "root / a / a1"
        );
        assert_eq!(path_string(&root, &[], " / ", "name"), "root");
        assert_eq!(path_string(&a1, &[root, a], ".", "missing"), "..");
    }

    #[test]
    fn test_indent() {
        assert_eq!(
            indent(&page("root", 1, 6, 0), &schema(), "  ", "- ").expect("expected indent"),
            ""
        );
        assert_eq!(
            indent(&page("a1", 3, 4, 2), &schema(), "  ", "- ").expect("expected indent"),
            "    - "
        );
    }

    #[test]
    fn test_validate_tree_accepts_well_formed_trees() {
        let records = vec![
            page("root", 1, 8, 0),
            page("a", 2, 5, 1),
            page("a1", 3, 4, 2),
            page("b", 6, 7, 1),
        ];
        assert_eq!(validate_tree(&records, &schema()), Ok(()));
    }

    #[test]
    fn test_validate_tree_reports_overlap() {
        let records = vec![page("a", 1, 4, 0), page("b", 3, 6, 0)];
        assert!(matches!(
            validate_tree(&records, &schema()),
            Err(ValidationError::Overlap { .. })
        ));
    }

    #[test]
    fn test_validate_tree_reports_wrong_depth() {
        let records = vec![page("a", 1, 4, 0), page("b", 2, 3, 2)];
        assert!(matches!(
            validate_tree(&records, &schema()),
            Err(ValidationError::WrongDepth { expected: 1, .. })
        ));
    }

    #[test]
    fn test_validate_tree_reports_inverted_bounds() {
        let records = vec![page("a", 5, 4, 0)];
        assert!(matches!(
            validate_tree(&records, &schema()),
            Err(ValidationError::InvalidBounds { lft: 5, rgt: 4, .. })
        ));
    }

    #[test]
    fn test_rebuild_from_hierarchy() {
        let literal = vec![TreeNode::with_children(
            Record::new("pages").with("name", "root"),
            vec![
                TreeNode::with_children(
                    Record::new("pages").with("name", "a"),
                    vec![TreeNode::new(Record::new("pages").with("name", "a1"))],
                ),
                TreeNode::new(Record::new("pages").with("name", "b")),
            ],
        )];
        let rebuilt = rebuild_from_hierarchy(&literal);
        let summary: Vec<(String, i64, i64, i64)> = rebuilt
            .iter()
            .map(|(record, lft, rgt, depth)| {
                (record.get("name").unwrap().to_string(), *lft, *rgt, *depth)
            })
            .collect();
        // Post-order: descendants come before their ancestors.
        assert_eq!(
            summary,
            vec![
                (String::from("a1"), 3, 4, 2),
                (String::from("a"), 2, 5, 1),
                (String::from("b"), 6, 7, 1),
                (String::from("root"), 1, 8, 0),
            ]
        );

        // The computed ranges form a valid tree.
        let records: Vec<Record> = rebuilt
            .into_iter()
            .map(|(record, lft, rgt, depth)| {
                record.with("lft", lft).with("rgt", rgt).with("depth", depth)
            })
            .collect();
        assert_eq!(validate_tree(&records, &schema()), Ok(()));
    }

    #[test]
    fn test_rebuild_numbers_top_level_trees_independently() {
        let literal = vec![
            TreeNode::with_children(
                Record::new("pages").with("name", "first"),
                vec![TreeNode::new(Record::new("pages").with("name", "child"))],
            ),
            TreeNode::new(Record::new("pages").with("name", "second")),
        ];
        let rebuilt = rebuild_from_hierarchy(&literal);
        let bounds: Vec<(i64, i64, i64)> = rebuilt
            .iter()
            .map(|(_, lft, rgt, depth)| (*lft, *rgt, *depth))
            .collect();
        assert_eq!(bounds, vec![(2, 3, 1), (1, 4, 0), (1, 2, 0)]);
    }
}
