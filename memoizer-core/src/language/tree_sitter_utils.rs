use tree_sitter::Node;

/// Direct children of `node` with the given kind, in source order
pub fn children_of_kind<'a>(node: Node<'a>, kind: &str) -> Vec<Node<'a>> {
    let mut cursor = node.walk();
    let result = node
        .children(&mut cursor)
        .filter(|child| child.kind() == kind)
        .collect();
    result
}

/// First node of `kind` in a depth-first, source-order walk (including `node`)
pub fn first_descendant_of_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    if node.kind() == kind {
        return Some(node);
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_descendant_of_kind(child, kind) {
            return Some(found);
        }
    }

    None
}

/// Source text of `node`; empty if the node's range is not valid for `source`
pub fn node_text<'s>(node: Node<'_>, source: &'s str) -> &'s str {
    source.get(node.start_byte()..node.end_byte()).unwrap_or("")
}

/// 1-indexed line of the node's first byte
pub fn start_line(node: Node<'_>) -> u32 {
    node.start_position().row as u32 + 1
}
