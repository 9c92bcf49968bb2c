use crate::models::graph::{GraphLink, GraphNode, GraphView, NodeKind, ViewScale};
use crate::models::snapshot::{Class, Library, Snapshot};
use crate::view::color::{color_for_score, score_bar_width};
use crate::view::layout::seed_positions;

pub const ROOT_ID: &str = "root";

const UNIVERSE_ROOT_RADIUS: f64 = 40.0;
const LIBRARY_ROOT_RADIUS: f64 = 32.0;
const CLASS_RADIUS: f64 = 10.0;
const INVARIANT_CLASS_RADIUS: f64 = 14.0;

/// Universe scale: the snapshot in the middle, one node per library.
pub fn universe_view(snapshot: &Snapshot, width: f64, height: f64) -> GraphView {
    let (center, ring) = seed_positions(snapshot.libraries.len(), ViewScale::Universe, width, height);

    let mut nodes = vec![GraphNode {
        id: ROOT_ID.to_string(),
        label: snapshot.name.clone(),
        kind: NodeKind::Root,
        score: snapshot.score,
        color: color_for_score(snapshot.score).to_string(),
        radius: UNIVERSE_ROOT_RADIUS,
        score_bar: score_bar_width(snapshot.score),
        tooltip: vec![
            snapshot.name.clone(),
            format!("Score: {}%", snapshot.score),
            format!("Libraries: {}", snapshot.library_count),
            format!("Classes: {}", snapshot.class_count),
            format!("Features: {}", snapshot.total_features),
            format!(
                "Require: {} / Ensure: {}",
                snapshot.total_requires, snapshot.total_ensures
            ),
            format!("Invariants: {}", snapshot.total_invariants),
        ],
        path: None,
        line: None,
        x: center.0,
        y: center.1,
    }];

    nodes.extend(
        snapshot
            .libraries
            .iter()
            .zip(ring)
            .map(|(library, (x, y))| library_node(library, x, y)),
    );

    GraphView {
        scale: ViewScale::Universe,
        breadcrumb: vec![snapshot.name.clone()],
        links: star_links(&nodes),
        nodes,
        width,
        height,
    }
}

/// Library scale: the library in the middle, one node per class.
pub fn library_view(universe_name: &str, library: &Library, width: f64, height: f64) -> GraphView {
    let (center, ring) = seed_positions(library.classes.len(), ViewScale::Library, width, height);

    let mut root = library_node(library, center.0, center.1);
    root.id = ROOT_ID.to_string();
    root.kind = NodeKind::Root;
    root.radius = LIBRARY_ROOT_RADIUS;

    let mut nodes = vec![root];
    nodes.extend(
        library
            .classes
            .iter()
            .enumerate()
            .zip(ring)
            .map(|((i, class), (x, y))| class_node(i, class, x, y)),
    );

    GraphView {
        scale: ViewScale::Library,
        breadcrumb: vec![universe_name.to_string(), library.name.clone()],
        links: star_links(&nodes),
        nodes,
        width,
        height,
    }
}

/// Library nodes grow with the number of classes they hold.
pub fn library_radius(class_count: usize) -> f64 {
    (12.0 + 4.0 * (class_count as f64).sqrt()).min(36.0)
}

fn library_node(library: &Library, x: f64, y: f64) -> GraphNode {
    GraphNode {
        id: format!("lib:{}", library.name),
        label: library.name.clone(),
        kind: NodeKind::Library,
        score: library.score,
        color: color_for_score(library.score).to_string(),
        radius: library_radius(library.classes.len()),
        score_bar: score_bar_width(library.score),
        tooltip: vec![
            library.name.clone(),
            format!("Score: {}%", library.score),
            format!("Features: {}", library.feature_count),
            format!(
                "Require: {} / Ensure: {}",
                library.require_count, library.ensure_count
            ),
            format!("Invariants: {}", library.invariant_count),
        ],
        path: Some(library.path.clone()),
        line: None,
        x,
        y,
    }
}

fn class_node(index: usize, class: &Class, x: f64, y: f64) -> GraphNode {
    GraphNode {
        // Class names are not guaranteed unique within a library.
        id: format!("class:{index}:{}", class.name),
        label: class.name.clone(),
        kind: NodeKind::Class,
        score: class.score,
        color: color_for_score(class.score).to_string(),
        radius: if class.has_invariant {
            INVARIANT_CLASS_RADIUS
        } else {
            CLASS_RADIUS
        },
        score_bar: score_bar_width(class.score),
        tooltip: vec![
            class.name.clone(),
            format!("Score: {}%", class.score),
            format!("Features: {}", class.feature_count),
            format!(
                "Require: {} / Ensure: {}",
                class.require_count, class.ensure_count
            ),
            format!(
                "Invariant: {}",
                if class.has_invariant { "yes" } else { "no" }
            ),
        ],
        path: Some(class.path.clone()),
        line: Some(class.line),
        x,
        y,
    }
}

fn star_links(nodes: &[GraphNode]) -> Vec<GraphLink> {
    nodes
        .iter()
        .skip(1)
        .map(|node| GraphLink {
            source: ROOT_ID.to_string(),
            target: node.id.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sample::sample_snapshot;

    #[test]
    fn universe_view_has_root_and_one_node_per_library() {
        let snapshot = sample_snapshot();
        let view = universe_view(&snapshot, 1200.0, 800.0);

        assert_eq!(view.scale, ViewScale::Universe);
        assert_eq!(view.nodes.len(), snapshot.libraries.len() + 1);
        assert_eq!(view.links.len(), snapshot.libraries.len());
        assert_eq!(view.nodes[0].kind, NodeKind::Root);
        assert_eq!((view.nodes[0].x, view.nodes[0].y), (600.0, 400.0));
        assert_eq!(view.breadcrumb, vec![snapshot.name.clone()]);
    }

    #[test]
    fn nodes_carry_color_and_score_bar() {
        let snapshot = sample_snapshot();
        let view = universe_view(&snapshot, 1200.0, 800.0);

        for node in &view.nodes {
            assert_eq!(node.color, color_for_score(node.score));
            assert_eq!(node.score_bar, node.score);
            assert_eq!(node.tooltip[1], format!("Score: {}%", node.score));
        }
    }

    #[test]
    fn library_view_links_classes_to_library() {
        let snapshot = sample_snapshot();
        let library = snapshot.find_library("simple_json").unwrap();
        let view = library_view(&snapshot.name, library, 1000.0, 1000.0);

        assert_eq!(view.scale, ViewScale::Library);
        assert_eq!(view.breadcrumb, vec![snapshot.name.clone(), "simple_json".to_string()]);
        assert_eq!(view.nodes.len(), library.classes.len() + 1);
        assert_eq!(view.nodes[0].id, ROOT_ID);
        assert_eq!(view.nodes[1].line, Some(1));
        assert!(view.nodes[1].path.as_deref().unwrap().ends_with("json_parser.e"));
        assert!(view.links.iter().all(|link| link.source == ROOT_ID));

        // First class sits on the ring at 0.30 × min(width, height).
        assert!((view.nodes[1].x - (500.0 + 300.0)).abs() < 1e-9);
    }

    #[test]
    fn invariant_classes_are_larger() {
        let snapshot = sample_snapshot();
        let library = snapshot.find_library("simple_json").unwrap();
        let view = library_view(&snapshot.name, library, 800.0, 600.0);

        assert_eq!(view.nodes[1].radius, INVARIANT_CLASS_RADIUS);
        assert_eq!(view.nodes[3].radius, CLASS_RADIUS);
        assert_eq!(view.nodes[3].tooltip[4], "Invariant: no");
    }

    #[test]
    fn library_radius_is_capped() {
        assert_eq!(library_radius(0), 12.0);
        assert_eq!(library_radius(4), 20.0);
        assert_eq!(library_radius(10_000), 36.0);
    }

    #[test]
    fn rendering_is_deterministic() {
        let snapshot = sample_snapshot();
        assert_eq!(
            universe_view(&snapshot, 900.0, 700.0),
            universe_view(&snapshot, 900.0, 700.0)
        );
    }
}
