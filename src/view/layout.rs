//! Force-directed layout.
//!
//! A velocity-Verlet simulation in the style of d3-force: many-body charge,
//! spring links, collision and centering, cooled by a decaying `alpha`.
//! Everything is deterministic; coincident nodes are separated by a jiggle
//! derived from their indices instead of a random number.

use crate::models::graph::{GraphView, NodeKind, NodePosition, ViewScale};
use std::collections::HashMap;
use std::f64::consts::TAU;

/// The simulation is considered settled once alpha drops below this.
pub const ALPHA_MIN: f64 = 0.001;
/// Alpha the simulation is held at while a node is being dragged.
pub const DRAG_ALPHA_TARGET: f64 = 0.3;

const VELOCITY_RETAINED: f64 = 0.6;
const TICKS_TO_SETTLE: f64 = 300.0;

/// Force parameters for one view scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    pub root_charge: f64,
    pub leaf_charge: f64,
    pub collision_padding: f64,
    pub link_distance: f64,
    pub link_strength: f64,
    /// Seed ring radius as a fraction of `min(width, height)`.
    pub ring_factor: f64,
}

impl ForceParams {
    pub fn for_scale(scale: ViewScale) -> Self {
        match scale {
            ViewScale::Universe => Self {
                root_charge: -800.0,
                leaf_charge: -300.0,
                collision_padding: 20.0,
                link_distance: 150.0,
                link_strength: 0.3,
                ring_factor: 0.35,
            },
            ViewScale::Library => Self {
                root_charge: -200.0,
                leaf_charge: -200.0,
                collision_padding: 15.0,
                link_distance: 100.0,
                link_strength: 0.4,
                ring_factor: 0.30,
            },
        }
    }
}

/// Seed placement: root at the center, children evenly on a ring at
/// angle `2π·i/n`.
pub fn seed_positions(
    children: usize,
    scale: ViewScale,
    width: f64,
    height: f64,
) -> ((f64, f64), Vec<(f64, f64)>) {
    let center = (width / 2.0, height / 2.0);
    let radius = ForceParams::for_scale(scale).ring_factor * width.min(height);

    let ring = (0..children)
        .map(|i| {
            let angle = TAU * i as f64 / children as f64;
            (center.0 + radius * angle.cos(), center.1 + radius * angle.sin())
        })
        .collect();

    (center, ring)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Pinned coordinates while dragged.
    pub fx: Option<f64>,
    pub fy: Option<f64>,
    pub radius: f64,
    pub charge: f64,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    nodes: Vec<SimNode>,
    links: Vec<(usize, usize)>,
    index: HashMap<String, usize>,
    params: ForceParams,
    center: (f64, f64),
    alpha: f64,
    alpha_target: f64,
    alpha_decay: f64,
}

impl Simulation {
    /// Start a simulation from the seeded positions of a view.
    pub fn from_view(view: &GraphView) -> Self {
        let params = ForceParams::for_scale(view.scale);

        let nodes: Vec<SimNode> = view
            .nodes
            .iter()
            .map(|node| SimNode {
                id: node.id.clone(),
                x: node.x,
                y: node.y,
                vx: 0.0,
                vy: 0.0,
                fx: None,
                fy: None,
                radius: node.radius,
                charge: if node.kind == NodeKind::Root {
                    params.root_charge
                } else {
                    params.leaf_charge
                },
            })
            .collect();

        let index: HashMap<String, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();

        let links = view
            .links
            .iter()
            .filter_map(|link| Some((*index.get(&link.source)?, *index.get(&link.target)?)))
            .collect();

        Self {
            nodes,
            links,
            index,
            params,
            center: (view.width / 2.0, view.height / 2.0),
            alpha: 1.0,
            alpha_target: 0.0,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / TICKS_TO_SETTLE),
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn params(&self) -> ForceParams {
        self.params
    }

    pub fn is_settled(&self) -> bool {
        self.alpha < ALPHA_MIN
    }

    pub fn node(&self, id: &str) -> Option<&SimNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn positions(&self) -> Vec<NodePosition> {
        self.nodes
            .iter()
            .map(|node| NodePosition {
                id: node.id.clone(),
                x: node.x,
                y: node.y,
            })
            .collect()
    }

    /// Advance one step.
    pub fn tick(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;

        self.apply_links();
        self.apply_charge();
        self.apply_collision();
        self.apply_center();

        for node in &mut self.nodes {
            match node.fx {
                Some(fx) => {
                    node.x = fx;
                    node.vx = 0.0;
                }
                None => {
                    node.vx *= VELOCITY_RETAINED;
                    node.x += node.vx;
                }
            }
            match node.fy {
                Some(fy) => {
                    node.y = fy;
                    node.vy = 0.0;
                }
                None => {
                    node.vy *= VELOCITY_RETAINED;
                    node.y += node.vy;
                }
            }
        }
    }

    /// Pin a node under the pointer and keep the simulation warm.
    pub fn drag_start(&mut self, id: &str, x: f64, y: f64) -> bool {
        if !self.pin(id, x, y) {
            return false;
        }
        self.alpha_target = DRAG_ALPHA_TARGET;
        if self.alpha < DRAG_ALPHA_TARGET {
            self.alpha = self.alpha.max(ALPHA_MIN);
        }
        true
    }

    pub fn drag_move(&mut self, id: &str, x: f64, y: f64) -> bool {
        self.pin(id, x, y)
    }

    /// Release a dragged node back to the simulation.
    pub fn drag_end(&mut self, id: &str) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.alpha_target = 0.0;
        self.nodes[i].fx = None;
        self.nodes[i].fy = None;
        true
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.center = (width / 2.0, height / 2.0);
        self.alpha = self.alpha.max(DRAG_ALPHA_TARGET);
    }

    fn pin(&mut self, id: &str, x: f64, y: f64) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        self.nodes[i].fx = Some(x);
        self.nodes[i].fy = Some(y);
        true
    }

    fn apply_links(&mut self) {
        let mut degree = vec![0usize; self.nodes.len()];
        for &(s, t) in &self.links {
            degree[s] += 1;
            degree[t] += 1;
        }

        for (i, &(s, t)) in self.links.iter().enumerate() {
            let (source, target) = (&self.nodes[s], &self.nodes[t]);
            let mut dx = target.x + target.vx - source.x - source.vx;
            let mut dy = target.y + target.vy - source.y - source.vy;
            if dx == 0.0 {
                dx = jiggle(i);
            }
            if dy == 0.0 {
                dy = jiggle(i + 1);
            }

            let distance = (dx * dx + dy * dy).sqrt();
            let k = (distance - self.params.link_distance) / distance
                * self.alpha
                * self.params.link_strength;
            dx *= k;
            dy *= k;

            let bias = degree[s] as f64 / (degree[s] + degree[t]) as f64;
            self.nodes[t].vx -= dx * bias;
            self.nodes[t].vy -= dy * bias;
            self.nodes[s].vx += dx * (1.0 - bias);
            self.nodes[s].vy += dy * (1.0 - bias);
        }
    }

    fn apply_charge(&mut self) {
        let n = self.nodes.len();
        let mut delta = vec![(0.0, 0.0); n];

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let mut dx = self.nodes[j].x - self.nodes[i].x;
                let mut dy = self.nodes[j].y - self.nodes[i].y;
                if dx == 0.0 {
                    dx = jiggle(i * n + j);
                }
                if dy == 0.0 {
                    dy = jiggle(j * n + i);
                }

                let mut l = dx * dx + dy * dy;
                if l < 1.0 {
                    l = l.sqrt();
                }
                let w = self.nodes[j].charge * self.alpha / l;
                delta[i].0 += dx * w;
                delta[i].1 += dy * w;
            }
        }

        for (node, (dvx, dvy)) in self.nodes.iter_mut().zip(delta) {
            node.vx += dvx;
            node.vy += dvy;
        }
    }

    fn apply_collision(&mut self) {
        let n = self.nodes.len();
        let padding = self.params.collision_padding;

        for i in 0..n {
            for j in (i + 1)..n {
                let ri = self.nodes[i].radius + padding;
                let rj = self.nodes[j].radius + padding;
                let r = ri + rj;

                let mut dx = (self.nodes[i].x + self.nodes[i].vx) - (self.nodes[j].x + self.nodes[j].vx);
                let mut dy = (self.nodes[i].y + self.nodes[i].vy) - (self.nodes[j].y + self.nodes[j].vy);
                if dx * dx + dy * dy >= r * r {
                    continue;
                }
                if dx == 0.0 {
                    dx = jiggle(i * n + j);
                }
                if dy == 0.0 {
                    dy = jiggle(j * n + i);
                }

                let l = (dx * dx + dy * dy).sqrt();
                let k = (r - l) / l;
                dx *= k;
                dy *= k;

                let share = rj * rj / (ri * ri + rj * rj);
                self.nodes[i].vx += dx * share;
                self.nodes[i].vy += dy * share;
                self.nodes[j].vx -= dx * (1.0 - share);
                self.nodes[j].vy -= dy * (1.0 - share);
            }
        }
    }

    fn apply_center(&mut self) {
        if self.nodes.is_empty() {
            return;
        }
        let count = self.nodes.len() as f64;
        let mean_x = self.nodes.iter().map(|n| n.x).sum::<f64>() / count;
        let mean_y = self.nodes.iter().map(|n| n.y).sum::<f64>() / count;
        let (shift_x, shift_y) = (mean_x - self.center.0, mean_y - self.center.1);

        for node in &mut self.nodes {
            node.x -= shift_x;
            node.y -= shift_y;
        }
    }
}

/// Tiny deterministic offset used to split coincident nodes.
fn jiggle(seed: usize) -> f64 {
    (((seed as f64 + 1.0) * 0.618_033_988_749_895).fract() - 0.5) * 1e-6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::graph::{GraphLink, GraphNode};

    fn node(id: &str, kind: NodeKind, x: f64, y: f64) -> GraphNode {
        GraphNode {
            id: id.to_string(),
            label: id.to_string(),
            kind,
            score: 50,
            color: "#d9ef8b".to_string(),
            radius: 12.0,
            score_bar: 50,
            tooltip: Vec::new(),
            path: None,
            line: None,
            x,
            y,
        }
    }

    fn star(scale: ViewScale, leaves: usize) -> GraphView {
        let (center, ring) = seed_positions(leaves, scale, 800.0, 600.0);
        let mut nodes = vec![node("root", NodeKind::Root, center.0, center.1)];
        let mut links = Vec::new();
        for (i, (x, y)) in ring.into_iter().enumerate() {
            let id = format!("leaf{i}");
            nodes.push(node(&id, NodeKind::Library, x, y));
            links.push(GraphLink {
                source: "root".to_string(),
                target: id,
            });
        }
        GraphView {
            scale,
            breadcrumb: vec!["root".to_string()],
            nodes,
            links,
            width: 800.0,
            height: 600.0,
        }
    }

    #[test]
    fn params_per_scale() {
        let universe = ForceParams::for_scale(ViewScale::Universe);
        assert_eq!(universe.root_charge, -800.0);
        assert_eq!(universe.leaf_charge, -300.0);
        assert_eq!(universe.collision_padding, 20.0);
        assert_eq!(universe.link_distance, 150.0);
        assert_eq!(universe.link_strength, 0.3);

        let library = ForceParams::for_scale(ViewScale::Library);
        assert_eq!(library.root_charge, -200.0);
        assert_eq!(library.leaf_charge, -200.0);
        assert_eq!(library.collision_padding, 15.0);
        assert_eq!(library.link_distance, 100.0);
        assert_eq!(library.link_strength, 0.4);
    }

    #[test]
    fn seeds_children_on_a_ring() {
        let (center, ring) = seed_positions(4, ViewScale::Universe, 800.0, 600.0);
        assert_eq!(center, (400.0, 300.0));

        let radius = 0.35 * 600.0;
        assert!((ring[0].0 - (400.0 + radius)).abs() < 1e-9);
        assert!((ring[0].1 - 300.0).abs() < 1e-9);
        assert!((ring[1].0 - 400.0).abs() < 1e-9);
        assert!((ring[1].1 - (300.0 + radius)).abs() < 1e-9);

        let (_, library_ring) = seed_positions(1, ViewScale::Library, 800.0, 600.0);
        assert!((library_ring[0].0 - (400.0 + 0.30 * 600.0)).abs() < 1e-9);
    }

    #[test]
    fn root_and_leaves_get_scale_charges() {
        let sim = Simulation::from_view(&star(ViewScale::Universe, 3));
        assert_eq!(sim.node("root").unwrap().charge, -800.0);
        assert_eq!(sim.node("leaf0").unwrap().charge, -300.0);

        let sim = Simulation::from_view(&star(ViewScale::Library, 3));
        assert_eq!(sim.node("root").unwrap().charge, -200.0);
    }

    #[test]
    fn identical_inputs_give_identical_frames() {
        let view = star(ViewScale::Universe, 6);
        let mut a = Simulation::from_view(&view);
        let mut b = Simulation::from_view(&view);
        for _ in 0..60 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.positions(), b.positions());
        assert!(a.positions().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    }

    #[test]
    fn cools_down_and_settles() {
        let mut sim = Simulation::from_view(&star(ViewScale::Library, 5));
        assert!(!sim.is_settled());
        for _ in 0..400 {
            sim.tick();
        }
        assert!(sim.is_settled());
    }

    #[test]
    fn coincident_leaves_are_pushed_apart() {
        let mut view = star(ViewScale::Library, 2);
        view.nodes[2].x = view.nodes[1].x;
        view.nodes[2].y = view.nodes[1].y;

        let mut sim = Simulation::from_view(&view);
        for _ in 0..50 {
            sim.tick();
        }
        let a = sim.node("leaf0").unwrap();
        let b = sim.node("leaf1").unwrap();
        let distance = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
        assert!(distance > 1.0, "distance {distance}");
    }

    #[test]
    fn drag_pins_then_releases() {
        let mut sim = Simulation::from_view(&star(ViewScale::Universe, 4));
        for _ in 0..400 {
            sim.tick();
        }
        assert!(sim.is_settled());

        assert!(sim.drag_start("leaf1", 120.0, 80.0));
        assert!(!sim.is_settled());
        for _ in 0..10 {
            sim.tick();
        }
        let pinned = sim.node("leaf1").unwrap();
        assert_eq!((pinned.x, pinned.y), (120.0, 80.0));

        assert!(sim.drag_move("leaf1", 140.0, 90.0));
        sim.tick();
        assert_eq!(sim.node("leaf1").unwrap().x, 140.0);

        assert!(sim.drag_end("leaf1"));
        let released = sim.node("leaf1").unwrap();
        assert!(released.fx.is_none() && released.fy.is_none());
    }

    #[test]
    fn drag_on_unknown_node_is_ignored() {
        let mut sim = Simulation::from_view(&star(ViewScale::Universe, 2));
        assert!(!sim.drag_start("missing", 0.0, 0.0));
        assert!(!sim.drag_end("missing"));
    }
}
