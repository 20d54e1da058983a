//! `ResidualGraph`: a warm-startable max-flow over a residual network.
//!
//! Terminal capacities are kept as one signed residual per node: positive
//! means residual capacity from the source, negative means residual capacity
//! to the sink. Adding terminal weights re-parametrizes instead of un-pushing
//! flow: the common part `min(source, sink)` of the new capacities moves into
//! the accumulated flow and only the difference stays on the node. Because of
//! that, capacity decreases never invalidate the flow already pushed, and the
//! residual network left by one solve is a valid starting point for the next.
//!
//! Each solve runs level-graph phases: a breadth-first pass from every
//! source-residual node assigns levels, then blocking flow is pushed along
//! level-increasing arcs into any sink-residual node. Path search is
//! iterative, so long grid paths never grow the native stack.

use std::collections::VecDeque;

use super::{CutGraph, Segment};

const UNREACHED: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct ResidualArc {
    head: usize,
    residual: i64,
}

/// Counters describing how much work the solver has done since `reset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Calls to `maxflow`.
    pub solves: u64,
    /// Solves answered from the previous cut because nothing was marked.
    pub cached_solves: u64,
    /// Level-graph phases run.
    pub phases: u64,
    /// Augmenting paths pushed.
    pub augmentations: u64,
}

/// Max-flow graph whose residual state persists across solves.
#[derive(Debug, Clone, Default)]
pub struct ResidualGraph {
    terminal: Vec<i64>,
    adjacency: Vec<Vec<usize>>,
    arcs: Vec<ResidualArc>,
    flow: i64,
    solved: bool,
    marked: Vec<usize>,
    is_marked: Vec<bool>,
    segments: Vec<Segment>,
    level: Vec<usize>,
    current: Vec<usize>,
    queue: VecDeque<usize>,
    stats: SolveStats,
}

impl ResidualGraph {
    /// A graph with `node_count` isolated nodes.
    #[must_use]
    pub fn with_nodes(node_count: usize, edge_capacity: usize) -> Self {
        let mut graph = Self::default();
        graph.reset(node_count, edge_capacity);
        graph
    }

    /// Work counters since the last `reset`.
    #[must_use]
    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    /// Flow accumulated so far (equals the cut value after a solve).
    #[must_use]
    pub fn flow(&self) -> i64 {
        self.flow
    }

    /// Number of nodes marked since the last solve.
    #[must_use]
    pub fn pending_marks(&self) -> usize {
        self.marked.len()
    }

    fn clear_marks(&mut self) {
        for &i in &self.marked {
            self.is_marked[i] = false;
        }
        self.marked.clear();
    }

    /// Assign levels from all source-residual nodes. Returns `true` if any
    /// sink-residual node was reached.
    fn build_levels(&mut self) -> bool {
        self.level.fill(UNREACHED);
        self.queue.clear();
        for v in 0..self.terminal.len() {
            if self.terminal[v] > 0 {
                self.level[v] = 0;
                self.queue.push_back(v);
            }
        }

        let mut reached_sink = false;
        while let Some(v) = self.queue.pop_front() {
            if self.terminal[v] < 0 {
                reached_sink = true;
            }
            let next = self.level[v] + 1;
            for &a in &self.adjacency[v] {
                let arc = self.arcs[a];
                if arc.residual > 0 && self.level[arc.head] == UNREACHED {
                    self.level[arc.head] = next;
                    self.queue.push_back(arc.head);
                }
            }
        }
        reached_sink
    }

    /// Push one augmenting path starting at source-residual node `s` along
    /// level-increasing arcs. Returns the amount pushed (0 if `s` is exhausted).
    fn augment_from(&mut self, s: usize) -> i64 {
        let mut path: Vec<usize> = Vec::new();
        let mut v = s;

        while self.terminal[v] >= 0 {
            let mut advanced = false;
            while self.current[v] < self.adjacency[v].len() {
                let a = self.adjacency[v][self.current[v]];
                let arc = self.arcs[a];
                if arc.residual > 0 && self.level[arc.head] == self.level[v] + 1 {
                    path.push(a);
                    v = arc.head;
                    advanced = true;
                    break;
                }
                self.current[v] += 1;
            }
            if advanced {
                continue;
            }

            // Dead end: drop v from the level graph and retreat.
            self.level[v] = UNREACHED;
            let Some(a) = path.pop() else {
                return 0;
            };
            v = self.arcs[a ^ 1].head;
            self.current[v] += 1;
        }

        let mut pushed = self.terminal[s].min(-self.terminal[v]);
        for &a in &path {
            pushed = pushed.min(self.arcs[a].residual);
        }
        self.terminal[s] -= pushed;
        self.terminal[v] += pushed;
        for &a in &path {
            self.arcs[a].residual -= pushed;
            self.arcs[a ^ 1].residual += pushed;
        }
        self.flow += pushed;
        self.stats.augmentations += 1;
        pushed
    }

    /// Sink side = every node that can still reach a sink-residual node.
    fn label_segments(&mut self) {
        self.segments.fill(Segment::Source);
        self.queue.clear();
        for v in 0..self.terminal.len() {
            if self.terminal[v] < 0 {
                self.segments[v] = Segment::Sink;
                self.queue.push_back(v);
            }
        }
        while let Some(v) = self.queue.pop_front() {
            for &a in &self.adjacency[v] {
                let u = self.arcs[a].head;
                // a is v → u; its sister is u → v.
                if self.arcs[a ^ 1].residual > 0 && self.segments[u] == Segment::Source {
                    self.segments[u] = Segment::Sink;
                    self.queue.push_back(u);
                }
            }
        }
    }
}

impl CutGraph for ResidualGraph {
    fn reset(&mut self, node_count: usize, edge_capacity: usize) {
        self.terminal = vec![0; node_count];
        self.adjacency = vec![Vec::new(); node_count];
        self.arcs = Vec::with_capacity(edge_capacity * 2);
        self.flow = 0;
        self.solved = false;
        self.marked.clear();
        self.is_marked = vec![false; node_count];
        self.segments = vec![Segment::Source; node_count];
        self.level = vec![UNREACHED; node_count];
        self.current = vec![0; node_count];
        self.queue.clear();
        self.stats = SolveStats::default();
    }

    fn node_count(&self) -> usize {
        self.terminal.len()
    }

    fn add_edge(&mut self, i: usize, j: usize, capacity: i64, reverse_capacity: i64) {
        debug_assert_ne!(i, j, "self-loops carry no cut cost");
        let forward = self.arcs.len();
        self.arcs.push(ResidualArc {
            head: j,
            residual: capacity,
        });
        self.arcs.push(ResidualArc {
            head: i,
            residual: reverse_capacity,
        });
        self.adjacency[i].push(forward);
        self.adjacency[j].push(forward + 1);
    }

    fn add_terminal_weights(&mut self, i: usize, source_capacity: i64, sink_capacity: i64) {
        let residual = self.terminal[i];
        let (mut source, mut sink) = (source_capacity, sink_capacity);
        if residual > 0 {
            source += residual;
        } else {
            sink -= residual;
        }
        self.flow += source.min(sink);
        self.terminal[i] = source - sink;
    }

    fn mark_node(&mut self, i: usize) {
        if !self.is_marked[i] {
            self.is_marked[i] = true;
            self.marked.push(i);
        }
    }

    fn maxflow(&mut self, reuse_trees: bool) -> i64 {
        self.stats.solves += 1;
        if reuse_trees && self.solved && self.marked.is_empty() {
            self.stats.cached_solves += 1;
            return self.flow;
        }

        while self.build_levels() {
            self.stats.phases += 1;
            self.current.fill(0);
            for s in 0..self.terminal.len() {
                while self.terminal[s] > 0 && self.level[s] == 0 {
                    if self.augment_from(s) == 0 {
                        break;
                    }
                }
            }
        }

        self.label_segments();
        self.clear_marks();
        self.solved = true;
        self.flow
    }

    fn segment(&self, i: usize) -> Segment {
        self.segments[i]
    }
}
