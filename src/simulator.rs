//! This module implements the breadth-first simulation of a nondeterministic Turing Machine.
//!
//! Every branch of the computation is a `Configuration`: the tape split at the head, the
//! current state, and the path of steps that led there. Configurations wait in a FIFO frontier
//! and are expanded one at a time, so all configurations of depth `n` are expanded before any
//! of depth `n + 1`. The run ends on the first accepting step, when the frontier runs dry, or
//! when the depth bound is reached.

use crate::machine::Machine;
use crate::types::{
    Direction, Step, Transition, TuringMachineError, BLANK_SYMBOL, DEFAULT_MAX_DEPTH,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// The contents of a single tape, split at the head.
///
/// `left` holds the cells before the head. `right` holds the cell under the head followed by
/// everything after it; when it is empty the head reads the blank symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tape {
    left: Vec<char>,
    right: Vec<char>,
}

impl Tape {
    /// Creates a tape holding `input` with the head on its first symbol.
    pub fn new(input: &str) -> Self {
        Self {
            left: Vec::new(),
            right: input.chars().collect(),
        }
    }

    /// The cells left of the head.
    pub fn left(&self) -> &[char] {
        &self.left
    }

    /// The cell under the head and the cells right of it.
    pub fn right(&self) -> &[char] {
        &self.right
    }

    /// Returns the symbol under the head.
    pub fn head(&self) -> char {
        self.right.first().copied().unwrap_or(BLANK_SYMBOL)
    }

    /// Writes `write` under the head and moves the head one cell to the right.
    ///
    /// The right half never becomes empty: stepping off the last written cell leaves a single
    /// blank standing for the infinite blank region beyond it.
    pub fn shift_right(&self, write: char) -> Tape {
        let mut left = Vec::with_capacity(self.left.len() + 1);
        left.extend_from_slice(&self.left);
        left.push(write);

        let right = if self.right.len() > 1 {
            self.right[1..].to_vec()
        } else {
            vec![BLANK_SYMBOL]
        };

        Tape { left, right }
    }

    /// Writes `write` under the head and moves the head one cell to the left.
    ///
    /// Returns `None` when the head is already on the leftmost cell.
    pub fn shift_left(&self, write: char) -> Option<Tape> {
        let (&previous, left) = self.left.split_last()?;

        let mut right = Vec::with_capacity(self.right.len() + 1);
        right.push(previous);
        right.push(write);
        match self.right.split_first() {
            Some((_, rest)) => right.extend_from_slice(rest),
            None => right.push(BLANK_SYMBOL),
        }

        Some(Tape {
            left: left.to_vec(),
            right,
        })
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let left: String = self.left.iter().collect();
        let right: String = self.right.iter().collect();
        write!(f, "{left} | {right}")
    }
}

/// One node of a path. Sibling branches share the nodes of their common prefix.
#[derive(Debug)]
struct PathNode<'m> {
    from: &'m str,
    read: char,
    transition: &'m Transition,
    parent: Option<Rc<PathNode<'m>>>,
}

impl Drop for PathNode<'_> {
    // Unlink iteratively so dropping a long path cannot overflow the stack.
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            parent = match Rc::try_unwrap(node) {
                Ok(mut node) => node.parent.take(),
                Err(_) => None,
            };
        }
    }
}

/// The immutable history of a branch, newest step first.
#[derive(Debug, Clone, Default)]
struct Path<'m> {
    last: Option<Rc<PathNode<'m>>>,
    len: usize,
}

impl<'m> Path<'m> {
    /// Returns a new path extending this one by a step; `self` is left untouched.
    fn push(&self, from: &'m str, read: char, transition: &'m Transition) -> Path<'m> {
        Path {
            last: Some(Rc::new(PathNode {
                from,
                read,
                transition,
                parent: self.last.clone(),
            })),
            len: self.len + 1,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    /// Materializes the path, oldest step first.
    fn steps(&self) -> Vec<Step> {
        let mut steps = Vec::with_capacity(self.len);
        let mut node = self.last.as_deref();

        while let Some(current) = node {
            steps.push(Step {
                from: current.from.to_string(),
                read: current.read,
                to: current.transition.next_state.clone(),
                write: current.transition.write,
                direction: current.transition.direction.clone(),
            });
            node = current.parent.as_deref();
        }

        steps.reverse();
        steps
    }
}

/// A single branch of the exploration.
#[derive(Debug, Clone)]
struct Configuration<'m> {
    tape: Tape,
    state: &'m str,
    path: Path<'m>,
}

/// Options a run is parametrized by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Keep the accepting path and final tape in the outcome.
    pub show_path: bool,
    /// Stop exploring once a configuration of this depth has been enqueued.
    pub max_depth: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            show_path: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Counters collected during a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Transition applications attempted, including left moves off the tape edge.
    pub states_explored: usize,
    /// The deepest configuration reached. For an accepted run, the length of the accepting path.
    pub depth: usize,
}

impl RunStats {
    /// Transitions attempted per level of depth; `0.0` when no depth was reached.
    pub fn average_nondeterminism(&self) -> f64 {
        if self.depth == 0 {
            0.0
        } else {
            self.states_explored as f64 / self.depth as f64
        }
    }
}

/// The accepting path and the tape it left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub path: Vec<Step>,
    pub tape: Tape,
}

/// The verdict of a run, without its statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Accept,
    Reject,
    ResourceExhausted,
}

/// The result of a run that did not abort.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A branch reached the accept state. `trace` is present when the path was requested.
    Accepted { stats: RunStats, trace: Option<Trace> },
    /// Every branch died without reaching the accept state.
    Rejected(RunStats),
    /// The depth bound was reached before any branch accepted.
    ResourceExhausted(RunStats),
}

impl Outcome {
    pub fn verdict(&self) -> Verdict {
        match self {
            Outcome::Accepted { .. } => Verdict::Accept,
            Outcome::Rejected(_) => Verdict::Reject,
            Outcome::ResourceExhausted(_) => Verdict::ResourceExhausted,
        }
    }

    pub fn stats(&self) -> RunStats {
        match self {
            Outcome::Accepted { stats, .. }
            | Outcome::Rejected(stats)
            | Outcome::ResourceExhausted(stats) => *stats,
        }
    }

    pub fn trace(&self) -> Option<&Trace> {
        match self {
            Outcome::Accepted { trace, .. } => trace.as_ref(),
            _ => None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted { .. })
    }
}

/// Explores every branch of a machine's computation in breadth-first order.
///
/// The simulator only borrows the machine; one simulator can run any number of inputs and
/// each run starts from fresh statistics.
#[derive(Debug, Clone, Copy)]
pub struct Simulator<'m> {
    machine: &'m Machine,
    options: RunOptions,
}

impl<'m> Simulator<'m> {
    pub fn new(machine: &'m Machine, options: RunOptions) -> Self {
        Self { machine, options }
    }

    /// Runs the machine on `input`.
    ///
    /// Transitions of a configuration are tried in table order. A branch dies silently when no
    /// transition matches or when it would move left off the tape; a left move off the tape
    /// still counts as explored.
    ///
    /// # Returns
    ///
    /// * `Ok(Outcome)` with the verdict and statistics of the run.
    /// * `Err(TuringMachineError::MalformedMachine)` if a branch reaches a transition whose
    ///   direction is neither left nor right. The run stops immediately.
    pub fn run(&self, input: &str) -> Result<Outcome, TuringMachineError> {
        let machine = self.machine;
        let max_depth = self.options.max_depth;

        let mut stats = RunStats::default();
        let mut frontier = VecDeque::from([Configuration {
            tape: Tape::new(input),
            state: machine.start_state.as_str(),
            path: Path::default(),
        }]);

        debug!(machine = %machine.name, input, max_depth, "starting breadth-first run");

        while let Some(config) = frontier.pop_front() {
            let read = config.tape.head();
            let transitions = machine.lookup(config.state, read);

            if transitions.is_empty() {
                trace!(state = config.state, %read, depth = config.path.len(), "branch died");
                continue;
            }

            for transition in transitions {
                stats.states_explored += 1;

                let tape = match &transition.direction {
                    Direction::Right => Some(config.tape.shift_right(transition.write)),
                    Direction::Left => config.tape.shift_left(transition.write),
                    Direction::Unknown(token) => {
                        warn!(state = config.state, %read, direction = %token, "invalid direction");
                        return Err(TuringMachineError::MalformedMachine {
                            state: config.state.to_string(),
                            symbol: read,
                            direction: token.clone(),
                        });
                    }
                };

                let Some(tape) = tape else {
                    trace!(state = config.state, %read, "left move off the tape edge");
                    continue;
                };

                let path = config.path.push(config.state, read, transition);

                if transition.next_state == machine.accept_state {
                    let stats = RunStats {
                        depth: path.len(),
                        ..stats
                    };
                    debug!(
                        depth = stats.depth,
                        states_explored = stats.states_explored,
                        "accepted"
                    );

                    let trace = self.options.show_path.then(|| Trace {
                        path: path.steps(),
                        tape,
                    });
                    return Ok(Outcome::Accepted { stats, trace });
                }

                stats.depth = stats.depth.max(path.len());
                trace!(
                    from = config.state,
                    %read,
                    to = transition.next_state.as_str(),
                    depth = path.len(),
                    "enqueued"
                );
                frontier.push_back(Configuration {
                    tape,
                    state: transition.next_state.as_str(),
                    path,
                });

                if stats.depth >= max_depth {
                    debug!(
                        depth = stats.depth,
                        states_explored = stats.states_explored,
                        "depth bound reached"
                    );
                    return Ok(Outcome::ResourceExhausted(stats));
                }
            }
        }

        debug!(
            depth = stats.depth,
            states_explored = stats.states_explored,
            "rejected"
        );
        Ok(Outcome::Rejected(stats))
    }
}

/// Runs `machine` on `input` with the given options.
pub fn simulate(
    machine: &Machine,
    input: &str,
    options: RunOptions,
) -> Result<Outcome, TuringMachineError> {
    Simulator::new(machine, options).run(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    const EQUAL_01S: &str = include_str!("../machines/equal-01s.csv");
    const A_PLUS: &str = include_str!("../machines/a-plus.csv");

    fn with_path() -> RunOptions {
        RunOptions {
            show_path: true,
            ..RunOptions::default()
        }
    }

    fn bounded(max_depth: usize) -> RunOptions {
        RunOptions {
            max_depth,
            ..RunOptions::default()
        }
    }

    fn step(from: &str, read: char, to: &str, write: char, direction: Direction) -> Step {
        Step {
            from: from.to_string(),
            read,
            to: to.to_string(),
            write,
            direction,
        }
    }

    #[test]
    fn test_tape_shift_right() {
        let tape = Tape::new("ab").shift_right('x');

        assert_eq!(tape.left(), &['x']);
        assert_eq!(tape.right(), &['b']);
        assert_eq!(tape.head(), 'b');
    }

    #[test]
    fn test_tape_shift_right_past_input_reads_blank() {
        let tape = Tape::new("a").shift_right('x');

        assert_eq!(tape.right(), &[BLANK_SYMBOL]);
        assert_eq!(tape.head(), BLANK_SYMBOL);

        // Moving on through the blank region keeps a single blank on the right.
        let tape = tape.shift_right('y');
        assert_eq!(tape.left(), &['x', 'y']);
        assert_eq!(tape.right(), &[BLANK_SYMBOL]);
    }

    #[test]
    fn test_tape_empty_input() {
        let tape = Tape::new("");

        assert_eq!(tape.head(), BLANK_SYMBOL);
        assert_eq!(tape.shift_right('a').right(), &[BLANK_SYMBOL]);
        assert_eq!(tape.shift_left('a'), None);
    }

    #[test]
    fn test_tape_shift_left() {
        let tape = Tape::new("abc").shift_right('x').shift_left('y').unwrap();

        assert!(tape.left().is_empty());
        assert_eq!(tape.right(), &['x', 'y', 'c']);
        assert_eq!(tape.head(), 'x');
    }

    #[test]
    fn test_tape_shift_left_from_empty_right() {
        let tape = Tape {
            left: vec!['a'],
            right: Vec::new(),
        };

        assert_eq!(
            tape.shift_left('b').unwrap().right(),
            &['a', 'b', BLANK_SYMBOL]
        );
    }

    #[test]
    fn test_tape_display() {
        let tape = Tape::new("ab").shift_right('x');
        assert_eq!(tape.to_string(), "x | b");
    }

    #[test]
    fn test_average_nondeterminism() {
        let stats = RunStats {
            states_explored: 6,
            depth: 4,
        };
        assert_eq!(stats.average_nondeterminism(), 1.5);

        // No depth reached: the average is defined as zero.
        let stats = RunStats {
            states_explored: 3,
            depth: 0,
        };
        assert_eq!(stats.average_nondeterminism(), 0.0);
    }

    #[test]
    fn test_accepts_equal_count() {
        let machine = parse(EQUAL_01S).unwrap();
        let outcome = simulate(&machine, "01", with_path()).unwrap();

        assert_eq!(outcome.verdict(), Verdict::Accept);
        assert_eq!(
            outcome.stats(),
            RunStats {
                states_explored: 6,
                depth: 5
            }
        );
        assert_eq!(outcome.stats().average_nondeterminism(), 1.2);

        let trace = outcome.trace().unwrap();
        assert_eq!(
            trace.path,
            vec![
                step("qs", '0', "q1", 'y', Direction::Right),
                step("q1", '1', "q3", 'x', Direction::Left),
                step("q3", 'y', "q0", 'y', Direction::Right),
                step("q0", 'x', "q0", 'x', Direction::Right),
                step("q0", '_', "qacc", '_', Direction::Right),
            ]
        );
        assert_eq!(trace.tape.to_string(), "yx_ | _");
    }

    #[test]
    fn test_rejects_unequal_count() {
        let machine = parse(EQUAL_01S).unwrap();
        let outcome = simulate(&machine, "0", RunOptions::default()).unwrap();

        assert_eq!(
            outcome,
            Outcome::Rejected(RunStats {
                states_explored: 1,
                depth: 1
            })
        );
        assert!(outcome.trace().is_none());
    }

    #[test]
    fn test_accepts_empty_input() {
        let machine = parse(EQUAL_01S).unwrap();
        let outcome = simulate(&machine, "", RunOptions::default()).unwrap();

        assert!(outcome.is_accepted());
        assert_eq!(outcome.stats().depth, 1);
        // Path detail was not requested.
        assert!(outcome.trace().is_none());
    }

    #[test]
    fn test_nondeterministic_fan_out() {
        let machine = parse(A_PLUS).unwrap();
        let outcome = simulate(&machine, "aaa", RunOptions::default()).unwrap();

        assert!(outcome.is_accepted());
        assert_eq!(
            outcome.stats(),
            RunStats {
                states_explored: 7,
                depth: 4
            }
        );
    }

    #[test]
    fn test_immediate_reject_has_zero_average() {
        let machine = parse(A_PLUS).unwrap();
        let outcome = simulate(&machine, "", RunOptions::default()).unwrap();

        assert_eq!(outcome, Outcome::Rejected(RunStats::default()));
        assert_eq!(outcome.stats().average_nondeterminism(), 0.0);
    }

    #[test]
    fn test_invalid_direction_aborts_run() {
        let input = "bad move\nq0,qacc,qrej\na\na,_\nq0\nqacc\nqrej\nq0,a,qacc,a,D";
        let machine = parse(input).unwrap();

        let result = simulate(&machine, "a", RunOptions::default());
        assert_eq!(
            result,
            Err(TuringMachineError::MalformedMachine {
                state: "q0".to_string(),
                symbol: 'a',
                direction: "D".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_direction_aborts_before_later_siblings() {
        // The first transition is fine, the second is malformed; the accepting third is never
        // reached.
        let input = "bad sibling\nq0,q1,qacc,qrej\na\na,_\nq0\nqacc\nqrej\n\
                     q0,a,q1,a,R\nq0,a,q1,a,D\nq0,a,qacc,a,R";
        let machine = parse(input).unwrap();

        let result = simulate(&machine, "a", RunOptions::default());
        assert!(matches!(
            result,
            Err(TuringMachineError::MalformedMachine { .. })
        ));
    }

    #[test]
    fn test_unreached_invalid_direction_is_harmless() {
        let input = "dormant\nq0,q1,qacc,qrej\na,b\na,b,_\nq0\nqacc\nqrej\n\
                     q0,a,qacc,a,R\nq0,b,q1,b,D";
        let machine = parse(input).unwrap();

        let outcome = simulate(&machine, "a", RunOptions::default()).unwrap();
        assert!(outcome.is_accepted());
    }

    #[test]
    fn test_left_move_off_tape_is_counted_and_pruned() {
        let input = "left edge\nq0,q1,qacc,qrej\na\na,_\nq0\nqacc\nqrej\nq0,a,q1,a,L";
        let machine = parse(input).unwrap();

        let outcome = simulate(&machine, "a", RunOptions::default()).unwrap();
        assert_eq!(
            outcome,
            Outcome::Rejected(RunStats {
                states_explored: 1,
                depth: 0
            })
        );
        assert_eq!(outcome.stats().average_nondeterminism(), 0.0);
    }

    #[test]
    fn test_left_move_off_tape_does_not_stop_siblings() {
        let input = "left sibling\nq0,q1,qacc,qrej\na\na,_\nq0\nqacc\nqrej\n\
                     q0,a,qacc,a,L\nq0,a,q1,a,R\nq1,_,qacc,_,R";
        let machine = parse(input).unwrap();

        let outcome = simulate(&machine, "a", with_path()).unwrap();
        assert_eq!(
            outcome.stats(),
            RunStats {
                states_explored: 3,
                depth: 2
            }
        );
        assert_eq!(outcome.trace().unwrap().path[0].direction, Direction::Right);
    }

    #[test]
    fn test_left_move_rewrites_tape() {
        let input = "shuttle\nq0,q1,q2,qacc,qrej\na,b\na,b,x,y,_\nq0\nqacc\nqrej\n\
                     q0,a,q1,x,R\nq1,b,q2,y,L\nq2,x,qacc,x,R";
        let machine = parse(input).unwrap();

        let outcome = simulate(&machine, "ab", with_path()).unwrap();
        let trace = outcome.trace().unwrap();

        assert_eq!(trace.tape.left(), &['x']);
        assert_eq!(trace.tape.right(), &['y']);
        assert_eq!(outcome.stats().depth, 3);
    }

    #[test]
    fn test_right_moves_into_blank_region() {
        let input = "scan\nq0,qacc,qrej\na\na,_\nq0\nqacc\nqrej\nq0,a,q0,a,R\nq0,_,qacc,_,R";
        let machine = parse(input).unwrap();

        let outcome = simulate(&machine, "aa", with_path()).unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(outcome.stats().depth, 3);
        assert_eq!(outcome.trace().unwrap().path[2].read, BLANK_SYMBOL);
    }

    #[test]
    fn test_depth_bound_exhausts_resources() {
        let machine = parse(EQUAL_01S).unwrap();
        let outcome = simulate(&machine, "01", bounded(2)).unwrap();

        assert_eq!(
            outcome,
            Outcome::ResourceExhausted(RunStats {
                states_explored: 2,
                depth: 2
            })
        );
        assert_eq!(outcome.verdict(), Verdict::ResourceExhausted);
        assert_eq!(outcome.stats().average_nondeterminism(), 1.0);
    }

    #[test]
    fn test_depth_bound_of_exact_acceptance_depth() {
        // Acceptance happens before the accepting child would be enqueued.
        let machine = parse(EQUAL_01S).unwrap();
        let outcome = simulate(&machine, "01", bounded(5)).unwrap();

        assert!(outcome.is_accepted());
        assert_eq!(outcome.stats().depth, 5);
    }

    #[test]
    fn test_breadth_first_finds_shallowest_accept() {
        // The deeper accepting branch is listed first but the shallower one is found.
        let input = "shallow\nq0,q1,q2,q3,qacc,qrej\na\na,_\nq0\nqacc\nqrej\n\
                     q0,a,q1,a,R\nq0,a,q2,a,R\nq1,_,q3,_,R\nq3,_,qacc,_,R\nq2,_,qacc,_,R";
        let machine = parse(input).unwrap();

        let outcome = simulate(&machine, "a", with_path()).unwrap();
        let path = &outcome.trace().unwrap().path;

        assert_eq!(path.len(), 2);
        assert_eq!(path[0].to, "q2");
        assert_eq!(outcome.stats().states_explored, 4);
    }

    #[test]
    fn test_runs_are_independent() {
        let machine = parse(EQUAL_01S).unwrap();
        let simulator = Simulator::new(&machine, with_path());

        let first = simulator.run("0101").unwrap();
        let rejected = simulator.run("011").unwrap();
        let second = simulator.run("0101").unwrap();

        assert!(first.is_accepted());
        assert_eq!(rejected.verdict(), Verdict::Reject);
        assert_eq!(first, second);
    }

    #[test]
    fn test_long_path_drops_without_overflow() {
        let input = "scan\nq0,qacc,qrej\na\na,_\nq0\nqacc\nqrej\nq0,a,q0,a,R";
        let machine = parse(input).unwrap();
        let tape = "a".repeat(20_000);

        let outcome = simulate(&machine, &tape, bounded(usize::MAX)).unwrap();
        assert_eq!(
            outcome,
            Outcome::Rejected(RunStats {
                states_explored: 20_000,
                depth: 20_000
            })
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_each_enqueued_child_is_traced() {
        let machine = parse(EQUAL_01S).unwrap();
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        // "0" enqueues a single child (qs -> q1), which then dies on the blank.
        let outcome = tracing::subscriber::with_default(subscriber, || {
            simulate(&machine, "0", RunOptions::default()).unwrap()
        });
        assert_eq!(outcome.verdict(), Verdict::Reject);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let enqueued: Vec<&str> = output.lines().filter(|l| l.contains("enqueued")).collect();
        assert_eq!(enqueued.len(), 1);
        assert!(enqueued[0].contains("from=\"qs\"") || enqueued[0].contains("from=qs"));
        assert!(enqueued[0].contains("depth=1"));
    }
}
