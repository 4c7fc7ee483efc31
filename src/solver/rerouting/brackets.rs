use std::collections::HashMap;

/// Token of a balanced bracket sequence. `Open(i)` is the i-th opening bracket and maps to the
/// pickup of the i-th delivery in a permutation, `Close(i)` to its dropoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bracket {
    Open(usize),
    Close(usize),
}

/// All balanced sequences of `n` bracket pairs, opens tried before closes at each position.
/// There are Catalan(n) of them.
pub fn catalan_combinations(n: usize) -> Vec<Vec<Bracket>> {
    fn backtrack(
        n: usize,
        open: usize,
        close: usize,
        current: &mut Vec<Bracket>,
        result: &mut Vec<Vec<Bracket>>,
    ) {
        if current.len() == 2 * n {
            result.push(current.clone());
            return;
        }
        if open < n {
            current.push(Bracket::Open(open));
            backtrack(n, open + 1, close, current, result);
            current.pop();
        }
        if close < open {
            current.push(Bracket::Close(close));
            backtrack(n, open, close + 1, current, result);
            current.pop();
        }
    }

    let mut result = Vec::new();
    backtrack(n, 0, 0, &mut Vec::with_capacity(2 * n), &mut result);
    result
}

/// Bracket sequences depend only on the stop count, so they are built once per count.
#[derive(Debug, Default)]
pub struct BracketCache {
    sequences: HashMap<usize, Vec<Vec<Bracket>>>,
}

impl BracketCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, n: usize) -> &[Vec<Bracket>] {
        self.sequences
            .entry(n)
            .or_insert_with(|| catalan_combinations(n))
    }
}
