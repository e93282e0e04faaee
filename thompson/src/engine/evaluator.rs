//! NFA を入力文字列に対してシミュレートし、受理するかを判定する。
use super::nfa::{Label, Nfa, StateId};
use log::trace;
use std::{
    collections::{BTreeSet, VecDeque},
    error::Error,
    fmt::{self, Display},
};

/// 評価時のエラーを表す型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    InvalidWordInput { valid_up_to: usize },
}

impl Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::InvalidWordInput { valid_up_to } => write!(
                f,
                "EvalError: word is not valid UTF-8 text: valid up to byte {valid_up_to}"
            ),
        }
    }
}

impl Error for EvalError {}

/// `states` から ε 遷移だけで到達できる状態の集合 (`states` 自身を含む)。
///
/// 訪問済みの状態は二度と積まないので、ε 遷移の閉路があっても停止する。
/// is_depth が true なら深さ優先、false なら幅優先で辿るが、結果は同じ。
pub fn epsilon_closure<I>(nfa: &Nfa, states: I, is_depth: bool) -> BTreeSet<StateId>
where
    I: IntoIterator<Item = StateId>,
{
    let mut closure = BTreeSet::new();
    let mut pending = VecDeque::new();
    for state in states {
        if closure.insert(state) {
            pending.push_back(state);
        }
    }

    loop {
        let next = if is_depth {
            pending.pop_back()
        } else {
            pending.pop_front()
        };
        let Some(state) = next else {
            break;
        };

        for &t in nfa.targets(state, Label::Epsilon) {
            if closure.insert(t) {
                pending.push_back(t);
            }
        }
    }

    closure
}

/// 現在の状態集合から文字 `c` で遷移できる状態の集合
fn step(nfa: &Nfa, current: &BTreeSet<StateId>, c: char) -> BTreeSet<StateId> {
    current
        .iter()
        .flat_map(|&s| nfa.targets(s, Label::Literal(c)))
        .copied()
        .collect()
}

/// 文字列 `word` が NFA に受理されるなら true。
///
/// アルファベットにない文字は遷移先が空になるだけで、エラーにはならない。
pub fn eval(nfa: &Nfa, word: &[char], is_depth: bool) -> bool {
    let mut current = epsilon_closure(nfa, [nfa.initial()], is_depth);

    for (i, &c) in word.iter().enumerate() {
        let next = step(nfa, &current, c);
        current = epsilon_closure(nfa, next, is_depth);
        trace!("step {i}: {c:?} -> {} active states", current.len());

        // 空集合からはどこにも遷移できない
        if current.is_empty() {
            return false;
        }
    }

    current.contains(&nfa.final_state())
}

/// バイト列をテキストとして評価する。UTF-8 でなければエラー。
pub fn eval_bytes(nfa: &Nfa, word: &[u8], is_depth: bool) -> Result<bool, EvalError> {
    let word = std::str::from_utf8(word).map_err(|e| EvalError::InvalidWordInput {
        valid_up_to: e.valid_up_to(),
    })?;
    let word = word.chars().collect::<Vec<char>>();
    Ok(eval(nfa, &word, is_depth))
}
