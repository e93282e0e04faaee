//! 非決定性有限オートマトン (NFA) の表現。
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{self, Display},
};

/// 状態 ID。コンパイルごとに単調増加で割り当てられ、再利用されない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(usize);

impl StateId {
    pub(super) const fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 遷移のラベル。ε は通常の文字と衝突しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Epsilon,
    Literal(char),
}

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Epsilon => write!(f, "ε"),
            Label::Literal(c) => write!(f, "{c:?}"),
        }
    }
}

/// (遷移元, ラベル) から遷移先の列へのマップ
pub type Transitions = BTreeMap<(StateId, Label), Vec<StateId>>;

/// 初期状態と受理状態をそれぞれ 1 つだけ持つ NFA
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfa {
    pub(super) states: BTreeSet<StateId>,
    pub(super) alphabet: BTreeSet<char>, // ε は含まない
    pub(super) initial: StateId,
    pub(super) final_state: StateId,
    pub(super) transitions: Transitions,
}

impl Nfa {
    /// `initial` から `c` で `final_state` に遷移する 2 状態の NFA
    pub(super) fn literal(initial: StateId, final_state: StateId, c: char) -> Self {
        let mut nfa = Self {
            states: BTreeSet::from([initial, final_state]),
            alphabet: BTreeSet::new(),
            initial,
            final_state,
            transitions: Transitions::new(),
        };
        nfa.add_transition(initial, Label::Literal(c), final_state);
        nfa
    }

    pub fn states(&self) -> &BTreeSet<StateId> {
        &self.states
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    pub fn initial(&self) -> StateId {
        self.initial
    }

    pub fn final_state(&self) -> StateId {
        self.final_state
    }

    pub fn transitions(&self) -> &Transitions {
        &self.transitions
    }

    /// `state` から `label` で遷移できる状態。遷移がなければ空。
    pub fn targets(&self, state: StateId, label: Label) -> &[StateId] {
        self.transitions
            .get(&(state, label))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// 遷移の総数 (遷移先ごとに数える)
    pub fn transition_count(&self) -> usize {
        self.transitions.values().map(Vec::len).sum()
    }

    pub(super) fn add_transition(&mut self, from: StateId, label: Label, to: StateId) {
        if let Label::Literal(c) = label {
            self.alphabet.insert(c);
        }
        self.transitions.entry((from, label)).or_default().push(to);
    }

    pub(super) fn add_epsilon(&mut self, from: StateId, to: StateId) {
        self.add_transition(from, Label::Epsilon, to);
    }

    /// 2 つの NFA の状態、アルファベット、遷移の和を取る。
    /// 初期状態と受理状態は `self` のものが残るため、呼び出し側で設定し直すこと。
    pub(super) fn union(mut self, other: Nfa) -> Self {
        self.states.extend(other.states);
        self.alphabet.extend(other.alphabet);
        for (key, targets) in other.transitions {
            self.transitions.entry(key).or_default().extend(targets);
        }
        self
    }

    /// `from` を `into` に併合し、`from` を状態集合から取り除く。
    ///
    /// `from` を遷移元とする遷移は `into` に付け替え、既存の遷移先と合わせる。
    /// `from` を遷移先とする遷移も `into` を指すように書き換える。
    pub(super) fn merge_state(&mut self, from: StateId, into: StateId) {
        let moved: Vec<_> = self
            .transitions
            .keys()
            .filter(|(state, _)| *state == from)
            .copied()
            .collect();
        for key in moved {
            if let Some(targets) = self.transitions.remove(&key) {
                self.transitions
                    .entry((into, key.1))
                    .or_default()
                    .extend(targets);
            }
        }

        for targets in self.transitions.values_mut() {
            for t in targets.iter_mut().filter(|t| **t == from) {
                *t = into;
            }
        }

        self.states.remove(&from);
    }
}

impl Display for Nfa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: Vec<String>| items.join(", ");

        writeln!(f, "NFA:")?;
        writeln!(f, "  initial: {}", self.initial)?;
        writeln!(f, "  final:   {}", self.final_state)?;
        writeln!(
            f,
            "  states ({}): [{}]",
            self.states.len(),
            join(self.states.iter().map(|s| s.to_string()).collect())
        )?;
        writeln!(
            f,
            "  alphabet ({}): {{{}}}",
            self.alphabet.len(),
            join(self.alphabet.iter().map(|c| format!("{c:?}")).collect())
        )?;
        write!(f, "  transitions ({}):", self.transition_count())?;
        for ((state, label), targets) in &self.transitions {
            let key = format!("({state}, {label})");
            let targets = join(targets.iter().map(|s| s.to_string()).collect());
            write!(f, "\n    {key:<16} -> [{targets}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(n: usize) -> StateId {
        StateId::new(n)
    }

    #[test]
    fn literal_nfa() {
        let nfa = Nfa::literal(s(0), s(1), 'a');
        assert_eq!(nfa.states(), &BTreeSet::from([s(0), s(1)]));
        assert_eq!(nfa.alphabet(), &BTreeSet::from(['a']));
        assert_eq!(nfa.targets(s(0), Label::Literal('a')), &[s(1)]);
        assert!(nfa.targets(s(0), Label::Epsilon).is_empty());
        assert!(nfa.targets(s(1), Label::Literal('a')).is_empty());
    }

    #[test]
    fn epsilon_is_not_in_alphabet() {
        let mut nfa = Nfa::literal(s(0), s(1), 'a');
        nfa.add_epsilon(s(1), s(0));
        assert_eq!(nfa.alphabet().len(), 1);
        assert_eq!(nfa.transition_count(), 2);
    }

    #[test]
    fn union_merges_targets() {
        let mut left = Nfa::literal(s(0), s(1), 'a');
        left.add_epsilon(s(0), s(1));
        let mut right = Nfa::literal(s(2), s(3), 'b');
        right.add_epsilon(s(0), s(2));

        let nfa = left.union(right);
        assert_eq!(nfa.states().len(), 4);
        assert_eq!(nfa.alphabet(), &BTreeSet::from(['a', 'b']));
        assert_eq!(nfa.targets(s(0), Label::Epsilon), &[s(1), s(2)]);
        assert_eq!(nfa.initial(), s(0));
    }

    #[test]
    fn merge_state_rekeys_both_directions() {
        let mut nfa = Nfa::literal(s(0), s(1), 'a').union(Nfa::literal(s(2), s(3), 'b'));
        nfa.add_epsilon(s(3), s(2));
        nfa.merge_state(s(2), s(1));

        assert!(!nfa.states().contains(&s(2)));
        assert_eq!(nfa.targets(s(1), Label::Literal('b')), &[s(3)]);
        assert_eq!(nfa.targets(s(3), Label::Epsilon), &[s(1)]);
        assert!(nfa.targets(s(2), Label::Literal('b')).is_empty());
    }

    #[test]
    fn display_summary() {
        let out = Nfa::literal(s(0), s(1), 'a').to_string();
        assert!(out.starts_with("NFA:\n"));
        assert!(out.contains("  initial: 0\n"));
        assert!(out.contains("  final:   1\n"));
        assert!(out.contains("  states (2): [0, 1]\n"));
        assert!(out.contains("  alphabet (1): {'a'}\n"));
        assert!(out.contains("  transitions (1):\n    (0, 'a')"));
        assert!(out.ends_with("-> [1]"));
    }
}
