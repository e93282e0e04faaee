use super::{
    nfa::{Nfa, StateId},
    parser::{BinaryOp, Symbol, UnaryOp, AST},
};
use crate::helper::safe_add;
use log::trace;
use std::{
    error::Error,
    fmt::{self, Display},
};

/// NFA 生成エラーを表す型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeGenError {
    StateOverflow,
    FailStar,
    FailOr,
    FailConcat,
    FailFragment,
}

impl Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeGenError: {self:?}")
    }
}

impl Error for CodeGenError {}

/// 状態 ID の割り当て器。
///
/// 1 回のコンパイルの間だけ使い、割り当てた ID は再利用しない。
#[derive(Default, Debug)]
pub struct StateAllocator {
    next: usize,
}

impl StateAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// カウンタを 0 に戻す。コンパイル開始時に呼ぶ。
    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// これまでに割り当てた ID の数
    pub fn allocated(&self) -> usize {
        self.next
    }

    /// 新しい状態を 2 つ割り当てる。
    pub fn fresh_pair(&mut self) -> Result<(StateId, StateId), CodeGenError> {
        let s0 = self.next;
        safe_add(&mut self.next, &2, || CodeGenError::StateOverflow)?;
        Ok((StateId::new(s0), StateId::new(s0 + 1)))
    }
}

/// 後置順の走査で積む作業単位
enum Frame<'a> {
    Enter(&'a AST),
    Unary(UnaryOp),
    Binary(BinaryOp),
}

/// Thompson の構成法で AST から NFA を生成する。
#[derive(Default, Debug)]
pub struct Generator {
    alloc: StateAllocator,
}

/// AST から NFA を生成。呼び出しごとに新しい割り当て器を使う。
pub fn get_nfa(ast: &AST) -> Result<Nfa, CodeGenError> {
    Generator::new().compile(ast)
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    /// NFA を生成する関数。状態 ID は 0 から割り当て直す。
    pub fn compile(&mut self, ast: &AST) -> Result<Nfa, CodeGenError> {
        self.alloc.reset();
        let nfa = self.gen_expr(ast)?;
        trace!("allocated {} state ids", self.alloc.allocated());
        Ok(nfa)
    }

    /// AST を後置順に辿り、子から先に NFA を生成する。
    ///
    /// 連結は左に深い木になるため、再帰ではなく明示的なスタックで辿る。
    fn gen_expr(&mut self, ast: &AST) -> Result<Nfa, CodeGenError> {
        let mut frames = vec![Frame::Enter(ast)];
        let mut fragments: Vec<Nfa> = Vec::new();

        while let Some(frame) = frames.pop() {
            match frame {
                Frame::Enter(AST::Operand(sym)) => fragments.push(self.gen_operand(*sym)?),
                Frame::Enter(AST::Unary(op, e)) => {
                    frames.push(Frame::Unary(*op));
                    frames.push(Frame::Enter(e));
                }
                Frame::Enter(AST::Binary(op, e1, e2)) => {
                    // e1 を先に処理するため後に積む
                    frames.push(Frame::Binary(*op));
                    frames.push(Frame::Enter(e2));
                    frames.push(Frame::Enter(e1));
                }
                Frame::Unary(UnaryOp::Star) => {
                    let inner = fragments.pop().ok_or(CodeGenError::FailStar)?;
                    fragments.push(self.gen_star(inner)?);
                }
                Frame::Binary(BinaryOp::Alternation) => {
                    let right = fragments.pop().ok_or(CodeGenError::FailOr)?;
                    let left = fragments.pop().ok_or(CodeGenError::FailOr)?;
                    fragments.push(self.gen_alternation(left, right)?);
                }
                Frame::Binary(BinaryOp::Concat) => {
                    let right = fragments.pop().ok_or(CodeGenError::FailConcat)?;
                    let left = fragments.pop().ok_or(CodeGenError::FailConcat)?;
                    fragments.push(concat(left, right));
                }
            }
        }

        match (fragments.pop(), fragments.is_empty()) {
            (Some(nfa), true) => Ok(nfa),
            _ => Err(CodeGenError::FailFragment),
        }
    }

    /// 被演算子の NFA。
    ///
    /// ```text
    /// s0 --c--> s1
    /// ```
    fn gen_operand(&mut self, sym: Symbol) -> Result<Nfa, CodeGenError> {
        let (s0, s1) = self.alloc.fresh_pair()?;
        Ok(Nfa::literal(s0, s1, sym.ch))
    }

    /// クリーネ閉包の NFA。
    ///
    /// ```text
    ///        +-------ε-------+
    ///        |               v
    /// s0 -ε-> L.init ... L.final -ε-> s1
    ///  |        ^            |        ^
    ///  |        +-----ε------+        |
    ///  +--------------ε---------------+
    /// ```
    fn gen_star(&mut self, inner: Nfa) -> Result<Nfa, CodeGenError> {
        let (s0, s1) = self.alloc.fresh_pair()?;
        Ok(star(inner, s0, s1))
    }

    /// 選択の NFA。
    ///
    /// ```text
    ///     +-ε-> L.init ... L.final -ε-+
    /// s0 -+                           +-> s1
    ///     +-ε-> R.init ... R.final -ε-+
    /// ```
    fn gen_alternation(&mut self, left: Nfa, right: Nfa) -> Result<Nfa, CodeGenError> {
        let (s0, s1) = self.alloc.fresh_pair()?;
        Ok(alternation(left, right, s0, s1))
    }
}

fn star(inner: Nfa, s0: StateId, s1: StateId) -> Nfa {
    let (old_initial, old_final) = (inner.initial, inner.final_state);
    let mut nfa = inner;
    nfa.states.extend([s0, s1]);

    nfa.add_epsilon(old_final, old_initial);
    nfa.add_epsilon(old_final, s1);
    nfa.add_epsilon(s0, old_initial);
    nfa.add_epsilon(s0, s1);

    nfa.initial = s0;
    nfa.final_state = s1;
    nfa
}

fn alternation(left: Nfa, right: Nfa, s0: StateId, s1: StateId) -> Nfa {
    let (l_initial, l_final) = (left.initial, left.final_state);
    let (r_initial, r_final) = (right.initial, right.final_state);
    let mut nfa = left.union(right);
    nfa.states.extend([s0, s1]);

    nfa.add_epsilon(r_final, s1);
    nfa.add_epsilon(l_final, s1);
    nfa.add_epsilon(s0, r_initial);
    nfa.add_epsilon(s0, l_initial);

    nfa.initial = s0;
    nfa.final_state = s1;
    nfa
}

/// 連結の NFA。`R.init` を `L.final` に併合するため新しい状態は割り当てない。
///
/// ```text
/// L.init ... L.final(=R.init) ... R.final
/// ```
///
/// `R.init` を指す遷移は `R` の中にしかないので、併合は和を取る前に `R` だけで行う。
fn concat(left: Nfa, mut right: Nfa) -> Nfa {
    let (joint, dropped) = (left.final_state, right.initial);
    let (initial, final_state) = (left.initial, right.final_state);

    right.merge_state(dropped, joint);
    let mut nfa = left.union(right);

    nfa.initial = initial;
    nfa.final_state = final_state;
    nfa
}
