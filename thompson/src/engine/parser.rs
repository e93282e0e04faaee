//! 正規表現の文字列を構文木 (AST) に変換するためのパーサ。
//!
//! 以下の順に変換を行う。
//!
//! 1. エスケープ処理: 文字列を `(文字, エスケープ済みか)` の列に変換
//! 2. 前処理: 暗黙の連結箇所に連結演算子 `.` を挿入
//! 3. 操車場アルゴリズム: 中置記法から後置記法に変換
//! 4. 後置記法の列からスタックを用いて AST を構築
use std::{
    error::Error,
    fmt::{self, Display},
    mem,
};

pub const KLEENE_STAR: char = '*';
pub const CONCAT: char = '.';
pub const ALTERNATION: char = '|';
pub const LEFT_PAREN: char = '(';
pub const RIGHT_PAREN: char = ')';
const ESCAPE: char = '\\';

/// 括弧の対応が取れていない場合の詳細
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unbalanced {
    UnmatchedRight,  // 対応する ( がない )
    Unclosed(usize), // 閉じられていない ( の数
}

/// 後置記法の列が 1 つの木にならない場合の詳細
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    MissingOperand(Symbol), // 演算子に対する被演算子が足りない
    MissingOperator(usize), // 木が複数残った。演算子が足りない
    Parenthesis(Symbol),    // 後置記法に括弧が残っている
    Empty,
}

/// パースエラーを表す型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    EmptyRegex,
    DanglingEscape(usize),
    UnbalancedParentheses(Unbalanced),
    MalformedExpression(Malformed),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyRegex => write!(f, "ParseError: empty regex"),
            ParseError::DanglingEscape(pos) => {
                write!(f, "ParseError: dangling escape: pos = {pos}")
            }
            ParseError::UnbalancedParentheses(Unbalanced::UnmatchedRight) => {
                write!(f, "ParseError: unmatched right parenthesis")
            }
            ParseError::UnbalancedParentheses(Unbalanced::Unclosed(n)) => {
                write!(f, "ParseError: {n} unclosed left parenthesis")
            }
            ParseError::MalformedExpression(Malformed::MissingOperand(op)) => {
                write!(f, "ParseError: missing operand for '{op}'")
            }
            ParseError::MalformedExpression(Malformed::MissingOperator(n)) => {
                write!(f, "ParseError: missing operator: {n} expressions left")
            }
            ParseError::MalformedExpression(Malformed::Parenthesis(p)) => {
                write!(f, "ParseError: unexpected parenthesis '{p}' in postfix")
            }
            ParseError::MalformedExpression(Malformed::Empty) => {
                write!(f, "ParseError: empty expression")
            }
        }
    }
}

impl Error for ParseError {}

/// 文字とエスケープの有無の組。
///
/// エスケープされた制御文字 (`\*` など) は被演算子として扱われる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    pub ch: char,
    pub escaped: bool,
}

impl Symbol {
    pub const fn new(ch: char, escaped: bool) -> Self {
        Self { ch, escaped }
    }

    /// エスケープされていない記号
    pub const fn plain(ch: char) -> Self {
        Self::new(ch, false)
    }

    pub const fn concat() -> Self {
        Self::plain(CONCAT)
    }

    fn is_control_char(&self, c: char) -> bool {
        !self.escaped && self.ch == c
    }

    /// エスケープされていない `*`, `.`, `|`, `(`, `)` なら真
    pub fn is_control(&self) -> bool {
        !self.escaped
            && matches!(
                self.ch,
                KLEENE_STAR | CONCAT | ALTERNATION | LEFT_PAREN | RIGHT_PAREN
            )
    }

    pub fn is_operand(&self) -> bool {
        !self.is_control()
    }

    pub fn is_kleene_star(&self) -> bool {
        self.is_control_char(KLEENE_STAR)
    }

    pub fn is_concat(&self) -> bool {
        self.is_control_char(CONCAT)
    }

    pub fn is_alternation(&self) -> bool {
        self.is_control_char(ALTERNATION)
    }

    pub fn is_left_paren(&self) -> bool {
        self.is_control_char(LEFT_PAREN)
    }

    pub fn is_right_paren(&self) -> bool {
        self.is_control_char(RIGHT_PAREN)
    }

    /// 演算子の優先順位。演算子以外は 0。
    fn precedence(&self) -> u8 {
        if self.is_kleene_star() {
            3
        } else if self.is_concat() {
            2
        } else if self.is_alternation() {
            1
        } else {
            0
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.escaped {
            write!(f, "{ESCAPE}{}", self.ch)
        } else {
            write!(f, "{}", self.ch)
        }
    }
}

/// 記号列を正規表現の文字列に戻す。エスケープされた記号には `\` を付ける。
pub fn format_symbols(symbols: &[Symbol]) -> String {
    symbols.iter().map(|s| s.to_string()).collect()
}

/// 単項演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Star,
}

impl UnaryOp {
    pub fn symbol(self) -> Symbol {
        match self {
            UnaryOp::Star => Symbol::plain(KLEENE_STAR),
        }
    }
}

/// 二項演算子
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Concat,
    Alternation,
}

impl BinaryOp {
    pub fn symbol(self) -> Symbol {
        match self {
            BinaryOp::Concat => Symbol::plain(CONCAT),
            BinaryOp::Alternation => Symbol::plain(ALTERNATION),
        }
    }
}

/// 抽象構文木を表現するための型
///
/// 連結の列は左に深い木になるので、解放と表示は再帰を使わずに行う。
#[derive(Debug, PartialEq, Eq)]
pub enum AST {
    Operand(Symbol),
    Unary(UnaryOp, Box<AST>),
    Binary(BinaryOp, Box<AST>, Box<AST>),
}

impl AST {
    /// 子を葉と差し替えて取り出し、`pending` に積む。
    fn take_children(&mut self, pending: &mut Vec<AST>) {
        let leaf = || AST::Operand(Symbol::concat());
        match self {
            AST::Operand(_) => (),
            AST::Unary(_, e) => pending.push(mem::replace(e.as_mut(), leaf())),
            AST::Binary(_, e1, e2) => {
                pending.push(mem::replace(e1.as_mut(), leaf()));
                pending.push(mem::replace(e2.as_mut(), leaf()));
            }
        }
    }
}

impl Drop for AST {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            // 子を取り出した後の node は葉しか持たないので、ここでの解放は浅い
            node.take_children(&mut pending);
        }
    }
}

/// 子を 1 段ずつ字下げした木として表示
impl Display for AST {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pending = vec![(self, 0)];
        while let Some((node, depth)) = pending.pop() {
            let width: usize = depth * 2;
            match node {
                AST::Operand(sym) => writeln!(f, "{:width$}{sym}", "")?,
                AST::Unary(op, e) => {
                    writeln!(f, "{:width$}{}", "", op.symbol())?;
                    pending.push((&**e, depth + 1));
                }
                AST::Binary(op, e1, e2) => {
                    writeln!(f, "{:width$}{}", "", op.symbol())?;
                    pending.push((&**e2, depth + 1));
                    pending.push((&**e1, depth + 1));
                }
            }
        }
        Ok(())
    }
}

/// エスケープ処理。
///
/// `\` は次の文字をエスケープ済みとし、`\` 自身は出力しない。
/// 末尾に単独の `\` がある場合は `DanglingEscape` を返す。
pub fn escape(expr: &str) -> Result<Vec<Symbol>, ParseError> {
    if expr.is_empty() {
        return Err(ParseError::EmptyRegex);
    }

    let mut symbols = Vec::with_capacity(expr.len());
    let mut escape_pos = None; // 直前の \ の位置
    for (i, c) in expr.chars().enumerate() {
        if escape_pos.take().is_some() {
            symbols.push(Symbol::new(c, true));
        } else if c == ESCAPE {
            escape_pos = Some(i);
        } else {
            symbols.push(Symbol::plain(c));
        }
    }

    match escape_pos {
        Some(pos) => Err(ParseError::DanglingEscape(pos)),
        None => Ok(symbols),
    }
}

/// `prev` と `curr` の間に連結演算子が必要なら真
fn needs_concat(prev: &Symbol, curr: &Symbol) -> bool {
    (prev.is_operand() && curr.is_operand())
        || (prev.is_kleene_star() && curr.is_operand())
        || (prev.is_kleene_star() && curr.is_left_paren())
        || (prev.is_left_paren() && curr.is_right_paren())
        || (prev.is_right_paren() && curr.is_operand())
        || (prev.is_operand() && curr.is_left_paren())
        || (prev.is_right_paren() && curr.is_left_paren())
}

/// 暗黙の連結箇所に明示的な連結演算子を挿入する。
pub fn preprocess(symbols: &[Symbol]) -> Vec<Symbol> {
    let mut result = Vec::with_capacity(symbols.len() * 2);
    let mut prev: Option<&Symbol> = None;
    for curr in symbols {
        if let Some(prev) = prev {
            if needs_concat(prev, curr) {
                result.push(Symbol::concat());
            }
        }
        result.push(*curr);
        prev = Some(curr);
    }
    result
}

/// 操車場アルゴリズムで中置記法の列を後置記法の列に変換。
pub fn to_postfix(infix: &[Symbol]) -> Result<Vec<Symbol>, ParseError> {
    let mut stack: Vec<Symbol> = Vec::new();
    let mut postfix = Vec::with_capacity(infix.len());

    for &sym in infix {
        if sym.is_operand() {
            postfix.push(sym);
        } else if sym.is_left_paren() {
            stack.push(sym);
        } else if sym.is_right_paren() {
            // 対応する ( まで演算子を出力し、括弧は両方捨てる
            loop {
                match stack.pop() {
                    Some(top) if top.is_left_paren() => break,
                    Some(top) => postfix.push(top),
                    None => {
                        return Err(ParseError::UnbalancedParentheses(
                            Unbalanced::UnmatchedRight,
                        ))
                    }
                }
            }
        } else {
            // ( の優先順位は 0 なのでここでは取り出されない
            while let Some(top) = stack.pop() {
                if top.precedence() >= sym.precedence() {
                    postfix.push(top);
                } else {
                    stack.push(top);
                    break;
                }
            }
            stack.push(sym);
        }
    }

    let mut unclosed = 0;
    while let Some(top) = stack.pop() {
        if top.is_left_paren() {
            unclosed += 1;
        } else {
            postfix.push(top);
        }
    }

    if unclosed > 0 {
        Err(ParseError::UnbalancedParentheses(Unbalanced::Unclosed(
            unclosed,
        )))
    } else {
        Ok(postfix)
    }
}

/// 後置記法の列から AST を構築。
///
/// 最後にスタックにちょうど 1 つの木が残らなければエラー。
pub fn build_tree(postfix: &[Symbol]) -> Result<AST, ParseError> {
    let mut stack: Vec<AST> = Vec::new();
    let missing = |op| ParseError::MalformedExpression(Malformed::MissingOperand(op));

    for &sym in postfix {
        if sym.is_kleene_star() {
            let e = stack.pop().ok_or(missing(sym))?;
            stack.push(AST::Unary(UnaryOp::Star, Box::new(e)));
        } else if sym.is_concat() || sym.is_alternation() {
            // 右が先に取り出される
            let e2 = stack.pop().ok_or(missing(sym))?;
            let e1 = stack.pop().ok_or(missing(sym))?;
            let op = if sym.is_concat() {
                BinaryOp::Concat
            } else {
                BinaryOp::Alternation
            };
            stack.push(AST::Binary(op, Box::new(e1), Box::new(e2)));
        } else if sym.is_left_paren() || sym.is_right_paren() {
            return Err(ParseError::MalformedExpression(Malformed::Parenthesis(
                sym,
            )));
        } else {
            stack.push(AST::Operand(sym));
        }
    }

    match stack.len() {
        0 => Err(ParseError::MalformedExpression(Malformed::Empty)),
        1 => stack
            .pop()
            .ok_or(ParseError::MalformedExpression(Malformed::Empty)),
        n => Err(ParseError::MalformedExpression(Malformed::MissingOperator(
            n,
        ))),
    }
}

/// 正規表現をパースし、AST を返す。
///
/// 途中の記号列が不要な場合の簡易 API。各段階の結果が必要なら
/// [`crate::Regex`] を使う。
///
/// # 利用例
///
/// ```
/// use thompson::engine::parser::{parse, AST};
/// let ast = parse("a|b").unwrap();
/// assert!(matches!(ast, AST::Binary(..)));
/// ```
pub fn parse(expr: &str) -> Result<AST, ParseError> {
    let symbols = escape(expr)?;
    let infix = preprocess(&symbols);
    let postfix = to_postfix(&infix)?;
    build_tree(&postfix)
}
