use std::{
    error,
    fmt::{self, Display},
};

pub mod codegen;
pub mod evaluator;
pub mod nfa;
pub mod parser;

use crate::helper::DynError;
use codegen::CodeGenError;
use evaluator::EvalError;
use log::debug;
use nfa::Nfa;
use parser::{format_symbols, ParseError, Symbol, AST};

/// コンパイルと評価のいずれかの段階で起きたエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Parse(ParseError),
    CodeGen(CodeGenError),
    Eval(EvalError),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{e}"),
            Error::CodeGen(e) => write!(f, "{e}"),
            Error::Eval(e) => write!(f, "{e}"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::CodeGen(e) => Some(e),
            Error::Eval(e) => Some(e),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<CodeGenError> for Error {
    fn from(e: CodeGenError) -> Self {
        Error::CodeGen(e)
    }
}

impl From<EvalError> for Error {
    fn from(e: EvalError) -> Self {
        Error::Eval(e)
    }
}

/// コンパイル済みの正規表現。
///
/// 各段階の出力を保持するので、表示やデバッグに使える。
#[derive(Debug)]
pub struct Regex {
    raw: String,
    escaped: Vec<Symbol>,
    preprocessed: Vec<Symbol>,
    postfix: Vec<Symbol>,
    ast: AST,
    nfa: Nfa,
}

impl Regex {
    /// 正規表現をコンパイルする。いずれかの段階で失敗した場合は途中の結果を残さない。
    pub fn new(expr: &str) -> Result<Self, Error> {
        let escaped = parser::escape(expr)?;
        debug!("escaped: {}", format_symbols(&escaped));

        let preprocessed = parser::preprocess(&escaped);
        debug!("preprocessed: {}", format_symbols(&preprocessed));

        let postfix = parser::to_postfix(&preprocessed)?;
        debug!("postfix: {}", format_symbols(&postfix));

        let ast = parser::build_tree(&postfix)?;
        let nfa = codegen::get_nfa(&ast)?;
        debug!(
            "nfa: {} states, {} transitions",
            nfa.states().len(),
            nfa.transition_count()
        );

        Ok(Self {
            raw: expr.to_string(),
            escaped,
            preprocessed,
            postfix,
            ast,
            nfa,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn escaped(&self) -> &[Symbol] {
        &self.escaped
    }

    pub fn preprocessed(&self) -> &[Symbol] {
        &self.preprocessed
    }

    pub fn postfix(&self) -> &[Symbol] {
        &self.postfix
    }

    pub fn ast(&self) -> &AST {
        &self.ast
    }

    pub fn nfa(&self) -> &Nfa {
        &self.nfa
    }

    /// `word` 全体が正規表現にマッチするなら true
    pub fn is_match(&self, word: &str) -> bool {
        self.is_match_with(word, true)
    }

    /// ε 閉包の探索方法を指定してマッチング
    pub fn is_match_with(&self, word: &str, is_depth: bool) -> bool {
        let word = word.chars().collect::<Vec<char>>();
        evaluator::eval(&self.nfa, &word, is_depth)
    }

    /// バイト列を UTF-8 の文字列としてマッチング。UTF-8 でなければ `Error::Eval` を返す。
    pub fn is_match_bytes(&self, word: &[u8], is_depth: bool) -> Result<bool, Error> {
        Ok(evaluator::eval_bytes(&self.nfa, word, is_depth)?)
    }
}

/// 正規表現をコンパイルし、各段階の出力と NFA を標準出力に表示。
///
/// # 利用例
///
/// ```
/// use thompson;
/// thompson::print("(a|b)*c").unwrap();
/// ```
///
/// # 返り値
///
/// 入力された正規表現にエラーがある場合は Err を返す。
pub fn print(expr: &str) -> Result<(), DynError> {
    let regex = Regex::new(expr)?;
    println!("expr: {}", regex.raw());
    println!("escaped: {}", format_symbols(regex.escaped()));
    println!("infix: {}", format_symbols(regex.preprocessed()));
    println!("postfix: {}", format_symbols(regex.postfix()));

    println!();
    println!("AST:");
    print!("{}", regex.ast());

    println!();
    println!("{}", regex.nfa());

    Ok(())
}

/// 正規表現と文字列をマッチング。
///
/// # 利用例
///
/// ```
/// use thompson;
/// assert!(thompson::do_matching("a*b", "aaab", true).unwrap());
/// ```
///
/// # 引数
///
/// expr に正規表現、 word にマッチング対象の文字列を指定。
/// is_depth に true を指定すると ε 閉包を深さ優先探索、 false を指定すると幅優先探索で求める。
///
/// # 戻り値
///
/// エラーなく実行でき、かつ word 全体がマッチした場合は Ok(true) を返し、
/// エラーなく実行でき、かつマッチしなかった場合は Ok(false) を返す。
///
/// 入力された正規表現にエラーがある場合は Err を返す。
pub fn do_matching(expr: &str, word: &str, is_depth: bool) -> Result<bool, DynError> {
    let regex = Regex::new(expr)?;
    Ok(regex.is_match_with(word, is_depth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parser::{Malformed, Unbalanced};

    #[test]
    fn stages_are_kept() {
        let regex = Regex::new("ab").unwrap();
        assert_eq!(regex.raw(), "ab");
        assert_eq!(format_symbols(regex.escaped()), "ab");
        assert_eq!(format_symbols(regex.preprocessed()), "a.b");
        assert_eq!(format_symbols(regex.postfix()), "ab.");
    }

    #[test]
    fn errors_are_distinct() {
        assert_eq!(
            Regex::new("").unwrap_err(),
            Error::Parse(ParseError::EmptyRegex)
        );
        assert_eq!(
            Regex::new("(a").unwrap_err(),
            Error::Parse(ParseError::UnbalancedParentheses(Unbalanced::Unclosed(1)))
        );
        assert_eq!(
            Regex::new(r"a\").unwrap_err(),
            Error::Parse(ParseError::DanglingEscape(1))
        );
        assert!(matches!(
            Regex::new("a||b").unwrap_err(),
            Error::Parse(ParseError::MalformedExpression(Malformed::MissingOperand(_)))
        ));
    }

    #[test]
    fn error_source() {
        use std::error::Error as _;
        let e = Regex::new("").unwrap_err();
        assert!(e.source().is_some());
        assert_eq!(e.to_string(), "ParseError: empty regex");
    }

    #[test]
    fn matching() {
        assert!(do_matching("(a|b)*", "abba", true).unwrap());
        assert!(do_matching("(a|b)*", "abba", false).unwrap());
        assert!(!do_matching("(a|b)*", "abc", true).unwrap());
        assert!(do_matching(")", "", true).is_err());
    }

    #[test]
    fn bytes_matching() {
        let regex = Regex::new("a|b").unwrap();
        assert_eq!(regex.is_match_bytes(b"b", true), Ok(true));
        assert_eq!(
            regex.is_match_bytes(&[0xc3], true),
            Err(Error::Eval(EvalError::InvalidWordInput { valid_up_to: 0 }))
        );
        assert_eq!(
            regex.is_match_bytes(&[b'a', 0xff], false),
            Err(Error::Eval(EvalError::InvalidWordInput { valid_up_to: 1 }))
        );
    }

    #[test]
    fn long_concatenation() {
        let word = "a".repeat(100_000);
        let handle = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(move || {
                let regex = Regex::new(&word).unwrap();
                (regex.is_match(&word), regex.is_match(&word[1..]))
            })
            .unwrap();
        assert_eq!(handle.join().unwrap(), (true, false));
    }
}
