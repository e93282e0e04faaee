use thompson::{
    engine::{
        evaluator::epsilon_closure,
        parser::{format_symbols, Malformed, ParseError, Unbalanced},
    },
    Error, Regex,
};

fn accepts(expr: &str, word: &str) -> bool {
    Regex::new(expr).unwrap().is_match(word)
}

#[test]
fn canonical_conversion() {
    let regex = Regex::new("ab").unwrap();
    assert_eq!(format_symbols(regex.preprocessed()), "a.b");
    assert_eq!(format_symbols(regex.postfix()), "ab.");
}

#[test]
fn star_of_alternation() {
    for w in ["", "a", "b", "aabba"] {
        assert!(accepts("(a|b)*", w), "{w}");
    }
    for w in ["c", "ab1"] {
        assert!(!accepts("(a|b)*", w), "{w}");
    }
}

#[test]
fn star_then_literal() {
    for w in ["b", "ab", "aaab"] {
        assert!(accepts("a*b", w), "{w}");
    }
    for w in ["", "ba"] {
        assert!(!accepts("a*b", w), "{w}");
    }
}

#[test]
fn escaped_operators() {
    assert!(accepts(r"a\*b", "a*b"));
    assert!(!accepts(r"a\*b", "ab"));
    assert!(accepts(r"\(a\|b\)", "(a|b)"));
    assert!(!accepts(r"\(a\|b\)", "a"));
    assert!(accepts(r"a\.b", "a.b"));
    assert!(accepts(r"\\*", r"\\\"));
}

#[test]
fn explicit_and_group_concat() {
    assert!(accepts("a.b", "ab"));
    assert!(accepts("(a)(b)", "ab"));
    assert!(accepts("(ab|c)*(d)", "abcabd"));
    assert!(!accepts("(ab|c)*(d)", "abca"));
}

#[test]
fn parse_errors() {
    assert_eq!(Regex::new("").unwrap_err(), Error::Parse(ParseError::EmptyRegex));
    assert_eq!(
        Regex::new("(a").unwrap_err(),
        Error::Parse(ParseError::UnbalancedParentheses(Unbalanced::Unclosed(1)))
    );
    assert_eq!(
        Regex::new("a)(").unwrap_err(),
        Error::Parse(ParseError::UnbalancedParentheses(Unbalanced::UnmatchedRight))
    );
    assert_eq!(
        Regex::new("ab\\").unwrap_err(),
        Error::Parse(ParseError::DanglingEscape(2))
    );
    assert!(matches!(
        Regex::new("()").unwrap_err(),
        Error::Parse(ParseError::MalformedExpression(Malformed::MissingOperand(_)))
    ));
}

#[test]
fn alphabet_is_exact() {
    let regex = Regex::new("ab|cd").unwrap();
    let alphabet = regex.nfa().alphabet().iter().copied().collect::<String>();
    assert_eq!(alphabet, "abcd");
}

#[test]
fn empty_word_agrees_with_closure() {
    for expr in ["a", "a*", "ab*", "a*b*", "(a|b*)c", "(a|b*)(c*)", "((a*)*)*"] {
        let regex = Regex::new(expr).unwrap();
        let nfa = regex.nfa();
        let closure = epsilon_closure(nfa, [nfa.initial()], false);
        assert_eq!(regex.is_match(""), closure.contains(&nfa.final_state()), "{expr}");
    }
}

#[test]
fn fresh_sessions_accept_same_language() {
    let words = ["", "a", "b", "ab", "ba", "abab", "aab", "bbb", "c"];
    for expr in ["(a|b)*", "a*b", "(ab)*|b*"] {
        let first = Regex::new(expr).unwrap();
        let second = Regex::new(expr).unwrap();
        for w in words {
            assert_eq!(first.is_match(w), second.is_match(w), "{expr} {w}");
        }
    }
}

#[test]
fn unknown_symbols_reject_without_error() {
    let regex = Regex::new("a*").unwrap();
    assert!(!regex.is_match("日本"));
    assert_eq!(regex.is_match_bytes("aaa".as_bytes(), false), Ok(true));
}

#[test]
fn concurrent_compilation() {
    let handles = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let expr = if i % 2 == 0 { "(a|b)*c" } else { "x*y" };
                let regex = Regex::new(expr).unwrap();
                (regex.is_match("ababc"), regex.is_match("xxy"))
            })
        })
        .collect::<Vec<_>>();

    for (i, h) in handles.into_iter().enumerate() {
        let (abc, xy) = h.join().unwrap();
        assert_eq!(abc, i % 2 == 0);
        assert_eq!(xy, i % 2 == 1);
    }
}
