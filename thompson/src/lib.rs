//! # Thompson の構成法による正規表現エンジン用クレート
//!
//! 正規表現を後置記法と構文木を経て NFA にコンパイルし、
//! ε 閉包を使って文字列全体が受理されるかを判定する。
//!
//! 使える記法は連結、選択 `|`、クリーネ閉包 `*`、括弧、`\` によるエスケープのみ。
//! エスケープされていない `.` は明示的な連結演算子として扱う。
//!
//! ## 利用例
//!
//! ```
//! use thompson::Regex;
//! let regex = Regex::new(r"(a|b)*\*c").unwrap();
//! assert!(regex.is_match("abba*c"));
//! assert!(!regex.is_match("abbac"));
//! thompson::print("(a|b)*c").unwrap(); // 各段階の出力と NFA を表示
//! ```
pub mod engine;
pub mod helper;

pub use engine::{do_matching, print, Error, Regex};
