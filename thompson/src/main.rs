use clap::Parser;
use std::{ffi::OsString, process::ExitCode};
use thompson::{engine::parser::format_symbols, helper::DynError, Regex};

/// 正規表現を NFA に変換し、単語がマッチするかを調べる。
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// コンパイルする正規表現 (空文字列は不可)
    regex: String,

    /// NFA でマッチングする単語
    #[arg(short, long)]
    word: Option<OsString>,

    /// エスケープ済み、中置記法、後置記法の記号列も表示する
    #[arg(short, long)]
    verbose: bool,

    /// ε 閉包を深さ優先ではなく幅優先探索で求める
    #[arg(short, long)]
    breadth_first: bool,
}

fn main() -> Result<ExitCode, DynError> {
    env_logger::init();
    let args = Args::parse();

    let regex = Regex::new(&args.regex)?;

    println!();
    println!("regex:    {}", regex.raw());
    if args.verbose {
        let escaped = format_symbols(regex.escaped());
        let infix = format_symbols(regex.preprocessed());
        let postfix = format_symbols(regex.postfix());
        println!("escaped:  {escaped}");
        println!("infix:    {infix}");
        println!("postfix:  {postfix}");
    }

    println!();
    print!("{}", regex.ast());
    println!("{}", regex.nfa());
    println!();

    let Some(word) = args.word else {
        return Ok(ExitCode::SUCCESS);
    };

    // OS から受け取った単語は UTF-8 とは限らない
    let is_match = regex.is_match_bytes(word.as_encoded_bytes(), !args.breadth_first)?;
    let shown = word.to_string_lossy();
    if is_match {
        println!("match: {shown:?} is accepted by {}", regex.raw());
        Ok(ExitCode::SUCCESS)
    } else {
        println!("no match: {shown:?} is rejected by {}", regex.raw());
        Ok(ExitCode::FAILURE)
    }
}
