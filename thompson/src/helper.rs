pub trait SafeAdd: Sized {
    fn safe_add(&self, rhs: &Self) -> Option<Self>;
}

impl SafeAdd for usize {
    fn safe_add(&self, rhs: &Self) -> Option<Self> {
        self.checked_add(*rhs)
    }
}

/// `dst` に `src` を加算し、オーバーフローした場合は `f` が返すエラーを返す。
/// 失敗した場合 `dst` は変更されない。
pub fn safe_add<T, F, E>(dst: &mut T, src: &T, f: F) -> Result<(), E>
where
    T: SafeAdd,
    F: Fn() -> E,
{
    match dst.safe_add(src) {
        Some(n) => {
            *dst = n;
            Ok(())
        }
        None => Err(f()),
    }
}

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;
