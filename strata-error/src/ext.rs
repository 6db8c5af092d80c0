use crate::StrataResult;

/// Extension trait for StrataResult
pub trait ResultExt<T>: private::Sealed {
    /// Flatten a nested [`StrataResult`]. Helper function until <https://github.com/rust-lang/rust/issues/70142> is stabilized.
    fn flatten(self) -> StrataResult<T>;
}

mod private {
    use crate::StrataResult;

    pub trait Sealed {}

    impl<T> Sealed for StrataResult<StrataResult<T>> {}
}

impl<T> ResultExt<T> for StrataResult<StrataResult<T>> {
    fn flatten(self) -> StrataResult<T> {
        match self {
            Ok(Ok(v)) => Ok(v),
            Ok(Err(e)) | Err(e) => Err(e),
        }
    }
}
