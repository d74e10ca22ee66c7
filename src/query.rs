//! Typed query parameter values.

/// A value that can be written into a URL query string.
///
/// Query parameters on a [`RequestSpec`](crate::RequestSpec) are supplied as
/// typed values and rendered through this trait, so call sites never format
/// numbers or flags by hand.
///
/// # Examples
///
/// ```
/// use netspec::QueryValue;
///
/// assert_eq!(42.url_query_value(), "42");
/// assert_eq!("abc".url_query_value(), "abc");
/// assert_eq!(true.url_query_value(), "true");
/// ```
pub trait QueryValue {
    /// Returns the unencoded query string form of this value.
    fn url_query_value(&self) -> String;
}

impl QueryValue for str {
    fn url_query_value(&self) -> String {
        self.to_owned()
    }
}

impl QueryValue for String {
    fn url_query_value(&self) -> String {
        self.clone()
    }
}

impl<T: QueryValue + ?Sized> QueryValue for &T {
    fn url_query_value(&self) -> String {
        (**self).url_query_value()
    }
}

macro_rules! display_query_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl QueryValue for $ty {
                fn url_query_value(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

display_query_value!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, f32, f64
);
