//! `const fn` helpers that aren't yet stable in `core`/`std`.

/// `const`-context unwrap of an `Option`, since `Option::unwrap` isn't usable
/// in `const` on our MSRV for all the types we need it for.
pub const fn const_option_unwrap<T: Copy>(opt: Option<T>) -> T {
    match opt {
        Some(x) => x,
        None => panic!("const_option_unwrap: called on a `None` value"),
    }
}

/// Compile-time assertion. `const ASSERT_MSG: () = const_assert!(a < b);`
#[macro_export]
macro_rules! const_assert {
    ($cond:expr) => {
        const _: () = assert!($cond);
    };
}
