// src/macros.rs

/// String shorthand.
///
/// `s!()` is an empty `String`; `s!(x)` is `String::from(x)`.
#[macro_export]
macro_rules! s {
    () => {
        ::std::string::String::new()
    };
    ($expr:expr) => {
        ::std::string::String::from($expr)
    };
}

/// Boolean to feature value: `1.0` when the condition holds, else `0.0`.
#[macro_export]
macro_rules! flag {
    ($cond:expr) => {
        if $cond { 1.0_f64 } else { 0.0_f64 }
    };
}
