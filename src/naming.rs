//! Natural ordering for directory and file names.
//!
//! Photo libraries are full of numbered names (`Episode 2`, `Episode 10`,
//! `IMG_9.jpg`, `IMG_10.jpg`) and a plain byte comparison puts `10` before
//! `2`. Everything the browser shows to a person is sorted with
//! [`compare_names`] instead:
//!
//! - runs of digits compare by numeric value (`img2` < `img10`)
//! - letters compare case-insensitively (`apple` < `Banana`)
//! - names equal under those rules fall back to a case-sensitive natural
//!   comparison, so the order is total and stable across runs

use std::cmp::Ordering;

/// Compare two display names in natural, case-insensitive order.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    natord::compare_ignore_case(a, b).then_with(|| natord::compare(a, b))
}
