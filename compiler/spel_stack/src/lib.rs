//! Stack growth for the recursive phases of the expression engine.
//!
//! Parsing, interpretation and code generation all recurse once per AST
//! level. Expressions such as `((((((a))))))` or long property chains built
//! by tooling can nest far deeper than a hand-written expression would, so
//! every recursive entry point goes through [`ensure_sufficient_stack`].
//!
//! On native targets the `stacker` crate allocates a fresh stack segment when
//! the remaining space drops below [`RED_ZONE`]. On `wasm32` the closure runs
//! directly.

/// Remaining stack below which a new segment is allocated (64KB).
pub const RED_ZONE: usize = 64 * 1024;

/// Size of each newly allocated stack segment (1MB).
pub const SEGMENT_SIZE: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than [`RED_ZONE`] bytes remain.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// `wasm32` has no segmented stacks; run `f` directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nest(depth: u32) -> u32 {
        ensure_sufficient_stack(|| if depth == 0 { 0 } else { nest(depth - 1) + 1 })
    }

    #[test]
    fn passes_closure_result_through() {
        assert_eq!(ensure_sufficient_stack(|| "value"), "value");
    }

    #[test]
    fn survives_nesting_beyond_default_stack() {
        assert_eq!(nest(200_000), 200_000);
    }
}
