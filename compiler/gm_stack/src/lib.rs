//! Stack growth guard for recursive graph walks.
//!
//! Expression evaluation recurses over nested array literals and operator
//! chains, and the ancestral sampler recurses once per upstream node. A long
//! chain of declarations (`x1 = x0 + 1; x2 = x1 + 1; ...`) therefore turns
//! into a deep native call stack during a sampling pass.
//!
//! On native targets the `stacker` crate grows the stack on demand. On WASM
//! the guard is a passthrough.

/// Remaining stack below which a new segment is allocated (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (1MB).
const SEGMENT_SIZE: usize = 1024 * 1024;

/// Run `f`, growing the stack first if less than the red zone remains.
///
/// Wrap every self-recursive step of a graph walk:
///
/// ```text
/// fn resample(&mut self, value: ValueId) -> ModelResult<()> {
///     ensure_sufficient_stack(|| {
///         for input in self.inputs_of(value) {
///             self.resample(input)?;
///         }
///         self.redraw(value)
///     })
/// }
/// ```
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT_SIZE, f)
}

/// WASM version: call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Walks a parent chain the way the sampler walks a dependency chain.
    fn chain_depth(parents: &[Option<usize>], node: usize) -> usize {
        ensure_sufficient_stack(|| match parents[node] {
            Some(parent) => chain_depth(parents, parent) + 1,
            None => 0,
        })
    }

    #[test]
    fn test_short_chain() {
        let parents = vec![None, Some(0), Some(1), Some(2)];
        assert_eq!(chain_depth(&parents, 3), 3);
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let len = 150_000;
        let parents: Vec<Option<usize>> = (0..len)
            .map(|i| if i == 0 { None } else { Some(i - 1) })
            .collect();
        assert_eq!(chain_depth(&parents, len - 1), len - 1);
    }

    #[test]
    fn test_passes_result_through() {
        let result: Result<u8, &str> = ensure_sufficient_stack(|| Err("boom"));
        assert_eq!(result, Err("boom"));
    }
}
