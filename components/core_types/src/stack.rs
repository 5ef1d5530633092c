//! Stack headroom for walks whose depth follows the data.
//!
//! Evaluation never recurses natively, but a sequence is a chain of cells
//! and its wire form nests one level per cell. Dropping a long chain,
//! encoding it, or cloning and serializing its snapshot walks that depth.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Stack reserved per level for walks that cannot check headroom as they go.
const STACK_PER_LEVEL: usize = 4 * 1024;

/// Depth a walk may reach on whatever stack is left above the red zone.
const SHALLOW_DEPTH: usize = 16;

/// Ensure sufficient stack space is available before executing `f`.
///
/// Recursive code calls this on every level; the stack grows by a fresh
/// segment whenever less than the red zone remains.
#[inline]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// Run `f`, a walk `depth` levels deep that does not check headroom itself,
/// on a stack large enough for it.
///
/// # Example
///
/// ```
/// use core_types::with_stack_for_depth;
///
/// fn nest(depth: usize) -> usize {
///     if depth == 0 { 0 } else { 1 + nest(depth - 1) }
/// }
/// assert_eq!(with_stack_for_depth(20_000, || nest(20_000)), 20_000);
/// ```
pub fn with_stack_for_depth<R>(depth: usize, f: impl FnOnce() -> R) -> R {
    if depth <= SHALLOW_DEPTH {
        return ensure_sufficient_stack(f);
    }
    let size = depth.saturating_mul(STACK_PER_LEVEL).saturating_add(RED_ZONE);
    stacker::grow(size, f)
}
