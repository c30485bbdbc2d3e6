//! Heap accounting for the gauge's drawing resource.

/// Bytes currently free in the `esp-alloc` heap.
///
/// Passed to [`GaugeRenderer::new`](crate::GaugeRenderer::new) as the memory
/// probe checked before the gauge allocates its off-screen buffers.
pub fn free_bytes() -> usize {
    esp_alloc::HEAP.free()
}
