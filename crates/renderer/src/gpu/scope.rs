/// Runs `build` inside validation and out-of-memory error scopes.
///
/// wgpu reports creation failures asynchronously through the device; popping
/// the scopes right after `build` turns them back into a value the caller can
/// map onto [`RenderError`](crate::RenderError).
pub(crate) fn capture<T>(device: &wgpu::Device, build: impl FnOnce() -> T) -> (T, Option<wgpu::Error>) {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    let value = build();
    let out_of_memory = pollster::block_on(device.pop_error_scope());
    let validation = pollster::block_on(device.pop_error_scope());
    (value, out_of_memory.or(validation))
}
